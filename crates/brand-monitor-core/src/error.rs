//! Error types for the brand monitoring core
//!
//! Every failure here is recoverable at the dashboard boundary: callers turn
//! it into a user-visible message and keep the previous state.

use thiserror::Error;

use crate::secrets::SecretKey;

/// Errors raised while turning secrets into a runtime configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// One or more required secrets are absent or empty
    #[error("Missing required secrets: {}", format_keys(.0))]
    MissingSecrets(Vec<SecretKey>),

    /// The service-account credentials could not be written out
    #[error("Failed to write credentials file: {0}")]
    CredentialsWriteFailed(String),

    /// The rendered configuration document could not be written out
    #[error("Failed to write config file: {0}")]
    ConfigWriteFailed(String),

    /// The configuration document could not be rendered or parsed
    #[error("Config render error: {0}")]
    Render(String),

    /// The secret store could not be read
    #[error("Secrets source error: {0}")]
    SecretsSource(String),
}

impl ConfigError {
    /// Keys reported missing, empty for every other variant
    pub fn missing_keys(&self) -> &[SecretKey] {
        match self {
            ConfigError::MissingSecrets(keys) => keys,
            _ => &[],
        }
    }
}

fn format_keys(keys: &[SecretKey]) -> String {
    keys.iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Render(format!("YAML error: {}", err))
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::SecretsSource(format!("TOML error: {}", err))
    }
}

/// Errors raised while bringing the external monitoring API up
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Failed to create API instance: {0}")]
    ExternalApiConstructionFailed(String),

    #[error("Failed to initialize API: {0}")]
    InitializeFailed(String),

    #[error("System is not initialized")]
    NotInitialized,
}

/// Connection test failure, reported as a single aggregate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HealthCheckError {
    #[error("Connection test failed: {0}")]
    AggregateFailure(String),
}

/// Errors raised by a monitoring run
#[derive(Error, Debug)]
pub enum MonitoringError {
    #[error("Please enter a search query")]
    EmptyQuery,

    #[error("Monitoring failed: {0}")]
    QueryFailed(String),
}

/// Transport errors from the external monitoring API
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Init(#[from] InitError),

    #[error(transparent)]
    Monitoring(#[from] MonitoringError),

    #[error("Export error: {0}")]
    Export(String),
}

impl Error {
    /// Whether the operator can fix this by changing input or secrets
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::Config(ConfigError::MissingSecrets(_))
                | Error::Monitoring(MonitoringError::EmptyQuery)
                | Error::Init(InitError::NotInitialized)
        )
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Export(format!("CSV error: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Export(format!("JSON error: {}", err))
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
