//! Secrets-to-runtime configuration compiler
//!
//! Compilation has exactly one hard gate: every required secret must be
//! present and non-empty. Everything else (key formats, spreadsheet id,
//! service-account JSON) is checked softly and reported as diagnostics, so a
//! malformed-looking key still compiles and fails later against the provider.
//!
//! Rendering is pure substitution of the secrets into fixed defaults and is
//! deterministic for a given secret set and credentials path.

mod checks;
mod render;

pub use checks::*;
pub use render::render_yaml;

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{
    BrandRules, EnhancedBrandConfig, LlmProviderConfig, ProviderKind, RuntimeConfig,
    Stage2Config, StorageTarget, WorkflowTuning, DEFAULT_CREDENTIALS_FILE,
};
use crate::error::ConfigError;
use crate::secrets::{SecretKey, SecretSet};

/// Output of a successful compilation
#[derive(Debug, Clone)]
pub struct Compilation {
    pub config: RuntimeConfig,
    pub diagnostics: Vec<Diagnostic>,
}

impl Compilation {
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }

    /// Render the compiled configuration as YAML
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        render_yaml(&self.config)
    }
}

/// Compiles a [`SecretSet`] into a [`RuntimeConfig`]
#[derive(Debug, Clone)]
pub struct ConfigCompiler {
    credentials_path: PathBuf,
}

impl Default for ConfigCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigCompiler {
    /// Compiler that points storage at `credentials.json`
    pub fn new() -> Self {
        Self {
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
        }
    }

    /// Point the storage target at a materialized credentials file
    pub fn with_credentials_path(mut self, path: impl AsRef<Path>) -> Self {
        self.credentials_path = path.as_ref().to_path_buf();
        self
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    /// Validate the secrets and render the runtime configuration
    pub fn compile(&self, secrets: &SecretSet) -> Result<Compilation, ConfigError> {
        let status = secrets.status();
        if !status.all_configured {
            warn!(
                missing = ?status.missing_secrets,
                "Refusing to compile configuration with missing secrets"
            );
            return Err(ConfigError::MissingSecrets(status.missing_secrets));
        }

        let diagnostics = check_all(secrets);
        for d in diagnostics.iter().filter(|d| d.is_warning()) {
            warn!(code = %d.code, key = %d.key, "{}", d.message);
        }

        let config = RuntimeConfig {
            llm_providers: ProviderKind::ALL
                .into_iter()
                .map(|kind| LlmProviderConfig::for_kind(kind, secrets.value(kind.secret_key())))
                .collect(),
            storage: StorageTarget::new(
                secrets.value(SecretKey::SpreadsheetId),
                self.credentials_path.clone(),
            ),
            brand: BrandRules::default(),
            workflow: WorkflowTuning::default(),
            stage2: Stage2Config::default(),
            enhanced_brand: EnhancedBrandConfig::default(),
        };

        info!(
            providers = config.llm_providers.len(),
            warnings = diagnostics.iter().filter(|d| d.is_warning()).count(),
            "Compiled runtime configuration"
        );

        Ok(Compilation {
            config,
            diagnostics,
        })
    }
}
