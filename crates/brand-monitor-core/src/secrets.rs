//! Deployment secrets
//!
//! A [`SecretSet`] is the string-valued view of the hosting platform's secret
//! store. It can be loaded from a Streamlit-style `secrets.toml` file or from
//! the process environment.
//!
//! A secret counts as configured only when its key is present and its value
//! is non-empty.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::ConfigError;

/// The five secrets the dashboard cannot run without
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SecretKey {
    #[serde(rename = "OPENAI_API_KEY")]
    OpenAiApiKey,
    #[serde(rename = "PERPLEXITY_API_KEY")]
    PerplexityApiKey,
    #[serde(rename = "GEMINI_API_KEY")]
    GeminiApiKey,
    #[serde(rename = "GOOGLE_SHEETS_SPREADSHEET_ID")]
    SpreadsheetId,
    #[serde(rename = "GOOGLE_SERVICE_ACCOUNT_CREDENTIALS")]
    ServiceAccountCredentials,
}

impl SecretKey {
    /// Required keys in reporting order
    pub const REQUIRED: [SecretKey; 5] = [
        SecretKey::OpenAiApiKey,
        SecretKey::PerplexityApiKey,
        SecretKey::GeminiApiKey,
        SecretKey::SpreadsheetId,
        SecretKey::ServiceAccountCredentials,
    ];

    /// Name of the secret in the store
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretKey::OpenAiApiKey => "OPENAI_API_KEY",
            SecretKey::PerplexityApiKey => "PERPLEXITY_API_KEY",
            SecretKey::GeminiApiKey => "GEMINI_API_KEY",
            SecretKey::SpreadsheetId => "GOOGLE_SHEETS_SPREADSHEET_ID",
            SecretKey::ServiceAccountCredentials => "GOOGLE_SERVICE_ACCOUNT_CREDENTIALS",
        }
    }

    /// Short description shown next to a missing secret
    pub fn description(&self) -> &'static str {
        match self {
            SecretKey::OpenAiApiKey => "Your OpenAI API key",
            SecretKey::PerplexityApiKey => "Your Perplexity API key",
            SecretKey::GeminiApiKey => "Your Google Gemini API key",
            SecretKey::SpreadsheetId => "Your Google Sheets spreadsheet ID",
            SecretKey::ServiceAccountCredentials => {
                "Your Google service account JSON credentials"
            }
        }
    }

    /// Look a key up by its store name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::REQUIRED.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type a secret had in its source before it was stored as text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretKind {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
    Datetime,
    Array,
    Table,
}

impl SecretKind {
    fn of(value: &toml::Value) -> Self {
        match value {
            toml::Value::String(_) => SecretKind::String,
            toml::Value::Integer(_) => SecretKind::Integer,
            toml::Value::Float(_) => SecretKind::Float,
            toml::Value::Boolean(_) => SecretKind::Boolean,
            toml::Value::Datetime(_) => SecretKind::Datetime,
            toml::Value::Array(_) => SecretKind::Array,
            toml::Value::Table(_) => SecretKind::Table,
        }
    }
}

/// String-valued secrets keyed by store name
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretSet {
    values: BTreeMap<String, String>,
    kinds: BTreeMap<String, SecretKind>,
}

impl fmt::Debug for SecretSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretSet")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SecretSet {
    /// Create an empty secret set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a required secret
    pub fn with(mut self, key: SecretKey, value: impl Into<String>) -> Self {
        self.insert(key.as_str(), value);
        self
    }

    /// Insert any secret by name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.insert_with_kind(name, value, SecretKind::String);
    }

    fn insert_with_kind(&mut self, name: impl Into<String>, value: impl Into<String>, kind: SecretKind) {
        let name = name.into();
        self.kinds.insert(name.clone(), kind);
        self.values.insert(name, value.into());
    }

    /// Remove a secret by name
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.kinds.remove(name);
        self.values.remove(name)
    }

    /// Source type of a secret, `None` when absent
    pub fn kind(&self, key: SecretKey) -> Option<SecretKind> {
        self.kinds.get(key.as_str()).copied()
    }

    /// Raw lookup, present even when empty
    pub fn get(&self, key: SecretKey) -> Option<&str> {
        self.values.get(key.as_str()).map(String::as_str)
    }

    /// Value of a secret, or the empty string when absent
    pub fn value(&self, key: SecretKey) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Whether the key is present with a non-empty value
    pub fn is_configured(&self, key: SecretKey) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    /// Every secret name in the store, required or not
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Read the required secrets from the process environment
    pub fn from_env() -> Self {
        let mut set = Self::new();
        for key in SecretKey::REQUIRED {
            if let Ok(value) = std::env::var(key.as_str()) {
                set.insert(key.as_str(), value);
            }
        }
        set
    }

    /// Parse a Streamlit-style `secrets.toml` document
    ///
    /// Top-level strings are taken as-is, other scalars are stringified and
    /// tables or arrays are re-encoded as JSON text so an inline service
    /// account table still yields a JSON credentials blob.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content)?;
        let mut set = Self::new();

        for (name, value) in table {
            let kind = SecretKind::of(&value);
            let text = match value {
                toml::Value::String(s) => s,
                toml::Value::Table(_) | toml::Value::Array(_) => serde_json::to_string(&value)
                    .map_err(|e| {
                        ConfigError::SecretsSource(format!("Cannot encode {}: {}", name, e))
                    })?,
                other => other.to_string(),
            };
            set.insert_with_kind(name, text, kind);
        }

        Ok(set)
    }

    /// Load a `secrets.toml` file from disk
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::SecretsSource(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Partition the required keys into configured and missing
    pub fn status(&self) -> SecretStatus {
        let (configured, missing): (Vec<_>, Vec<_>) = SecretKey::REQUIRED
            .into_iter()
            .partition(|k| self.is_configured(*k));

        SecretStatus {
            all_configured: missing.is_empty(),
            configured_secrets: configured,
            missing_secrets: missing,
        }
    }

    /// Key names, value lengths and source types, never values
    ///
    /// For a table or array the length is that of its JSON encoding.
    pub fn debug_info(&self) -> SecretsDebugInfo {
        SecretsDebugInfo {
            available_secrets: self.values.keys().cloned().collect(),
            secret_lengths: SecretKey::REQUIRED
                .into_iter()
                .map(|key| SecretLength {
                    key,
                    length: self.get(key).map(str::len),
                    value_type: self.kind(key),
                })
                .collect(),
        }
    }
}

/// Configured/missing partition of the required secrets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretStatus {
    pub all_configured: bool,
    pub configured_secrets: Vec<SecretKey>,
    pub missing_secrets: Vec<SecretKey>,
}

/// Redacted view of the secret store for troubleshooting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsDebugInfo {
    pub available_secrets: Vec<String>,
    pub secret_lengths: Vec<SecretLength>,
}

/// Length of one required secret, `None` when not found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretLength {
    pub key: SecretKey,
    pub length: Option<usize>,
    pub value_type: Option<SecretKind>,
}
