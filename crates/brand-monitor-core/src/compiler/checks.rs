//! Soft validation of secret values
//!
//! None of these checks reject a secret. Each one yields diagnostics that are
//! reported to the operator while compilation carries on.

use serde::{Deserialize, Serialize};

use crate::secrets::{SecretKey, SecretSet};

pub const OPENAI_KEY_PREFIX: &str = "sk-";
pub const PERPLEXITY_KEY_PREFIX: &str = "pplx-";
pub const PERPLEXITY_KEY_MIN_LEN: usize = 20;

/// Diagnostic levels, none of which block compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Warning,
    Info,
    Success,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticLevel::Warning => write!(f, "warning"),
            DiagnosticLevel::Info => write!(f, "info"),
            DiagnosticLevel::Success => write!(f, "success"),
        }
    }
}

/// One advisory finding about a secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub code: String,
    pub key: SecretKey,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(code: &str, key: SecretKey, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warning, code, key, message)
    }

    pub fn info(code: &str, key: SecretKey, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Info, code, key, message)
    }

    pub fn success(code: &str, key: SecretKey, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Success, code, key, message)
    }

    fn new(level: DiagnosticLevel, code: &str, key: SecretKey, message: impl Into<String>) -> Self {
        Self {
            level,
            code: code.to_string(),
            key,
            message: message.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.level == DiagnosticLevel::Warning
    }
}

/// Run every soft check in a fixed order
pub fn check_all(secrets: &SecretSet) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    out.extend(check_openai_key(secrets.value(SecretKey::OpenAiApiKey)));
    out.extend(check_perplexity_key(secrets.value(SecretKey::PerplexityApiKey)));
    out.extend(check_spreadsheet_id(secrets.value(SecretKey::SpreadsheetId)));
    out.extend(check_service_account(
        secrets.value(SecretKey::ServiceAccountCredentials),
    ));
    out
}

pub fn check_openai_key(key: &str) -> Vec<Diagnostic> {
    if key.starts_with(OPENAI_KEY_PREFIX) {
        return Vec::new();
    }
    vec![Diagnostic::warning(
        "OPENAI_KEY_FORMAT",
        SecretKey::OpenAiApiKey,
        format!(
            "OpenAI API key format may be incorrect (should start with '{}')",
            OPENAI_KEY_PREFIX
        ),
    )]
}

pub fn check_perplexity_key(key: &str) -> Vec<Diagnostic> {
    let mut out = Vec::new();

    if !key.starts_with(PERPLEXITY_KEY_PREFIX) {
        out.push(Diagnostic::warning(
            "PERPLEXITY_KEY_FORMAT",
            SecretKey::PerplexityApiKey,
            format!(
                "Perplexity API key format may be incorrect (should start with '{}')",
                PERPLEXITY_KEY_PREFIX
            ),
        ));
    }

    // Empty keys are already covered by the prefix warning.
    if !key.is_empty() && key.len() < PERPLEXITY_KEY_MIN_LEN {
        out.push(Diagnostic::warning(
            "PERPLEXITY_KEY_LENGTH",
            SecretKey::PerplexityApiKey,
            "Perplexity API key appears to be too short",
        ));
    }

    out
}

pub fn check_spreadsheet_id(id: &str) -> Vec<Diagnostic> {
    if id.is_empty() {
        return vec![
            Diagnostic::warning(
                "SPREADSHEET_ID_MISSING",
                SecretKey::SpreadsheetId,
                "Google Sheets Spreadsheet ID is missing",
            ),
            Diagnostic::info(
                "SPREADSHEET_ID_HINT",
                SecretKey::SpreadsheetId,
                "The spreadsheet ID is the long string in your Google Sheets URL \
                 (e.g., 1u6xIltHLEO-cfrFwCNVFL2726nRwaAMD90aqAbZKjgQ)",
            ),
        ];
    }

    vec![Diagnostic::success(
        "SPREADSHEET_ID_OK",
        SecretKey::SpreadsheetId,
        format!("Google Sheets Spreadsheet ID: {}", id),
    )]
}

pub fn check_service_account(credentials: &str) -> Vec<Diagnostic> {
    let key = SecretKey::ServiceAccountCredentials;

    if credentials.is_empty() {
        return vec![Diagnostic::warning(
            "SERVICE_ACCOUNT_MISSING",
            key,
            "Google Service Account credentials are missing",
        )];
    }

    let parsed: serde_json::Value = match serde_json::from_str(credentials) {
        Ok(v) => v,
        Err(_) => {
            return vec![Diagnostic::warning(
                "SERVICE_ACCOUNT_NOT_JSON",
                key,
                "Google Service Account credentials are not valid JSON",
            )]
        }
    };

    match parsed.get("client_email") {
        Some(email) => {
            let email = email
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| email.to_string());
            vec![Diagnostic::success(
                "SERVICE_ACCOUNT_OK",
                key,
                format!("Google Service Account configured for: {}", email),
            )]
        }
        None => vec![Diagnostic::warning(
            "SERVICE_ACCOUNT_NO_EMAIL",
            key,
            "Google Service Account credentials appear to be invalid (missing client_email)",
        )],
    }
}
