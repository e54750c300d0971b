//! Brand monitoring dashboard server
//!
//! Exposes the dashboard's operations (secret status, system bootstrap and
//! initialization, connection tests, monitoring runs and result downloads) as
//! JSON endpoints over the core crate. The CLI subcommands that do not serve
//! HTTP are implemented here as plain functions.

pub mod handler;

use anyhow::Context;
use brand_monitor_core::{ConfigCompiler, ConfigError, SecretSet};
use std::path::Path;

/// Secrets from `path` when given, the process environment otherwise
pub fn load_secrets(path: Option<&Path>) -> Result<SecretSet, ConfigError> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading secrets file");
            SecretSet::from_toml_file(path)
        }
        None => Ok(SecretSet::from_env()),
    }
}

/// Result of `check-secrets`
#[derive(Debug, Clone)]
pub struct SecretsCheck {
    /// Pretty JSON: the debug report when requested, then the status
    pub report: String,
    pub all_configured: bool,
}

/// Render the secret status report
pub fn check_secrets(secrets: &SecretSet, debug: bool) -> anyhow::Result<SecretsCheck> {
    let status = secrets.status();
    let mut report = String::new();

    if debug {
        report.push_str(&serde_json::to_string_pretty(&secrets.debug_info())?);
        report.push('\n');
    }
    report.push_str(&serde_json::to_string_pretty(&status)?);
    report.push('\n');

    Ok(SecretsCheck {
        report,
        all_configured: status.all_configured,
    })
}

/// Result of `render-config`
#[derive(Debug, Clone)]
pub struct RenderedConfig {
    pub document: String,
    /// One `[level] KEY: message` line per compiler diagnostic
    pub diagnostics: Vec<String>,
}

/// Compile the secrets into a config document, writing it to `output` if given
pub fn render_config(
    secrets: &SecretSet,
    credentials_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<RenderedConfig> {
    let compilation = ConfigCompiler::new()
        .with_credentials_path(credentials_path)
        .compile(secrets)?;

    let diagnostics = compilation
        .diagnostics
        .iter()
        .map(|d| format!("[{}] {}: {}", d.level, d.key, d.message))
        .collect();
    let document = compilation.to_yaml()?;

    if let Some(path) = output {
        std::fs::write(path, &document)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Config document written");
    }

    Ok(RenderedConfig {
        document,
        diagnostics,
    })
}
