//! Transient files handed to the external monitoring API
//!
//! The service-account credentials and the rendered configuration document
//! both have to exist on disk for the external API to load them. Each is
//! written once, read once, and removed when its [`TransientFile`] is dropped
//! or closed, on every exit path.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempPath};
use tracing::debug;

use crate::error::ConfigError;
use crate::secrets::{SecretKey, SecretSet};

/// What a transient file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Credentials,
    ConfigDocument,
}

impl ArtifactKind {
    fn prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Credentials => "brand-monitor-credentials-",
            ArtifactKind::ConfigDocument => "brand-monitor-config-",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            ArtifactKind::Credentials => ".json",
            ArtifactKind::ConfigDocument => ".yaml",
        }
    }

    fn write_error(&self, msg: String) -> ConfigError {
        match self {
            ArtifactKind::Credentials => ConfigError::CredentialsWriteFailed(msg),
            ArtifactKind::ConfigDocument => ConfigError::ConfigWriteFailed(msg),
        }
    }
}

/// A file deleted when this handle goes away
#[derive(Debug)]
pub struct TransientFile {
    kind: ArtifactKind,
    path: TempPath,
}

impl TransientFile {
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.path.to_path_buf()
    }

    /// Remove the file now and report failure instead of ignoring it
    pub fn close(self) -> Result<(), ConfigError> {
        let kind = self.kind;
        let location = self.path.display().to_string();
        self.path
            .close()
            .map_err(|e| kind.write_error(format!("Cannot remove {}: {}", location, e)))?;
        debug!(path = %location, "Removed transient file");
        Ok(())
    }
}

fn write_transient(
    kind: ArtifactKind,
    dir: Option<&Path>,
    content: &str,
) -> Result<TransientFile, ConfigError> {
    let mut builder = Builder::new();
    builder.prefix(kind.prefix()).suffix(kind.suffix());

    let file = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| kind.write_error(e.to_string()))?;

    let mut file = file;
    file.write_all(content.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| kind.write_error(e.to_string()))?;

    let path = file.into_temp_path();
    debug!(path = %path.display(), kind = ?kind, "Wrote transient file");
    Ok(TransientFile { kind, path })
}

/// Write the service-account JSON where the external API can load it
///
/// The content is written verbatim. Whether it is valid JSON is a soft
/// compile-time diagnostic, not a reason to refuse.
pub fn materialize_credentials(secrets: &SecretSet) -> Result<TransientFile, ConfigError> {
    materialize_credentials_in(None, secrets)
}

/// Same as [`materialize_credentials`] with an explicit target directory
pub fn materialize_credentials_in(
    dir: Option<&Path>,
    secrets: &SecretSet,
) -> Result<TransientFile, ConfigError> {
    let credentials = secrets.value(SecretKey::ServiceAccountCredentials);
    if credentials.is_empty() {
        return Err(ConfigError::CredentialsWriteFailed(
            "Google service account credentials are empty".to_string(),
        ));
    }
    write_transient(ArtifactKind::Credentials, dir, credentials)
}

/// Write a rendered configuration document
pub fn write_config_document(document: &str) -> Result<TransientFile, ConfigError> {
    write_config_document_in(None, document)
}

pub fn write_config_document_in(
    dir: Option<&Path>,
    document: &str,
) -> Result<TransientFile, ConfigError> {
    write_transient(ArtifactKind::ConfigDocument, dir, document)
}
