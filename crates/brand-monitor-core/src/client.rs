//! HTTP implementation of the external monitoring API
//!
//! Talks JSON to a monitoring service. The rendered config document and the
//! service-account file are read into memory at construction, so both files
//! can be removed as soon as initialization has run.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info};

use crate::api::{ApiFactory, BrandMonitoringApi, MonitoringRequest, WorkflowView};
use crate::config::{RuntimeConfig, SettingsView};
use crate::error::{ApiError, InitError};
use crate::health::ProviderStatusPayload;
use crate::result::MonitoringResult;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Environment variables consulted by the storage reload, in order
pub const SPREADSHEET_ENV_VARS: [&str; 2] =
    ["GOOGLE_SHEETS_SPREADSHEET_ID", "GOOGLE_SPREADSHEET_ID"];

/// Monitoring API reached over HTTP
pub struct RemoteMonitoringApi {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    config: RwLock<RuntimeConfig>,
    service_account: serde_json::Value,
    workflow: RwLock<Option<WorkflowView>>,
}

impl std::fmt::Debug for RemoteMonitoringApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteMonitoringApi")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RemoteMonitoringApi {
    /// Load the rendered config (and the credentials it points at)
    pub fn from_config_path(
        base_url: impl Into<String>,
        config_path: impl AsRef<Path>,
    ) -> Result<Self, InitError> {
        let config_path = config_path.as_ref();
        let document = std::fs::read_to_string(config_path).map_err(|e| {
            InitError::ExternalApiConstructionFailed(format!(
                "Cannot read config {}: {}",
                config_path.display(),
                e
            ))
        })?;
        let config = RuntimeConfig::from_yaml(&document)
            .map_err(|e| InitError::ExternalApiConstructionFailed(e.to_string()))?;

        let service_account = read_service_account(&config.storage.credentials_path)?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
            config: RwLock::new(config),
            service_account,
            workflow: RwLock::new(None),
        })
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn config_snapshot(&self) -> Result<RuntimeConfig, ApiError> {
        self.config
            .read()
            .map(|c| c.clone())
            .map_err(|_| ApiError::Parse("config lock poisoned".to_string()))
    }

    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| ApiError::Parse(e.to_string()))
        } else {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            Err(ApiError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// A missing credentials file is sent as null and surfaces as a storage
/// failure in the connection test.
fn read_service_account(path: &Path) -> Result<serde_json::Value, InitError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No credentials file found");
            Ok(serde_json::Value::Null)
        }
        Err(e) => Err(InitError::ExternalApiConstructionFailed(format!(
            "Cannot read credentials {}: {}",
            path.display(),
            e
        ))),
    }
}

#[derive(Debug, Serialize)]
struct InitializeRequest<'a> {
    config: &'a RuntimeConfig,
    service_account: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct InitializeResponse {
    success: bool,
    #[serde(default)]
    workflow: Option<WorkflowView>,
}

#[async_trait]
impl BrandMonitoringApi for RemoteMonitoringApi {
    async fn initialize(&self) -> Result<bool, ApiError> {
        let config = self.config_snapshot()?;
        let request = InitializeRequest {
            config: &config,
            service_account: &self.service_account,
        };

        let response = self
            .client
            .post(self.url("/api/v1/initialize"))
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let body: InitializeResponse = Self::read_json(response).await?;
        if let Some(workflow) = body.workflow {
            info!(agents = ?workflow.agents, "Monitoring workflow initialized");
            if let Ok(mut slot) = self.workflow.write() {
                *slot = Some(workflow);
            }
        }
        Ok(body.success)
    }

    async fn test_connections(&self) -> Result<ProviderStatusPayload, ApiError> {
        let response = self
            .client
            .get(self.url("/api/v1/connections"))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::read_json(response).await
    }

    async fn monitor_queries(
        &self,
        request: &MonitoringRequest,
    ) -> Result<MonitoringResult, ApiError> {
        let response = self
            .client
            .post(self.url("/api/v1/monitor"))
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::read_json(response).await
    }

    fn settings(&self) -> Option<SettingsView> {
        self.config.read().ok().map(|c| SettingsView::from(&*c))
    }

    fn workflow(&self) -> Option<WorkflowView> {
        self.workflow.read().ok().and_then(|w| w.clone())
    }

    fn reload_storage_from_env(&self) {
        let Some(id) = SPREADSHEET_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|v| !v.is_empty())
        else {
            return;
        };

        if let Ok(mut config) = self.config.write() {
            if config.storage.spreadsheet_id != id {
                info!("Spreadsheet ID overridden from environment");
                config.storage.spreadsheet_id = id;
            }
        }
    }
}

/// Constructs [`RemoteMonitoringApi`]s against one service
#[derive(Debug, Clone)]
pub struct RemoteApiFactory {
    base_url: String,
    timeout: Duration,
}

impl RemoteApiFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ApiFactory for RemoteApiFactory {
    fn construct(&self, config_path: &Path) -> Result<Arc<dyn BrandMonitoringApi>, InitError> {
        let api = RemoteMonitoringApi::from_config_path(&self.base_url, config_path)?
            .with_timeout(self.timeout);
        Ok(Arc::new(api))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ConfigCompiler;
    use crate::secrets::{SecretKey, SecretSet};
    use serde_json::json;
    use std::path::PathBuf;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Fixture {
        _dir: tempfile::TempDir,
        config_path: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let creds_path = dir.path().join("credentials.json");
        std::fs::write(&creds_path, r#"{"client_email":"bot@x.iam"}"#).unwrap();

        let secrets = SecretSet::new()
            .with(SecretKey::OpenAiApiKey, "sk-test")
            .with(SecretKey::PerplexityApiKey, "pplx-0123456789abcdefghij")
            .with(SecretKey::GeminiApiKey, "gemini")
            .with(SecretKey::SpreadsheetId, "sheet-from-secrets")
            .with(SecretKey::ServiceAccountCredentials, "{}");
        let yaml = ConfigCompiler::new()
            .with_credentials_path(&creds_path)
            .compile(&secrets)
            .unwrap()
            .to_yaml()
            .unwrap();

        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, yaml).unwrap();
        Fixture {
            _dir: dir,
            config_path,
        }
    }

    #[test]
    fn test_construction_reads_settings() {
        let fx = fixture();
        let api = RemoteMonitoringApi::from_config_path("http://localhost:1", &fx.config_path)
            .unwrap();

        let settings = api.settings().unwrap();
        assert_eq!(settings.target_brand, "DataTobiz");
        assert_eq!(settings.google_sheets.spreadsheet_id, "sheet-from-secrets");
        assert_eq!(api.service_account["client_email"], "bot@x.iam");
        assert!(api.workflow().is_none());
    }

    #[test]
    fn test_reload_storage_from_env_precedence() {
        let [primary, fallback] = SPREADSHEET_ENV_VARS;
        let fx = fixture();
        let api = RemoteMonitoringApi::from_config_path("http://localhost:1", &fx.config_path)
            .unwrap();
        let spreadsheet_id = || api.settings().unwrap().google_sheets.spreadsheet_id;

        std::env::set_var(primary, "");
        std::env::set_var(fallback, "");
        api.reload_storage_from_env();
        assert_eq!(spreadsheet_id(), "sheet-from-secrets");

        std::env::set_var(fallback, "sheet-from-fallback");
        api.reload_storage_from_env();
        assert_eq!(spreadsheet_id(), "sheet-from-fallback");

        std::env::set_var(primary, "sheet-from-primary");
        api.reload_storage_from_env();
        assert_eq!(spreadsheet_id(), "sheet-from-primary");

        std::env::remove_var(primary);
        std::env::remove_var(fallback);
        api.reload_storage_from_env();
        assert_eq!(spreadsheet_id(), "sheet-from-primary");
    }

    #[test]
    fn test_construction_fails_for_missing_config() {
        let err = RemoteMonitoringApi::from_config_path("http://localhost:1", "/nonexistent.yaml")
            .unwrap_err();
        assert!(matches!(err, InitError::ExternalApiConstructionFailed(_)));
    }

    #[tokio::test]
    async fn test_initialize_records_workflow() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/initialize"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "workflow": {
                    "agents": ["openai", "perplexity", "gemini"],
                    "storage_manager": true,
                    "analytics_engine": true
                }
            })))
            .mount(&server)
            .await;

        let fx = fixture();
        let api = RemoteMonitoringApi::from_config_path(server.uri(), &fx.config_path).unwrap();

        assert!(api.initialize().await.unwrap());
        let workflow = api.workflow().unwrap();
        assert_eq!(workflow.agents, vec!["openai", "perplexity", "gemini"]);
        assert!(workflow.storage_manager);
    }

    #[tokio::test]
    async fn test_test_connections_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/connections"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "error": "timeout"
            })))
            .mount(&server)
            .await;

        let fx = fixture();
        let api = RemoteMonitoringApi::from_config_path(server.uri(), &fx.config_path).unwrap();

        let payload = api.test_connections().await.unwrap();
        assert!(!payload.success);
        assert_eq!(payload.error.as_deref(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_server_error_surfaces_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/monitor"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let fx = fixture();
        let api = RemoteMonitoringApi::from_config_path(server.uri(), &fx.config_path).unwrap();
        let request = MonitoringRequest::single("data consultancies").unwrap();

        match api.monitor_queries(&request).await {
            Err(ApiError::Server { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
