//! Process-wide monitoring system and per-operator session state
//!
//! [`MonitoringSystem`] is built once per process from the secret store and
//! then shared immutably. The transient credentials and config files it
//! stages for the external API are released right after the first
//! `initialize` call, whatever its outcome.
//!
//! [`Session`] holds what the dashboard remembers between interactions and is
//! passed explicitly into every operation.

use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

use crate::api::{ApiFactory, BrandMonitoringApi, MonitoringRequest};
use crate::artifacts::{materialize_credentials_in, write_config_document_in, TransientFile};
use crate::compiler::{ConfigCompiler, Diagnostic};
use crate::config::SettingsView;
use crate::error::{ConfigError, Error, InitError, MonitoringError, Result};
use crate::health::{HealthAggregator, HealthReport};
use crate::result::MonitoringResult;
use crate::secrets::SecretSet;

/// Dashboard state carried between interactions
#[derive(Debug, Clone, Default)]
pub struct Session {
    initialized: bool,
    last_results: Option<MonitoringResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn last_results(&self) -> Option<&MonitoringResult> {
        self.last_results.as_ref()
    }

    fn require_initialized(&self) -> std::result::Result<(), InitError> {
        if self.initialized {
            Ok(())
        } else {
            Err(InitError::NotInitialized)
        }
    }
}

/// Files staged for the external API until it has consumed them
#[derive(Debug)]
struct StagedArtifacts {
    credentials: TransientFile,
    config: TransientFile,
}

impl StagedArtifacts {
    fn release(self) {
        for file in [self.config, self.credentials] {
            let location = file.path().display().to_string();
            if let Err(e) = file.close() {
                warn!(path = %location, error = %e, "Failed to remove transient file");
            }
        }
    }
}

/// Status snapshot for the system health view
#[derive(Debug, Clone, Serialize)]
pub struct SystemOverview {
    pub initialized: bool,
    pub agents: Vec<String>,
    pub storage_configured: bool,
    pub analytics_ready: bool,
    pub settings: Option<SettingsView>,
    pub diagnostics: Vec<Diagnostic>,
}

/// The monitoring system, constructed once per process
pub struct MonitoringSystem {
    api: Arc<dyn BrandMonitoringApi>,
    diagnostics: Vec<Diagnostic>,
    staged: Mutex<Option<StagedArtifacts>>,
    aggregator: HealthAggregator,
}

impl std::fmt::Debug for MonitoringSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitoringSystem")
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

impl MonitoringSystem {
    /// Compile the secrets, stage the files and construct the external API
    pub fn bootstrap(secrets: &SecretSet, factory: &dyn ApiFactory) -> Result<Self> {
        Self::bootstrap_in(None, secrets, factory)
    }

    /// [`MonitoringSystem::bootstrap`] staging files in `dir`
    pub fn bootstrap_in(
        dir: Option<&Path>,
        secrets: &SecretSet,
        factory: &dyn ApiFactory,
    ) -> Result<Self> {
        let status = secrets.status();
        if !status.all_configured {
            error!(missing = ?status.missing_secrets, "Missing required secrets");
            return Err(ConfigError::MissingSecrets(status.missing_secrets).into());
        }

        let credentials = materialize_credentials_in(dir, secrets)?;
        let compilation = ConfigCompiler::new()
            .with_credentials_path(credentials.path())
            .compile(secrets)?;
        let config = write_config_document_in(dir, &compilation.to_yaml()?)?;

        // Staged files are dropped, and so removed, if construction fails.
        let api = factory.construct(config.path())?;
        api.reload_storage_from_env();

        info!(
            diagnostics = compilation.diagnostics.len(),
            "Monitoring system constructed"
        );

        Ok(Self {
            api,
            diagnostics: compilation.diagnostics,
            staged: Mutex::new(Some(StagedArtifacts {
                credentials,
                config,
            })),
            aggregator: HealthAggregator::new(),
        })
    }

    pub fn api(&self) -> &Arc<dyn BrandMonitoringApi> {
        &self.api
    }

    /// Compile-time diagnostics, kept for display
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether transient files are still on disk
    pub fn has_staged_artifacts(&self) -> bool {
        self.staged.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    fn release_artifacts(&self) {
        let staged = match self.staged.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(staged) = staged {
            staged.release();
        }
    }

    /// Initialize the external API once for this session
    pub async fn initialize(&self, session: &mut Session) -> std::result::Result<(), InitError> {
        if session.initialized {
            return Ok(());
        }

        let outcome = self.api.initialize().await;
        self.release_artifacts();

        match outcome {
            Ok(true) => {
                info!("Brand monitoring system initialized");
                session.initialized = true;
                Ok(())
            }
            Ok(false) => {
                warn!("Monitoring API reported initialization failure");
                Err(InitError::InitializeFailed(
                    "monitoring API reported it is not ready".to_string(),
                ))
            }
            Err(e) => {
                error!(error = %e, "Monitoring API initialization failed");
                Err(InitError::InitializeFailed(e.to_string()))
            }
        }
    }

    /// Run and aggregate a connection test
    pub async fn test_connections(
        &self,
        session: &Session,
    ) -> std::result::Result<HealthReport, InitError> {
        session.require_initialized()?;
        Ok(self.aggregator.check(self.api.as_ref()).await)
    }

    /// Run a monitoring pass; the session keeps the last successful result
    pub async fn monitor(
        &self,
        session: &mut Session,
        request: MonitoringRequest,
    ) -> Result<MonitoringResult> {
        session.require_initialized()?;
        if request.queries.iter().all(|q| q.trim().is_empty()) {
            return Err(MonitoringError::EmptyQuery.into());
        }

        info!(
            queries = request.queries.len(),
            mode = ?request.mode,
            "Starting brand monitoring"
        );

        let result = self
            .api
            .monitor_queries(&request)
            .await
            .map_err(|e| MonitoringError::QueryFailed(e.to_string()))?;

        if !result.success() {
            let reason = result.error().unwrap_or("Unknown error").to_string();
            warn!(error = %reason, "Brand monitoring reported failure");
            return Err(Error::Monitoring(MonitoringError::QueryFailed(reason)));
        }

        if let Some(summary) = result.summary() {
            info!(
                total_queries = summary.total_queries,
                brand_mentions = summary.brand_mentions_found,
                "Brand monitoring completed"
            );
        }

        session.last_results = Some(result.clone());
        Ok(result)
    }

    /// Wiring and settings as the external API reports them
    pub fn overview(&self, session: &Session) -> SystemOverview {
        let workflow = self.api.workflow().unwrap_or_default();
        SystemOverview {
            initialized: session.initialized,
            agents: workflow.agents,
            storage_configured: workflow.storage_manager,
            analytics_ready: workflow.analytics_engine,
            settings: self.api.settings(),
            diagnostics: self.diagnostics.clone(),
        }
    }

    /// Release everything the system still holds
    pub fn shutdown(self) {
        self.release_artifacts();
        info!("Monitoring system shut down");
    }
}

impl Drop for MonitoringSystem {
    fn drop(&mut self) {
        self.release_artifacts();
    }
}
