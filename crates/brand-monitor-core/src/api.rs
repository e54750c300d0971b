//! Contract of the external brand monitoring API
//!
//! The multi-agent workflow, ranking detection, analytics engine and sheet
//! storage live behind this trait. The dashboard only constructs it from a
//! rendered config file, initializes it once, and then calls it on demand.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::config::SettingsView;
use crate::error::{ApiError, InitError, MonitoringError};
use crate::health::ProviderStatusPayload;
use crate::result::MonitoringResult;

pub const DEFAULT_MAX_RESULTS: u32 = 10;
pub const MIN_MAX_RESULTS: u32 = 5;
pub const MAX_MAX_RESULTS: u32 = 50;

/// How the workflow fans queries out to agents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringMode {
    #[default]
    Parallel,
    Sequential,
}

/// Depth knob offered to the operator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDepth {
    #[default]
    Basic,
    Comprehensive,
    DeepAnalysis,
}

/// Arguments to `monitor_queries`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringRequest {
    pub queries: Vec<String>,
    #[serde(default)]
    pub mode: MonitoringMode,
    #[serde(default = "default_true")]
    pub enable_ranking: bool,
    #[serde(default = "default_true")]
    pub enable_analytics: bool,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default)]
    pub search_depth: SearchDepth,
}

fn default_true() -> bool {
    true
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

impl MonitoringRequest {
    /// One query with dashboard defaults; blank queries are rejected
    pub fn single(query: impl Into<String>) -> Result<Self, MonitoringError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(MonitoringError::EmptyQuery);
        }
        Ok(Self {
            queries: vec![query],
            mode: MonitoringMode::Parallel,
            enable_ranking: true,
            enable_analytics: true,
            max_results: DEFAULT_MAX_RESULTS,
            search_depth: SearchDepth::Basic,
        })
    }

    pub fn with_mode(mut self, mode: MonitoringMode) -> Self {
        self.mode = mode;
        self
    }

    /// Clamp into the range the dashboard offers
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results.clamp(MIN_MAX_RESULTS, MAX_MAX_RESULTS);
        self
    }

    pub fn with_search_depth(mut self, depth: SearchDepth) -> Self {
        self.search_depth = depth;
        self
    }
}

/// What the workflow exposes about its wiring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowView {
    pub agents: Vec<String>,
    pub storage_manager: bool,
    pub analytics_engine: bool,
}

/// The external monitoring API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrandMonitoringApi: Send + Sync {
    /// Bring agents, storage and analytics up; `false` means not ready
    async fn initialize(&self) -> Result<bool, ApiError>;

    /// Probe every provider, storage and analytics
    async fn test_connections(&self) -> Result<ProviderStatusPayload, ApiError>;

    /// Run a monitoring pass over the queries
    async fn monitor_queries(
        &self,
        request: &MonitoringRequest,
    ) -> Result<MonitoringResult, ApiError>;

    /// Loaded settings, `None` before the config was read
    fn settings(&self) -> Option<SettingsView>;

    /// Workflow wiring, `None` before initialization
    fn workflow(&self) -> Option<WorkflowView>;

    /// Re-read the storage target from the environment
    fn reload_storage_from_env(&self);
}

/// Builds an external API from a rendered config file
pub trait ApiFactory: Send + Sync {
    fn construct(&self, config_path: &Path) -> Result<Arc<dyn BrandMonitoringApi>, InitError>;
}

impl<F> ApiFactory for F
where
    F: Fn(&Path) -> Result<Arc<dyn BrandMonitoringApi>, InitError> + Send + Sync,
{
    fn construct(&self, config_path: &Path) -> Result<Arc<dyn BrandMonitoringApi>, InitError> {
        self(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_rejects_blank_query() {
        assert!(matches!(
            MonitoringRequest::single("   "),
            Err(MonitoringError::EmptyQuery)
        ));
    }

    #[test]
    fn test_single_defaults() {
        let req = MonitoringRequest::single("DataTobiz software services").unwrap();
        assert_eq!(req.queries, vec!["DataTobiz software services"]);
        assert_eq!(req.mode, MonitoringMode::Parallel);
        assert!(req.enable_ranking);
        assert!(req.enable_analytics);
        assert_eq!(req.max_results, 10);
    }

    #[test]
    fn test_max_results_clamped() {
        let req = MonitoringRequest::single("q").unwrap().with_max_results(500);
        assert_eq!(req.max_results, 50);
        let req = MonitoringRequest::single("q").unwrap().with_max_results(1);
        assert_eq!(req.max_results, 5);
    }

    #[test]
    fn test_request_wire_format() {
        let req = MonitoringRequest::single("q")
            .unwrap()
            .with_search_depth(SearchDepth::DeepAnalysis);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["mode"], "parallel");
        assert_eq!(json["search_depth"], "deep_analysis");

        let parsed: MonitoringRequest = serde_json::from_str(r#"{"queries": ["q"]}"#).unwrap();
        assert!(parsed.enable_ranking);
        assert_eq!(parsed.max_results, 10);
    }
}
