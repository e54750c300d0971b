//! Health-check aggregation
//!
//! Flattens the connection-test payload into a display-ready
//! [`HealthReport`]. This is an adapter: presence and absence checks only,
//! no policy beyond reading each subsystem's availability flag.

mod payload;

pub use payload::*;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::BrandMonitoringApi;
use crate::error::HealthCheckError;

const UNKNOWN_ERROR: &str = "Unknown error";
const NOT_AVAILABLE: &str = "Not available";

/// Per-agent health line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentHealth {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageHealth {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsHealth {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Health of every subsystem after a successful connection test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub agents: Vec<AgentHealth>,
    pub storage: StorageHealth,
    pub analytics: AnalyticsHealth,
    pub features: IndexMap<String, bool>,
}

impl SystemHealth {
    pub fn online_agents(&self) -> impl Iterator<Item = &AgentHealth> {
        self.agents.iter().filter(|a| a.healthy)
    }

    pub fn offline_agents(&self) -> impl Iterator<Item = &AgentHealth> {
        self.agents.iter().filter(|a| !a.healthy)
    }
}

/// Normalized connection-test outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthReport {
    Operational(SystemHealth),
    Failed { error: String },
}

impl HealthReport {
    pub fn failure(err: HealthCheckError) -> Self {
        let HealthCheckError::AggregateFailure(error) = err;
        HealthReport::Failed { error }
    }

    pub fn is_operational(&self) -> bool {
        matches!(self, HealthReport::Operational(_))
    }

    pub fn system(&self) -> Option<&SystemHealth> {
        match self {
            HealthReport::Operational(system) => Some(system),
            HealthReport::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            HealthReport::Operational(_) => None,
            HealthReport::Failed { error } => Some(error),
        }
    }

    /// Every agent healthy and both storage and analytics available
    pub fn all_online(&self) -> bool {
        self.system().is_some_and(|s| {
            s.agents.iter().all(|a| a.healthy) && s.storage.available && s.analytics.available
        })
    }
}

/// Turns connection-test payloads into [`HealthReport`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthAggregator;

impl HealthAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Flatten a payload
    pub fn aggregate(&self, payload: &ProviderStatusPayload) -> HealthReport {
        if !payload.success {
            let error = payload
                .error
                .clone()
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            return HealthReport::failure(HealthCheckError::AggregateFailure(error));
        }

        let details = payload.parse_details();

        let agents = details
            .agents
            .into_iter()
            .map(|(name, status)| {
                let reason = if status.healthy {
                    None
                } else {
                    Some(status.error.unwrap_or_else(|| "Failed".to_string()))
                };
                AgentHealth {
                    name,
                    healthy: status.healthy,
                    model: status.model,
                    reason,
                }
            })
            .collect();

        let storage = match details.storage.google_sheets {
            Some(sheets) if sheets.available => StorageHealth {
                available: true,
                record_count: sheets.records_found,
                error: None,
            },
            Some(sheets) => StorageHealth {
                available: false,
                record_count: None,
                error: Some(sheets.error.unwrap_or_else(|| NOT_AVAILABLE.to_string())),
            },
            None => StorageHealth {
                available: false,
                record_count: None,
                error: Some(NOT_AVAILABLE.to_string()),
            },
        };

        let analytics = match details.analytics.engine {
            Some(engine) if engine.available => AnalyticsHealth {
                available: true,
                reason: None,
            },
            Some(engine) => AnalyticsHealth {
                available: false,
                reason: Some(engine.reason.unwrap_or_else(|| NOT_AVAILABLE.to_string())),
            },
            None => AnalyticsHealth {
                available: false,
                reason: Some(NOT_AVAILABLE.to_string()),
            },
        };

        HealthReport::Operational(SystemHealth {
            agents,
            storage,
            analytics,
            features: details.stage2_features,
        })
    }

    /// Run the external connection test and aggregate its payload
    ///
    /// A failing call yields one aggregate failure carrying the error text.
    pub async fn check(&self, api: &dyn BrandMonitoringApi) -> HealthReport {
        let report = match api.test_connections().await {
            Ok(payload) => self.aggregate(&payload),
            Err(e) => HealthReport::failure(HealthCheckError::AggregateFailure(e.to_string())),
        };

        match &report {
            HealthReport::Operational(system) => info!(
                agents_online = system.online_agents().count(),
                agents_offline = system.offline_agents().count(),
                storage = system.storage.available,
                analytics = system.analytics.available,
                "Connection test completed"
            ),
            HealthReport::Failed { error } => warn!(error = %error, "Connection test failed"),
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_payload_exposes_only_error() {
        let payload = ProviderStatusPayload::failure("timeout");
        let report = HealthAggregator::new().aggregate(&payload);

        assert_eq!(report, HealthReport::Failed { error: "timeout".to_string() });
        assert!(report.system().is_none());
        assert!(!report.all_online());
    }

    #[test]
    fn test_failed_payload_without_error_text() {
        let payload = ProviderStatusPayload::default();
        let report = HealthAggregator::new().aggregate(&payload);
        assert_eq!(report.error(), Some("Unknown error"));
    }

    #[test]
    fn test_agents_classified_in_order() {
        let mut details = StatusDetails::default();
        details.agents.insert("a".to_string(), AgentStatus::healthy("gpt"));
        details.agents.insert("b".to_string(), AgentStatus::unhealthy("x"));

        let report = HealthAggregator::new().aggregate(&ProviderStatusPayload::success(details));
        let system = report.system().unwrap();

        assert_eq!(system.agents.len(), 2);
        assert_eq!(system.agents[0].name, "a");
        assert!(system.agents[0].healthy);
        assert_eq!(system.agents[0].model.as_deref(), Some("gpt"));
        assert_eq!(system.agents[1].name, "b");
        assert!(!system.agents[1].healthy);
        assert_eq!(system.agents[1].reason.as_deref(), Some("x"));
    }

    #[test]
    fn test_missing_sections_reported_unavailable() {
        let report = HealthAggregator::new()
            .aggregate(&ProviderStatusPayload::success(StatusDetails::default()));
        let system = report.system().unwrap();

        assert!(!system.storage.available);
        assert_eq!(system.storage.error.as_deref(), Some("Not available"));
        assert!(!system.analytics.available);
        assert_eq!(system.analytics.reason.as_deref(), Some("Not available"));
        assert!(system.features.is_empty());
    }

    #[test]
    fn test_storage_analytics_and_features() {
        let payload: ProviderStatusPayload = serde_json::from_str(
            r#"{
                "success": true,
                "agents": {"openai": {"healthy": true, "model": "gpt-3.5-turbo"}},
                "storage": {"google_sheets": {"available": true, "records_found": 57}},
                "analytics": {"engine": {"available": false, "reason": "disabled"}},
                "stage2_features": {"ranking_detection": true, "cost_tracking": false}
            }"#,
        )
        .unwrap();

        let report = HealthAggregator::new().aggregate(&payload);
        let system = report.system().unwrap();

        assert_eq!(system.storage.record_count, Some(57));
        assert_eq!(system.analytics.reason.as_deref(), Some("disabled"));
        assert_eq!(
            system.features.iter().collect::<Vec<_>>(),
            vec![
                (&"ranking_detection".to_string(), &true),
                (&"cost_tracking".to_string(), &false)
            ]
        );
        assert!(!report.all_online());
    }

    #[test]
    fn test_unknown_record_count_keeps_report_operational() {
        let payload: ProviderStatusPayload = serde_json::from_str(
            r#"{
                "success": true,
                "agents": {"openai": {"healthy": true, "model": "gpt-3.5-turbo"}},
                "storage": {"google_sheets": {"available": true, "records_found": "Unknown"}},
                "analytics": {"engine": {"available": true}}
            }"#,
        )
        .unwrap();

        let report = HealthAggregator::new().aggregate(&payload);
        let system = report.system().unwrap();

        assert_eq!(system.agents.len(), 1);
        assert!(system.agents[0].healthy);
        assert!(system.storage.available);
        assert_eq!(system.storage.record_count, None);
        assert!(report.all_online());
    }

    #[test]
    fn test_malformed_agents_section_keeps_other_sections() {
        let payload: ProviderStatusPayload = serde_json::from_str(
            r#"{
                "success": true,
                "agents": ["not", "a", "map"],
                "storage": {"google_sheets": {"available": true, "records_found": 3}}
            }"#,
        )
        .unwrap();

        let report = HealthAggregator::new().aggregate(&payload);
        let system = report.system().unwrap();

        assert!(system.agents.is_empty());
        assert!(system.storage.available);
        assert_eq!(system.storage.record_count, Some(3));
        assert!(!system.analytics.available);
    }

    #[test]
    fn test_report_serializes_with_status_tag() {
        let report = HealthReport::Failed { error: "timeout".to_string() };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "timeout");
    }
}
