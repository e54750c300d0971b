//! Connection-test payload returned by the monitoring workflow
//!
//! Only `success` and `error` are read eagerly. The nested sections are kept
//! raw until the payload reports success, since a failed test may leave them
//! absent or stale. Each section is then read on its own and every leaf is
//! read leniently: a wrongly typed value counts as absent instead of hiding
//! the rest of the report.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Raw status payload from `test_connections`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatusPayload {
    #[serde(default)]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// `agents`, `storage`, `analytics` and `stage2_features`, unparsed
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ProviderStatusPayload {
    /// Payload for a connection test that did not succeed
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            details: Map::new(),
        }
    }

    /// Successful payload carrying the given sections
    pub fn success(details: StatusDetails) -> Self {
        let details = match serde_json::to_value(details) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self {
            success: true,
            error: None,
            details,
        }
    }

    /// Read the nested sections; a malformed section reads as absent
    pub fn parse_details(&self) -> StatusDetails {
        let agents = match self.details.get("agents") {
            Some(Value::Object(agents)) => agents
                .iter()
                .map(|(name, status)| {
                    let status = serde_json::from_value(status.clone()).unwrap_or_else(|e| {
                        warn!(agent = %name, error = %e, "Malformed agent status");
                        AgentStatus::default()
                    });
                    (name.clone(), status)
                })
                .collect(),
            other => {
                self.report_malformed("agents", other);
                IndexMap::new()
            }
        };

        let stage2_features = match self.details.get("stage2_features") {
            Some(Value::Object(flags)) => flags
                .iter()
                .map(|(name, enabled)| (name.clone(), truthy(enabled)))
                .collect(),
            other => {
                self.report_malformed("stage2_features", other);
                IndexMap::new()
            }
        };

        StatusDetails {
            agents,
            storage: self.section("storage"),
            analytics: self.section("analytics"),
            stage2_features,
        }
    }

    fn section<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        match self.details.get(name) {
            None | Some(Value::Null) => T::default(),
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
                warn!(section = name, error = %e, "Malformed status section");
                T::default()
            }),
        }
    }

    fn report_malformed(&self, name: &str, value: Option<&Value>) {
        if let Some(value) = value.filter(|v| !v.is_null()) {
            warn!(section = name, found = %value, "Malformed status section");
        }
    }
}

/// Truthiness of a loosely typed status value
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Leaf readers that never fail on a wrongly typed value
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(super::truthy(&Value::deserialize(deserializer)?))
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }
}

/// Nested sections of a successful payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusDetails {
    #[serde(default)]
    pub agents: IndexMap<String, AgentStatus>,

    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub analytics: AnalyticsSection,

    #[serde(default)]
    pub stage2_features: IndexMap<String, bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub healthy: bool,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentStatus {
    pub fn healthy(model: impl Into<String>) -> Self {
        Self {
            healthy: true,
            model: Some(model.into()),
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            healthy: false,
            model: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_sheets: Option<SheetsStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetsStatus {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub available: bool,

    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub records_found: Option<u64>,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    #[serde(default, deserialize_with = "lenient::flag")]
    pub available: bool,

    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_payload_keeps_error() {
        let payload: ProviderStatusPayload = serde_json::from_str(
            r#"{"success": false, "error": "timeout", "agents": "stale", "storage": 42}"#,
        )
        .unwrap();
        assert!(!payload.success);
        assert_eq!(payload.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_agent_order_preserved() {
        let payload: ProviderStatusPayload = serde_json::from_str(
            r#"{"success": true, "agents": {
                "zeta": {"healthy": true, "model": "m1"},
                "alpha": {"healthy": false, "error": "x"},
                "mid": {"healthy": true}
            }}"#,
        )
        .unwrap();
        let details = payload.parse_details();
        let names: Vec<_> = details.agents.keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_success_constructor_roundtrips_sections() {
        let mut details = StatusDetails::default();
        details
            .agents
            .insert("openai".to_string(), AgentStatus::healthy("gpt-3.5-turbo"));
        details.storage.google_sheets = Some(SheetsStatus {
            available: true,
            records_found: Some(12),
            error: None,
        });

        let payload = ProviderStatusPayload::success(details.clone());
        assert_eq!(payload.parse_details(), details);
    }

    #[test]
    fn test_wrongly_typed_leaves_read_as_absent() {
        let payload: ProviderStatusPayload = serde_json::from_str(
            r#"{
                "success": true,
                "agents": {"openai": {"healthy": true, "model": 35}},
                "storage": {"google_sheets": {"available": true, "records_found": "Unknown"}},
                "analytics": {"engine": {"available": 1, "reason": null}},
                "stage2_features": {"ranking_detection": "yes", "cost_tracking": 0}
            }"#,
        )
        .unwrap();

        let details = payload.parse_details();
        assert!(details.agents["openai"].healthy);
        assert_eq!(details.agents["openai"].model.as_deref(), Some("35"));

        let sheets = details.storage.google_sheets.unwrap();
        assert!(sheets.available);
        assert_eq!(sheets.records_found, None);

        assert!(details.analytics.engine.unwrap().available);
        assert_eq!(details.stage2_features["ranking_detection"], true);
        assert_eq!(details.stage2_features["cost_tracking"], false);
    }

    #[test]
    fn test_malformed_section_does_not_hide_others() {
        let payload: ProviderStatusPayload = serde_json::from_str(
            r#"{
                "success": true,
                "agents": ["not", "a", "map"],
                "storage": {"google_sheets": "broken"},
                "analytics": {"engine": {"available": true}}
            }"#,
        )
        .unwrap();

        let details = payload.parse_details();
        assert!(details.agents.is_empty());
        assert!(details.storage.google_sheets.is_none());
        assert!(details.analytics.engine.unwrap().available);
    }

    #[test]
    fn test_numeric_string_record_count() {
        let payload: ProviderStatusPayload = serde_json::from_str(
            r#"{"success": true, "storage": {"google_sheets": {"available": true, "records_found": "57"}}}"#,
        )
        .unwrap();
        let sheets = payload.parse_details().storage.google_sheets.unwrap();
        assert_eq!(sheets.records_found, Some(57));
    }
}
