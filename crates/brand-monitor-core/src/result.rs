//! Monitoring results
//!
//! A [`MonitoringResult`] is kept exactly as the workflow returned it; the
//! accessors below only read from it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Verbatim result of `monitor_queries`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitoringResult(Value);

impl MonitoringResult {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn into_raw(self) -> Value {
        self.0
    }

    pub fn success(&self) -> bool {
        self.0.get("success").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn error(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }

    /// Headline numbers, when the workflow reported a summary
    pub fn summary(&self) -> Option<MonitoringSummary> {
        let summary = self.0.get("summary")?;
        Some(MonitoringSummary {
            total_queries: summary
                .get("total_queries")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            brand_mentions_found: summary
                .get("brand_mentions_found")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            brand_detection_rate: summary
                .get("brand_detection_rate")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            execution_time: summary
                .get("execution_time")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
        })
    }

    /// Per-query outcomes in the order the workflow reported them
    pub fn query_results(&self) -> Vec<QueryOutcome> {
        let Some(results) = self.0.get("results").and_then(Value::as_object) else {
            return Vec::new();
        };

        results
            .iter()
            .map(|(query, result)| QueryOutcome {
                query: query.clone(),
                found: result.get("found").and_then(Value::as_bool).unwrap_or(false),
                confidence: result
                    .get("confidence")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0),
                ranking: result
                    .get("ranking")
                    .filter(|r| !is_falsy(r))
                    .map(display_value),
                agents: result
                    .get("agents")
                    .and_then(Value::as_object)
                    .map(|agents| {
                        agents
                            .iter()
                            .map(|(name, agent)| AgentOutcome {
                                agent: name.clone(),
                                completed: agent.get("status").and_then(Value::as_str)
                                    == Some("completed"),
                                found: agent.get("found").and_then(Value::as_bool).unwrap_or(false),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect()
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringSummary {
    pub total_queries: u64,
    pub brand_mentions_found: u64,
    pub brand_detection_rate: f64,
    pub execution_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub query: String,
    pub found: bool,
    pub confidence: f64,
    pub ranking: Option<String>,
    pub agents: Vec<AgentOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub agent: String,
    pub completed: bool,
    pub found: bool,
}
