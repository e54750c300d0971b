//! Downloadable result artifacts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::result::MonitoringResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(Error::Export(format!("Unsupported export format: {}", other))),
        }
    }
}

/// `brand_monitoring_results_YYYYmmdd_HHMMSS.<ext>`
pub fn export_file_name(format: ExportFormat, at: DateTime<Utc>) -> String {
    format!(
        "brand_monitoring_results_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Pretty JSON of the verbatim result
pub fn export_json(result: &MonitoringResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result.raw())?)
}

/// One CSV row per query
pub fn export_csv(result: &MonitoringResult) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["query", "found", "confidence", "ranking", "agents"])?;

    for outcome in result.query_results() {
        let agents = outcome
            .agents
            .iter()
            .map(|a| format!("{}={}", a.agent, a.found))
            .collect::<Vec<_>>()
            .join(";");

        let confidence = format!("{:.4}", outcome.confidence);

        writer.write_record([
            outcome.query.as_str(),
            if outcome.found { "true" } else { "false" },
            confidence.as_str(),
            outcome.ranking.as_deref().unwrap_or(""),
            agents.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Export(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Export(e.to_string()))
}

/// Render in the requested format
pub fn export(result: &MonitoringResult, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => export_json(result),
        ExportFormat::Csv => export_csv(result),
    }
}
