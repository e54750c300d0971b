//! YAML rendering of the runtime configuration

use crate::config::RuntimeConfig;
use crate::error::ConfigError;

const HEADER: &str = "# Enhanced DataTobiz Brand Monitoring Configuration (Stage 2)\n\
                      # Generated from deployment secrets\n\n";

/// Render the configuration document the monitoring workflow loads
pub fn render_yaml(config: &RuntimeConfig) -> Result<String, ConfigError> {
    let body = serde_yaml::to_string(config)?;
    Ok(format!("{}{}", HEADER, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::ConfigCompiler;
    use crate::secrets::{SecretKey, SecretSet};

    fn secrets() -> SecretSet {
        SecretSet::new()
            .with(SecretKey::OpenAiApiKey, "sk-test")
            .with(SecretKey::PerplexityApiKey, "pplx-0123456789abcdefghij")
            .with(SecretKey::GeminiApiKey, "gemini-test")
            .with(SecretKey::SpreadsheetId, "sheet-123")
            .with(SecretKey::ServiceAccountCredentials, r#"{"client_email":"a@b.c"}"#)
    }

    #[test]
    fn test_render_layout() {
        let compiled = ConfigCompiler::new().compile(&secrets()).unwrap();
        let yaml = render_yaml(&compiled.config).unwrap();

        assert!(yaml.starts_with("# Enhanced DataTobiz"));
        assert!(yaml.contains("llm_configs:"));
        assert!(yaml.contains("worksheet_name: Brand_Monitoring_New"));
        assert!(yaml.contains("timeout_per_agent: 60"));
        assert!(yaml.contains("ranking_detection:"));
        assert!(yaml.contains("context_analysis:"));

        let openai = yaml.find("openai:").unwrap();
        let perplexity = yaml.find("perplexity:").unwrap();
        let gemini = yaml.find("gemini:").unwrap();
        assert!(openai < perplexity && perplexity < gemini);
    }

    #[test]
    fn test_render_parses_back() {
        let compiled = ConfigCompiler::new().compile(&secrets()).unwrap();
        let yaml = render_yaml(&compiled.config).unwrap();
        let parsed = RuntimeConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, compiled.config);
    }

    #[test]
    fn test_render_quotes_awkward_values() {
        let secrets = secrets().with(SecretKey::OpenAiApiKey, "sk-\"quoted\": value #1");
        let compiled = ConfigCompiler::new().compile(&secrets).unwrap();
        let yaml = render_yaml(&compiled.config).unwrap();
        let parsed = RuntimeConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.llm_providers[0].api_key, "sk-\"quoted\": value #1");
    }
}
