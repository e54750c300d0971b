//! Runtime configuration consumed by the monitoring workflow
//!
//! Field names and nesting follow the YAML document the workflow reads, so a
//! [`RuntimeConfig`] serializes straight into that document and parses back
//! out of it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::secrets::SecretKey;

pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_WORKSHEET_NAME: &str = "Brand_Monitoring_New";
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";
pub const DEFAULT_BATCH_SIZE: u32 = 100;

pub const TARGET_BRAND: &str = "DataTobiz";
pub const BRAND_VARIATIONS: [&str; 7] = [
    "DataTobiz",
    "Data Tobiz",
    "data tobiz",
    "DATATOBIZ",
    "DataToBiz",
    "Data-Tobiz",
    "datatobiz.com",
];

pub const POSITIVE_KEYWORDS: [&str; 10] = [
    "excellent",
    "outstanding",
    "innovative",
    "reliable",
    "powerful",
    "comprehensive",
    "award-winning",
    "recognized",
    "trusted",
    "proven",
];

pub const NEGATIVE_KEYWORDS: [&str; 10] = [
    "poor",
    "bad",
    "disappointing",
    "limited",
    "lacking",
    "outdated",
    "problematic",
    "difficult",
    "complex",
    "unreliable",
];

/// The three LLM services queried for brand mentions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Perplexity,
    Gemini,
}

impl ProviderKind {
    /// Providers in configuration order
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::OpenAi,
        ProviderKind::Perplexity,
        ProviderKind::Gemini,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Perplexity => "perplexity",
            ProviderKind::Gemini => "gemini",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-3.5-turbo",
            ProviderKind::Perplexity => "sonar",
            ProviderKind::Gemini => "gemini-pro",
        }
    }

    /// Secret holding this provider's API key
    pub fn secret_key(&self) -> SecretKey {
        match self {
            ProviderKind::OpenAi => SecretKey::OpenAiApiKey,
            ProviderKind::Perplexity => SecretKey::PerplexityApiKey,
            ProviderKind::Gemini => SecretKey::GeminiApiKey,
        }
    }
}

/// Credentials and call settings for one provider
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    pub name: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    #[serde(rename = "timeout")]
    pub timeout_seconds: u64,
}

impl std::fmt::Debug for LlmProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmProviderConfig")
            .field("name", &self.name)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl LlmProviderConfig {
    /// Provider with the fixed model and call defaults
    pub fn for_kind(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            name: kind.name().to_string(),
            api_key: api_key.into(),
            model: kind.default_model().to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout_seconds: DEFAULT_PROVIDER_TIMEOUT_SECS,
        }
    }
}

/// Google Sheets persistence target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageTarget {
    pub spreadsheet_id: String,
    pub worksheet_name: String,
    #[serde(rename = "credentials_file")]
    pub credentials_path: PathBuf,
    pub auto_setup_headers: bool,
    pub batch_size: u32,
    pub enable_validation: bool,
}

impl StorageTarget {
    pub fn new(spreadsheet_id: impl Into<String>, credentials_path: impl Into<PathBuf>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            worksheet_name: DEFAULT_WORKSHEET_NAME.to_string(),
            credentials_path: credentials_path.into(),
            auto_setup_headers: true,
            batch_size: DEFAULT_BATCH_SIZE,
            enable_validation: true,
        }
    }
}

/// How the target brand is matched in provider output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandRules {
    pub target_brand: String,
    #[serde(rename = "brand_variations")]
    pub variations: Vec<String>,
    pub case_sensitive: bool,
    pub partial_match: bool,
}

impl Default for BrandRules {
    fn default() -> Self {
        Self {
            target_brand: TARGET_BRAND.to_string(),
            variations: BRAND_VARIATIONS.iter().map(|s| s.to_string()).collect(),
            case_sensitive: false,
            partial_match: true,
        }
    }
}

/// Multi-agent workflow tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTuning {
    pub max_retries: u32,
    #[serde(rename = "retry_delay")]
    pub retry_delay_seconds: f64,
    pub parallel_execution: bool,
    #[serde(rename = "timeout_per_agent")]
    pub per_agent_timeout_seconds: u64,
    pub log_level: String,
}

impl Default for WorkflowTuning {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_seconds: 1.0,
            parallel_execution: true,
            per_agent_timeout_seconds: 60,
            log_level: "INFO".to_string(),
        }
    }
}

/// Ranking detection heuristics switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingTuning {
    pub max_position: u32,
    pub min_confidence: f64,
    pub enable_ordinal_detection: bool,
    pub enable_list_detection: bool,
    pub enable_keyword_detection: bool,
    pub enable_numeric_detection: bool,
}

impl Default for RankingTuning {
    fn default() -> Self {
        Self {
            max_position: 20,
            min_confidence: 0.6,
            enable_ordinal_detection: true,
            enable_list_detection: true,
            enable_keyword_detection: true,
            enable_numeric_detection: true,
        }
    }
}

/// Second-stage feature switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage2Config {
    pub enable_ranking_detection: bool,
    pub enable_cost_tracking: bool,
    pub enable_analytics: bool,
    pub ranking_detection: RankingTuning,
}

impl Default for Stage2Config {
    fn default() -> Self {
        Self {
            enable_ranking_detection: true,
            enable_cost_tracking: true,
            enable_analytics: true,
            ranking_detection: RankingTuning::default(),
        }
    }
}

/// Keyword lists for context and sentiment analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentLexicon {
    pub context_window: u32,
    #[serde(rename = "enable_sentiment_analysis")]
    pub sentiment_analysis_enabled: bool,
    pub positive_keywords: Vec<String>,
    pub negative_keywords: Vec<String>,
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self {
            context_window: 200,
            sentiment_analysis_enabled: false,
            positive_keywords: POSITIVE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            negative_keywords: NEGATIVE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnhancedBrandConfig {
    pub context_analysis: SentimentLexicon,
}

/// Fully resolved configuration handed to the monitoring workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(rename = "llm_configs", with = "provider_map")]
    pub llm_providers: Vec<LlmProviderConfig>,
    #[serde(rename = "google_sheets")]
    pub storage: StorageTarget,
    pub brand: BrandRules,
    pub workflow: WorkflowTuning,
    pub stage2: Stage2Config,
    pub enhanced_brand: EnhancedBrandConfig,
}

impl RuntimeConfig {
    /// Ranking detection tuning
    pub fn ranking(&self) -> &RankingTuning {
        &self.stage2.ranking_detection
    }

    /// Sentiment keyword lists
    pub fn sentiment(&self) -> &SentimentLexicon {
        &self.enhanced_brand.context_analysis
    }

    /// Provider entry by name
    pub fn provider(&self, kind: ProviderKind) -> Option<&LlmProviderConfig> {
        self.llm_providers.iter().find(|p| p.name == kind.name())
    }

    /// Parse a rendered configuration document
    pub fn from_yaml(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(document)?)
    }
}

/// Providers serialize as a name-keyed mapping in list order
mod provider_map {
    use super::LlmProviderConfig;
    use indexmap::IndexMap;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(providers: &[LlmProviderConfig], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(providers.iter().map(|p| (p.name.as_str(), p)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<LlmProviderConfig>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = IndexMap::<String, LlmProviderConfig>::deserialize(deserializer)?;
        Ok(map.into_values().collect())
    }
}

/// Read-only settings view exposed by the external API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsView {
    pub target_brand: String,
    pub google_sheets: StorageTarget,
}

impl From<&RuntimeConfig> for SettingsView {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            target_brand: config.brand.target_brand.clone(),
            google_sheets: config.storage.clone(),
        }
    }
}

/// Provider names keyed to models, for display
pub fn provider_models(config: &RuntimeConfig) -> IndexMap<String, String> {
    config
        .llm_providers
        .iter()
        .map(|p| (p.name.clone(), p.model.clone()))
        .collect()
}
