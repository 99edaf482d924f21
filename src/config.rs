use serde::Deserialize;

use crate::services::similarity::SimilarityStrategy;
use crate::services::vectorizer::{FeatureWeights, VectorizerParams};

/// Named repetition-weight presets for the content blob
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeaturePreset {
    /// overview=3, keywords=3, genres=3, title=1
    #[default]
    Full,
    /// overview=2, keywords=2, genres=2, title=1
    Balanced,
    /// Overview text only
    OverviewOnly,
}

impl FeaturePreset {
    pub fn weights(self) -> FeatureWeights {
        match self {
            FeaturePreset::Full => FeatureWeights::full(),
            FeaturePreset::Balanced => FeatureWeights::balanced(),
            FeaturePreset::OverviewOnly => FeatureWeights::overview_only(),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Local movies CSV
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Remote movies CSV; takes precedence over `catalog_path` when set
    #[serde(default)]
    pub catalog_url: Option<String>,

    #[serde(default)]
    pub feature_preset: FeaturePreset,

    /// Vocabulary cap, 0 disables the cap
    #[serde(default = "default_max_features")]
    pub max_features: usize,

    #[serde(default)]
    pub similarity_strategy: SimilarityStrategy,

    /// Build the content model before the listener is bound
    #[serde(default = "default_eager_init")]
    pub eager_init: bool,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_catalog_path() -> String {
    "data/movies.csv".to_string()
}

fn default_max_features() -> usize {
    10_000
}

fn default_eager_init() -> bool {
    true
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Parameters handed to the vectorizer at fit time
    pub fn vectorizer_params(&self) -> VectorizerParams {
        VectorizerParams {
            weights: self.feature_preset.weights(),
            max_features: (self.max_features > 0).then_some(self.max_features),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
