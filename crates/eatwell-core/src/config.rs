//! Lightweight configuration loader.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`APP_SCORING__SIMILARITY_THRESHOLD=0.8` sets `scoring.similarity_threshold`).
//! Sections that are absent fall back to their `Default`.
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::types::{Category, PointCurve};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    /// Build from an inline TOML document; used by tests and embedders.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config = Self { figment: Figment::new().merge(Toml::string(toml)) };
        config.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    fn section<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if self.figment.contains(key) { self.get(key) } else { Ok(T::default()) }
    }

    pub fn scoring(&self) -> Result<ScoringConfig> {
        let scoring: ScoringConfig = self.section("scoring")?;
        scoring.validate()?;
        Ok(scoring)
    }

    pub fn embedding(&self) -> Result<EmbeddingConfig> {
        self.section("embedding")
    }

    /// The configured catalog, or the built-in one when `[catalog]` is absent.
    pub fn catalog(&self) -> Result<Catalog> {
        if self.figment.contains("catalog.categories") {
            let categories: Vec<Category> = self.get("catalog.categories")?;
            Catalog::new(categories)
        } else {
            Catalog::healthy_eating()
        }
    }

    fn validate(&self) -> Result<()> {
        self.scoring()?;
        self.embedding()?;
        self.catalog()?;
        Ok(())
    }
}

/// Tunables of the matching and aggregation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Cosine similarity at or above which a keyword is a semantic hit.
    pub similarity_threshold: f32,
    /// Share of `max_points` awarded for 1, 2, 3.. distinct terms.
    pub tier_percents: Vec<u32>,
    pub embed_timeout_ms: u64,
    pub max_concurrent_embeds: usize,
    pub max_utterance_chars: usize,
    /// Pre-embed every catalog keyword at startup.
    pub warm_up: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.80,
            tier_percents: PointCurve::default().tiers().to_vec(),
            embed_timeout_ms: 1500,
            max_concurrent_embeds: 8,
            max_utterance_chars: 4000,
            warm_up: true,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.similarity_threshold.is_finite() || !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::InvalidConfig(format!(
                "similarity_threshold must be within [-1, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.embed_timeout_ms == 0 {
            return Err(Error::InvalidConfig("embed_timeout_ms must be > 0".into()));
        }
        if self.max_concurrent_embeds == 0 {
            return Err(Error::InvalidConfig("max_concurrent_embeds must be > 0".into()));
        }
        if self.max_utterance_chars == 0 {
            return Err(Error::InvalidConfig("max_utterance_chars must be > 0".into()));
        }
        self.point_curve().map(|_| ())
    }

    pub fn point_curve(&self) -> Result<PointCurve> {
        PointCurve::new(self.tier_percents.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Hashing,
}

/// Where embeddings come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub dimensions: Option<usize>,
    pub timeout_ms: u64,
    pub max_retries: usize,
    pub batch_size: usize,
    pub hashing_dim: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            dimensions: None,
            timeout_ms: 1000,
            max_retries: 2,
            batch_size: 64,
            hashing_dim: 1024,
        }
    }
}
