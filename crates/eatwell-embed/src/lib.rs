//! Embedding providers.
//!
//! `OpenAiProvider` talks to an OpenAI-compatible `/embeddings` endpoint.
//! `HashingProvider` is deterministic and offline; it is selected with
//! `APP_USE_FAKE_EMBEDDINGS=1` or when no API key is available.
//! `StaticProvider` serves scripted vectors for tests and demos.
use std::sync::Arc;

use eatwell_core::config::{EmbeddingConfig, ProviderKind};
use eatwell_core::traits::EmbeddingProvider;
use eatwell_core::Result;
use tracing::{info, warn};

pub mod hashing;
pub mod openai;
pub mod static_provider;

pub use hashing::HashingProvider;
pub use openai::OpenAiProvider;
pub use static_provider::StaticProvider;

pub fn get_default_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
    if use_fake || config.provider == ProviderKind::Hashing {
        info!(dim = config.hashing_dim, "using hashing embeddings");
        return Ok(Arc::new(HashingProvider::new(config.hashing_dim)));
    }
    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.trim().is_empty() => {
            info!(model = %config.model, "using OpenAI embeddings");
            Ok(Arc::new(OpenAiProvider::from_config(key, config)?))
        }
        _ => {
            warn!(var = %config.api_key_env, "API key not set; falling back to hashing embeddings");
            Ok(Arc::new(HashingProvider::new(config.hashing_dim)))
        }
    }
}
