//! In-memory embedding cache keyed by normalized text.
//!
//! The cache is consulted before calling the provider and filled on misses.
//! Concurrent misses for one key share a single provider call, and a failed
//! call leaves no entry behind. Entries are never evicted.
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use tracing::{debug, info};

use eatwell_core::traits::EmbeddingProvider;
use eatwell_core::types::EmbeddingVector;
use eatwell_core::{normalize_text, Error, Result};

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub vector: EmbeddingVector,
    pub created_at: DateTime<Utc>,
}

pub struct EmbeddingCache {
    provider: Arc<dyn EmbeddingProvider>,
    entries: Cache<String, CacheEntry>,
    provider_calls: AtomicU64,
}

impl EmbeddingCache {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider, entries: Cache::builder().build(), provider_calls: AtomicU64::new(0) }
    }

    pub fn provider_id(&self) -> &str {
        self.provider.provider_id()
    }

    /// Texts sent to the provider so far (one per text, batched or not).
    pub fn provider_calls(&self) -> u64 {
        self.provider_calls.load(Ordering::SeqCst)
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(&normalize_text(text))
    }

    pub async fn cached(&self, text: &str) -> Option<CacheEntry> {
        self.entries.get(&normalize_text(text)).await
    }

    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn get_or_compute(&self, text: &str) -> Result<EmbeddingVector> {
        let key = normalize_text(text);
        if key.is_empty() {
            return Err(Error::InvalidUtterance("cannot embed empty text".into()));
        }
        let init = async {
            self.provider_calls.fetch_add(1, Ordering::SeqCst);
            debug!(key = %key, "embedding cache miss");
            let vector = self.provider.embed(&key).await?;
            check_vector(&vector)?;
            Ok::<_, Error>(CacheEntry { vector: Arc::from(vector), created_at: Utc::now() })
        };
        self.entries
            .try_get_with(key.clone(), init)
            .await
            .map(|entry| entry.vector)
            .map_err(|e| (*e).clone())
    }

    /// Embed every uncached text with `embed_batch`, `batch_size` at a time.
    /// Returns how many texts were embedded.
    pub async fn warm(&self, texts: &[String], batch_size: usize) -> Result<usize> {
        let mut seen = HashSet::new();
        let misses: Vec<String> = texts
            .iter()
            .map(|t| normalize_text(t))
            .filter(|k| !k.is_empty() && !self.entries.contains_key(k) && seen.insert(k.clone()))
            .collect();
        for chunk in misses.chunks(batch_size.max(1)) {
            self.provider_calls.fetch_add(chunk.len() as u64, Ordering::SeqCst);
            let vectors = self.provider.embed_batch(chunk).await?;
            if vectors.len() != chunk.len() {
                return Err(Error::ProviderUnavailable(format!(
                    "provider returned {} vectors for {} texts",
                    vectors.len(),
                    chunk.len()
                )));
            }
            for v in &vectors {
                check_vector(v)?;
            }
            let now = Utc::now();
            for (key, vector) in chunk.iter().zip(vectors) {
                self.entries.insert(key.clone(), CacheEntry { vector: Arc::from(vector), created_at: now }).await;
            }
        }
        if !misses.is_empty() {
            info!(embedded = misses.len(), provider = self.provider_id(), "embedding cache warmed");
        }
        Ok(misses.len())
    }
}

fn check_vector(v: &[f32]) -> Result<()> {
    if v.is_empty() {
        return Err(Error::ProviderUnavailable("provider returned an empty vector".into()));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(Error::ProviderUnavailable("provider returned a non-finite vector".into()));
    }
    Ok(())
}
