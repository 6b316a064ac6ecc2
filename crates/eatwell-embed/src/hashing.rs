use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use twox_hash::XxHash64;

use eatwell_core::traits::EmbeddingProvider;
use eatwell_core::{normalize_text, Result};

/// Bag-of-tokens embedding over hashed buckets, L2-normalized.
///
/// Deterministic and free; texts that share words get positive similarity,
/// which is enough to exercise the semantic path without a model.
pub struct HashingProvider {
    dim: usize,
    id: String,
}

impl HashingProvider {
    pub fn new(dim: usize) -> Self {
        let dim = dim.max(1);
        Self { dim, id: format!("hashing:xxh64:d{dim}") }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in normalize_text(text).split_whitespace() {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            v[idx] += 0.5 + ((h >> 32) as u32) as f32 / u32::MAX as f32;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v { *x /= norm; }
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn provider_id(&self) -> &str {
        &self.id
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }
}
