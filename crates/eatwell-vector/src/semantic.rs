use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;

use eatwell_core::types::{Category, CategoryHits, EmbeddingVector, TermSet};
use eatwell_core::{normalize_text, Catalog, Error, Result};

use crate::cache::EmbeddingCache;
use crate::similarity::cosine_similarity;

/// Flags keywords whose embedding is close to the utterance's.
///
/// A keyword hits when `cosine_similarity >= threshold`. Every lookup goes
/// through the shared cache; the matcher only reads vectors.
pub struct SemanticMatcher {
    cache: Arc<EmbeddingCache>,
    threshold: f32,
    concurrency: usize,
}

impl SemanticMatcher {
    pub fn new(cache: Arc<EmbeddingCache>, threshold: f32, concurrency: usize) -> Self {
        Self { cache, threshold, concurrency: concurrency.max(1) }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }

    pub async fn match_category(&self, utterance: &str, category: &Category) -> Result<TermSet> {
        if normalize_text(utterance).is_empty() {
            return Ok(TermSet::new());
        }
        let utterance_vec = self.cache.get_or_compute(utterance).await?;
        let keyword_vecs = self.keyword_vectors(&category.keywords).await?;
        Ok(self.hits(&utterance_vec, category, &keyword_vecs))
    }

    /// Hits for every category. The utterance is embedded once and reused.
    pub async fn match_all(&self, utterance: &str, catalog: &Catalog) -> Result<CategoryHits> {
        if normalize_text(utterance).is_empty() {
            return Ok(catalog.iter().map(|c| (c.id, TermSet::new())).collect());
        }
        let utterance_vec = self.cache.get_or_compute(utterance).await?;
        let keyword_vecs = self.keyword_vectors(&catalog.all_keywords()).await?;
        Ok(catalog.iter().map(|c| (c.id, self.hits(&utterance_vec, c, &keyword_vecs))).collect())
    }

    async fn keyword_vectors(&self, keywords: &[String]) -> Result<HashMap<String, EmbeddingVector>> {
        stream::iter(keywords.iter().cloned())
            .map(|kw| async move {
                let v = self.cache.get_or_compute(&kw).await?;
                Ok::<_, Error>((kw, v))
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await
    }

    fn hits(&self, utterance: &[f32], category: &Category, vectors: &HashMap<String, EmbeddingVector>) -> TermSet {
        let mut out = TermSet::new();
        for kw in &category.keywords {
            let Some(v) = vectors.get(kw) else { continue };
            match cosine_similarity(utterance, v) {
                Some(sim) if sim >= self.threshold => {
                    debug!(category = %category.id, keyword = %kw, similarity = sim, "semantic match");
                    out.insert(kw.clone());
                }
                _ => {}
            }
        }
        out
    }
}
