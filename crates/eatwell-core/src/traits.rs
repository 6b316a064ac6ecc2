use async_trait::async_trait;

use crate::error::Result;

/// Turns a text span into a fixed-length vector.
///
/// Implementations report network, auth and quota failures as
/// `Error::ProviderUnavailable`. Every vector returned for a given
/// `provider_id` has the same dimensionality.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-3-small`).
    fn provider_id(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Compute embeddings for a batch of input texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}
