use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use eatwell_core::traits::EmbeddingProvider;
use eatwell_core::{normalize_text, Error, Result};

/// Serves scripted vectors keyed by normalized text.
///
/// Unknown texts map to the zero vector, which never clears a similarity
/// threshold. Calls are counted; failures and latency can be injected.
pub struct StaticProvider {
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Option<Duration>,
}

impl StaticProvider {
    pub fn new(dim: usize) -> Self {
        Self { dim, vectors: HashMap::new(), calls: AtomicUsize::new(0), failing: AtomicBool::new(false), delay: None }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(normalize_text(text), vector);
        self
    }

    /// Sleep before answering every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `embed` calls (batch calls count one per text).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StaticProvider {
    fn provider_id(&self) -> &str {
        "static"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::ProviderUnavailable("static provider set to fail".into()));
        }
        Ok(self.vectors.get(&normalize_text(text)).cloned().unwrap_or_else(|| vec![0.0; self.dim]))
    }
}
