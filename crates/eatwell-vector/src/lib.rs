//! Semantic side of the scorer: a memoizing embedding cache in front of an
//! `EmbeddingProvider`, cosine similarity, and the threshold matcher.
pub mod cache;
pub mod semantic;
pub mod similarity;

pub use cache::{CacheEntry, EmbeddingCache};
pub use semantic::SemanticMatcher;
pub use similarity::cosine_similarity;
