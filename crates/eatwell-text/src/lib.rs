//! eatwell-text
//!
//! Literal keyword detection. Utterances and keywords go through the same
//! tantivy analyzer (see `tantivy_utils`) and keywords hit on whole-token runs.
pub mod tantivy_utils;
pub mod matcher;

pub use matcher::LexicalMatcher;
pub use tantivy_utils::{build_analyzer, tokenize};
