//! Hybrid scoring: lexical and semantic hits merged per category into a
//! cumulative, monotonic conversation score.
pub mod aggregate;
pub mod engine;

pub use engine::{ScoringEngine, ScoringWarning, TurnReport};
