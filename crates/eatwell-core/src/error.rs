use thiserror::Error;

/// Errors surfaced by the scoring core.
///
/// `Clone` so a single provider failure can be handed to every caller that
/// was waiting on the same cache entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid utterance: {0}")]
    InvalidUtterance(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn is_provider_unavailable(&self) -> bool {
        matches!(self, Error::ProviderUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
