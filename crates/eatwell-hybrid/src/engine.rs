use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use eatwell_core::config::ScoringConfig;
use eatwell_core::traits::EmbeddingProvider;
use eatwell_core::types::{CategoryHits, ConversationState, PointCurve, ScoreResult, TermSet};
use eatwell_core::{Catalog, Error, Result};
use eatwell_text::LexicalMatcher;
use eatwell_vector::{EmbeddingCache, SemanticMatcher};

use crate::aggregate::{merge_turn, recompute_all, score_result};

/// Non-fatal problems met while scoring a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringWarning {
    /// The embedding provider failed; only lexical hits were applied.
    SemanticUnavailable(String),
    /// Semantic matching did not finish in time; only lexical hits were applied.
    SemanticTimedOut { after_ms: u64 },
}

impl fmt::Display for ScoringWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringWarning::SemanticUnavailable(reason) => write!(f, "semantic matching unavailable: {reason}"),
            ScoringWarning::SemanticTimedOut { after_ms } => write!(f, "semantic matching timed out after {after_ms} ms"),
        }
    }
}

/// Outcome of one `record_turn`.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    /// Terms first seen in this turn, per category.
    pub new_terms: CategoryHits,
    pub warnings: Vec<ScoringWarning>,
    pub score: ScoreResult,
}

impl TurnReport {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

type Slot = Arc<Mutex<ConversationState>>;

/// Scores conversations turn by turn.
///
/// Each conversation has its own async mutex: turns of one conversation run
/// one at a time, different conversations run in parallel. A turn's hits are
/// merged into a copy of the state and swapped in after the last await, so a
/// cancelled turn leaves the stored state as it was.
pub struct ScoringEngine {
    catalog: Catalog,
    lexical: LexicalMatcher,
    semantic: Option<SemanticMatcher>,
    config: ScoringConfig,
    curve: PointCurve,
    conversations: DashMap<String, Slot>,
}

impl ScoringEngine {
    pub fn new(catalog: Catalog, config: ScoringConfig, provider: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        Self::with_cache(catalog, config, Arc::new(EmbeddingCache::new(provider)))
    }

    /// Share one cache between engines (e.g. across tenants with the same provider).
    pub fn with_cache(catalog: Catalog, config: ScoringConfig, cache: Arc<EmbeddingCache>) -> Result<Self> {
        let semantic = SemanticMatcher::new(cache, config.similarity_threshold, config.max_concurrent_embeds);
        Self::build(catalog, config, Some(semantic))
    }

    /// Keyword matching only; no provider involved.
    pub fn lexical_only(catalog: Catalog, config: ScoringConfig) -> Result<Self> {
        Self::build(catalog, config, None)
    }

    fn build(catalog: Catalog, config: ScoringConfig, semantic: Option<SemanticMatcher>) -> Result<Self> {
        config.validate()?;
        let curve = config.point_curve()?;
        let lexical = LexicalMatcher::new(&catalog)?;
        Ok(Self { catalog, lexical, semantic, config, curve, conversations: DashMap::new() })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&Arc<EmbeddingCache>> {
        self.semantic.as_ref().map(SemanticMatcher::cache)
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }

    /// Pre-embed every catalog keyword so the first turns do not pay for it.
    pub async fn warm_up(&self, batch_size: usize) -> Result<usize> {
        match self.cache() {
            Some(cache) => cache.warm(&self.catalog.all_keywords(), batch_size).await,
            None => Ok(0),
        }
    }

    pub async fn record_turn(&self, conversation_id: &str, utterance: &str) -> Result<TurnReport> {
        validate_utterance(utterance, self.config.max_utterance_chars)?;
        let slot = self.slot(conversation_id);
        let mut state = slot.lock().await;

        let lexical = self.lexical.match_all(utterance);
        let mut warnings = Vec::new();
        let semantic = self.semantic_hits(conversation_id, utterance, &mut warnings).await;

        // Last await is above; from here the turn commits as a whole.
        let (next, new_terms) = merge_turn(&state, &lexical, &semantic, &self.catalog, &self.curve);
        *state = next;
        let score = score_result(conversation_id, &state, &self.catalog);
        let added: usize = new_terms.values().map(TermSet::len).sum();
        info!(conversation = conversation_id, turn = state.turns, added, total = score.total, "turn recorded");
        Ok(TurnReport { new_terms, warnings, score })
    }

    async fn semantic_hits(&self, conversation_id: &str, utterance: &str, warnings: &mut Vec<ScoringWarning>) -> CategoryHits {
        let Some(matcher) = &self.semantic else { return CategoryHits::new() };
        let limit = Duration::from_millis(self.config.embed_timeout_ms);
        match tokio::time::timeout(limit, matcher.match_all(utterance, &self.catalog)).await {
            Ok(Ok(hits)) => {
                debug!(conversation = conversation_id, "semantic matching done");
                hits
            }
            Ok(Err(e)) => {
                warn!(conversation = conversation_id, error = %e, "semantic matching failed; using lexical hits only");
                warnings.push(ScoringWarning::SemanticUnavailable(e.to_string()));
                CategoryHits::new()
            }
            Err(_) => {
                warn!(conversation = conversation_id, timeout_ms = self.config.embed_timeout_ms, "semantic matching timed out; using lexical hits only");
                warnings.push(ScoringWarning::SemanticTimedOut { after_ms: self.config.embed_timeout_ms });
                CategoryHits::new()
            }
        }
    }

    /// Current score; an unknown conversation scores zero everywhere.
    pub async fn get_score(&self, conversation_id: &str) -> ScoreResult {
        match self.existing(conversation_id) {
            Some(slot) => {
                let state = slot.lock().await;
                score_result(conversation_id, &state, &self.catalog)
            }
            None => score_result(conversation_id, &ConversationState::default(), &self.catalog),
        }
    }

    pub async fn export_state(&self, conversation_id: &str) -> Result<ConversationState> {
        let slot = self
            .existing(conversation_id)
            .ok_or_else(|| Error::NotFound(format!("conversation '{conversation_id}'")))?;
        let state = slot.lock().await;
        Ok(state.clone())
    }

    /// Replace a conversation's state with a checkpoint.
    ///
    /// Every term must be a keyword of its category; points are recomputed
    /// with the engine's curve rather than trusted.
    pub async fn import_state(&self, conversation_id: &str, mut state: ConversationState) -> Result<()> {
        for (id, cs) in &state.categories {
            let category = self.catalog.get(*id);
            if let Some(term) = cs.matched_terms.iter().find(|t| !category.keywords.contains(t)) {
                return Err(Error::InvalidState(format!("term '{term}' is not a keyword of '{id}'")));
            }
        }
        recompute_all(&mut state, &self.catalog, &self.curve);
        let slot = self.slot(conversation_id);
        let mut current = slot.lock().await;
        *current = state;
        info!(conversation = conversation_id, turns = current.turns, "state imported");
        Ok(())
    }

    /// Clear a conversation. Returns whether it existed.
    pub async fn reset(&self, conversation_id: &str) -> bool {
        match self.existing(conversation_id) {
            Some(slot) => {
                *slot.lock().await = ConversationState::default();
                true
            }
            None => false,
        }
    }

    fn slot(&self, conversation_id: &str) -> Slot {
        self.conversations.entry(conversation_id.to_string()).or_default().value().clone()
    }

    fn existing(&self, conversation_id: &str) -> Option<Slot> {
        self.conversations.get(conversation_id).map(|r| r.value().clone())
    }
}

fn validate_utterance(text: &str, max_chars: usize) -> Result<()> {
    if let Some(c) = text.chars().find(|c| c.is_control() && !matches!(*c, '\n' | '\r' | '\t')) {
        return Err(Error::InvalidUtterance(format!("control character U+{:04X}", c as u32)));
    }
    let len = text.chars().count();
    if len > max_chars {
        return Err(Error::InvalidUtterance(format!("{len} characters exceeds the limit of {max_chars}")));
    }
    Ok(())
}
