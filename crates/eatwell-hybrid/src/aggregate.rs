//! Pure merge and scoring steps. No I/O, no locking.

use chrono::Utc;

use eatwell_core::types::{CategoryHits, CategoryScore, ConversationState, PointCurve, ScoreResult, TermSet};
use eatwell_core::Catalog;

/// Union this turn's lexical and semantic hits into a copy of `state`.
///
/// Returns the next state (turn counted, points recomputed from the term
/// counts) and the terms that were not seen before. `state` is untouched,
/// so the caller decides when the turn is committed.
pub fn merge_turn(
    state: &ConversationState,
    lexical: &CategoryHits,
    semantic: &CategoryHits,
    catalog: &Catalog,
    curve: &PointCurve,
) -> (ConversationState, CategoryHits) {
    let mut next = state.clone();
    let mut added = CategoryHits::new();
    for category in catalog.iter() {
        let slot = next.categories.entry(category.id).or_default();
        let mut fresh = TermSet::new();
        for term in lexical.get(&category.id).into_iter().chain(semantic.get(&category.id)).flatten() {
            if slot.matched_terms.insert(term.clone()) {
                fresh.insert(term.clone());
            }
        }
        slot.recompute(curve, category.max_points);
        added.insert(category.id, fresh);
    }
    next.turns += 1;
    next.updated_at = Utc::now();
    (next, added)
}

/// Re-derive every category's points from its terms.
pub fn recompute_all(state: &mut ConversationState, catalog: &Catalog, curve: &PointCurve) {
    for category in catalog.iter() {
        state.categories.entry(category.id).or_default().recompute(curve, category.max_points);
    }
}

/// Fresh `ScoreResult` view of `state`.
pub fn score_result(conversation_id: &str, state: &ConversationState, catalog: &Catalog) -> ScoreResult {
    let categories: Vec<CategoryScore> = catalog
        .iter()
        .map(|c| {
            let cs = state.category(c.id);
            CategoryScore {
                id: c.id,
                name: c.name.clone(),
                points: cs.map_or(0, |s| s.points.min(c.max_points)),
                max_points: c.max_points,
                matched_terms: cs.map(|s| s.matched_terms.iter().cloned().collect()).unwrap_or_default(),
            }
        })
        .collect();
    ScoreResult {
        conversation_id: conversation_id.to_string(),
        total: categories.iter().map(|c| c.points).sum(),
        max_possible: catalog.max_total(),
        categories,
    }
}
