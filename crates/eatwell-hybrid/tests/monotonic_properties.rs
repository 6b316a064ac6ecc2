use std::sync::Arc;

use eatwell_core::config::ScoringConfig;
use eatwell_core::Catalog;
use eatwell_embed::HashingProvider;
use eatwell_hybrid::ScoringEngine;
use proptest::prelude::*;

const WORDS: &[&str] = &[
    "water", "salt", "sugar", "breakfast", "lunch", "protein", "apple", "chips",
    "fruits", "the", "and", "I", "love", "my", "dinner", "omega", "su", "meyve", "whole grains",
];

fn utterance() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 0..8).prop_map(|w| w.join(" "))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn scores_never_decrease(turns in prop::collection::vec(utterance(), 1..6)) {
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        let catalog = Catalog::healthy_eating().expect("catalog");
        let engine = ScoringEngine::new(catalog, ScoringConfig::default(), Arc::new(HashingProvider::new(256)))
            .expect("engine");
        let mut previous = rt.block_on(engine.get_score("p"));
        for text in &turns {
            let score = rt.block_on(engine.record_turn("p", text)).expect("turn").score;
            prop_assert!(score.total >= previous.total);
            prop_assert!(score.total <= score.max_possible);
            for (now, before) in score.categories.iter().zip(&previous.categories) {
                prop_assert!(now.points >= before.points, "{} dropped", now.id);
                prop_assert!(now.points <= now.max_points);
                prop_assert!(before.matched_terms.iter().all(|t| now.matched_terms.contains(t)));
            }
            previous = score;
        }
    }

    #[test]
    fn replaying_a_turn_changes_nothing(text in utterance()) {
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        let engine = ScoringEngine::lexical_only(Catalog::healthy_eating().expect("catalog"), ScoringConfig::default())
            .expect("engine");
        let first = rt.block_on(engine.record_turn("p", &text)).expect("turn").score;
        let again = rt.block_on(engine.record_turn("p", &text)).expect("turn").score;
        prop_assert_eq!(first.categories, again.categories);
    }
}
