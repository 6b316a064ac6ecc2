use std::sync::Arc;
use std::time::Duration;

use eatwell_core::config::ScoringConfig;
use eatwell_core::types::{Category, CategoryId, ConversationState};
use eatwell_core::{Catalog, Error};
use eatwell_embed::StaticProvider;
use eatwell_hybrid::{ScoringEngine, ScoringWarning};

fn catalog() -> Catalog {
    Catalog::healthy_eating().expect("catalog")
}

fn engine_with(provider: Arc<StaticProvider>, config: ScoringConfig) -> ScoringEngine {
    ScoringEngine::new(catalog(), config, provider).expect("engine")
}

fn new_engine() -> (Arc<StaticProvider>, ScoringEngine) {
    let provider = Arc::new(StaticProvider::new(8));
    (provider.clone(), engine_with(provider, ScoringConfig::default()))
}

fn terms(items: &[&str]) -> Vec<String> {
    let mut v: Vec<String> = items.iter().map(|s| (*s).to_string()).collect();
    v.sort();
    v
}

#[tokio::test]
async fn fruits_and_water_example_scores_forty() {
    let (_, engine) = new_engine();
    let report = engine
        .record_turn("c1", "I eat fruits and vegetables daily. I drink 8 glasses of water.")
        .await
        .expect("turn");
    let score = report.score;
    let fv = score.category(CategoryId::FruitsVegetables).expect("fv");
    assert_eq!(fv.matched_terms, terms(&["fruits", "vegetables", "daily"]));
    assert_eq!(fv.points, 20);
    let hyd = score.category(CategoryId::Hydration).expect("hydration");
    assert_eq!(hyd.matched_terms, terms(&["drink", "water", "glasses"]));
    assert_eq!(hyd.points, 20);
    for id in [CategoryId::BalancedMeals, CategoryId::ProcessedFoods, CategoryId::MealTiming] {
        assert_eq!(score.points(id), 0, "{id}");
    }
    assert_eq!(score.total, 40);
    assert_eq!(score.max_possible, 100);
    assert!(!report.warnings.iter().any(|w| matches!(w, ScoringWarning::SemanticUnavailable(_))));
}

#[tokio::test]
async fn single_processed_food_mention_scores_eight() {
    let (_, engine) = new_engine();
    let score = engine.record_turn("c1", "I sometimes snack on chips").await.expect("turn").score;
    assert_eq!(score.points(CategoryId::ProcessedFoods), 8);
    assert_eq!(score.category(CategoryId::ProcessedFoods).expect("pf").matched_terms, terms(&["chips"]));
    assert_eq!(score.total, 8);
}

#[tokio::test]
async fn no_keywords_no_points() {
    let (_, engine) = new_engine();
    let report = engine.record_turn("c1", "Hello, how are you today?").await.expect("turn");
    assert_eq!(report.score.total, 0);
    assert!(report.score.categories.iter().all(|c| c.points == 0 && c.matched_terms.is_empty()));
    assert!(report.new_terms.values().all(|t| t.is_empty()));
}

#[tokio::test]
async fn repeating_an_utterance_is_idempotent() {
    let (_, engine) = new_engine();
    let first = engine.record_turn("c1", "Protein and whole grains at lunch").await.expect("turn");
    let second = engine.record_turn("c1", "Protein and whole grains at lunch").await.expect("turn");
    assert_eq!(first.score.categories, second.score.categories);
    assert_eq!(first.score.total, second.score.total);
    assert!(second.new_terms.values().all(|t| t.is_empty()));
    assert_eq!(engine.export_state("c1").await.expect("state").turns, 2);
}

#[tokio::test]
async fn hits_accumulate_across_turns() {
    let (_, engine) = new_engine();
    let s1 = engine.record_turn("c1", "I had breakfast").await.expect("turn").score;
    assert_eq!(s1.points(CategoryId::MealTiming), 8);
    let s2 = engine.record_turn("c1", "and a late dinner").await.expect("turn").score;
    assert_eq!(s2.points(CategoryId::MealTiming), 14);
    let s3 = engine.record_turn("c1", "lunch too, then dinner again").await.expect("turn").score;
    assert_eq!(s3.points(CategoryId::MealTiming), 20);
    let s4 = engine.record_turn("c1", "I love my metabolism").await.expect("turn").score;
    assert_eq!(s4.points(CategoryId::MealTiming), 20, "capped after three terms");
    assert_eq!(engine.get_score("c1").await, s4);
}

#[tokio::test]
async fn conversations_are_independent() {
    let (_, engine) = new_engine();
    engine.record_turn("a", "water").await.expect("turn");
    engine.record_turn("b", "salt and sugar").await.expect("turn");
    assert_eq!(engine.get_score("a").await.total, 8);
    assert_eq!(engine.get_score("b").await.total, 14);
    assert_eq!(engine.get_score("nobody").await.total, 0);
    assert_eq!(engine.conversation_count(), 2);
}

#[tokio::test]
async fn semantic_hits_extend_lexical_ones() {
    let provider = Arc::new(
        StaticProvider::new(3)
            .with_vector("I stay well hydrated with tea", vec![1.0, 0.0, 0.0])
            .with_vector("fluid", vec![0.95, 0.05, 0.0])
            .with_vector("liquid", vec![0.9, 0.1, 0.0]),
    );
    let engine = engine_with(provider, ScoringConfig::default());
    let report = engine.record_turn("c1", "I stay well hydrated with tea").await.expect("turn");
    let hyd = report.score.category(CategoryId::Hydration).expect("hydration");
    assert_eq!(hyd.matched_terms, terms(&["hydrated", "fluid", "liquid"]), "one lexical + two semantic");
    assert_eq!(hyd.points, 20);
}

#[tokio::test]
async fn lexical_and_semantic_overlap_is_not_double_counted() {
    let provider = Arc::new(StaticProvider::new(2).with_vector("water", vec![1.0, 0.0]));
    let engine = engine_with(provider, ScoringConfig::default());
    let score = engine.record_turn("c1", "water").await.expect("turn").score;
    assert_eq!(score.category(CategoryId::Hydration).expect("h").matched_terms, terms(&["water"]));
    assert_eq!(score.points(CategoryId::Hydration), 8);
}

#[tokio::test]
async fn provider_failure_degrades_to_lexical() {
    let (provider, engine) = new_engine();
    provider.set_failing(true);
    let report = engine.record_turn("c1", "salt, sugar and refined flour").await.expect("turn");
    assert!(report.is_degraded());
    assert!(matches!(report.warnings[0], ScoringWarning::SemanticUnavailable(_)));
    assert_eq!(report.score.points(CategoryId::ProcessedFoods), 20);

    let report = engine.record_turn("c2", "more water").await.expect("turn");
    assert_eq!(report.score.points(CategoryId::Hydration), 8);
    assert!(report.is_degraded());
}

#[tokio::test]
async fn slow_provider_times_out_to_lexical() {
    let provider = Arc::new(StaticProvider::new(2).with_delay(Duration::from_millis(500)));
    let config = ScoringConfig { embed_timeout_ms: 20, ..ScoringConfig::default() };
    let engine = engine_with(provider, config);
    let report = engine.record_turn("c1", "breakfast and lunch").await.expect("turn");
    assert_eq!(report.warnings, vec![ScoringWarning::SemanticTimedOut { after_ms: 20 }]);
    assert_eq!(report.score.points(CategoryId::MealTiming), 14);
}

#[tokio::test]
async fn lexical_only_engine_never_warns() {
    let engine = ScoringEngine::lexical_only(catalog(), ScoringConfig::default()).expect("engine");
    let report = engine.record_turn("c1", "omega and protein").await.expect("turn");
    assert!(report.warnings.is_empty());
    assert_eq!(report.score.points(CategoryId::BalancedMeals), 14);
    assert!(engine.cache().is_none());
    assert_eq!(engine.warm_up(16).await.expect("warm"), 0);
}

#[tokio::test]
async fn invalid_utterances_are_rejected_and_not_recorded() {
    let config = ScoringConfig { max_utterance_chars: 10, ..ScoringConfig::default() };
    let engine = ScoringEngine::lexical_only(catalog(), config).expect("engine");
    assert!(matches!(engine.record_turn("c1", "water\u{0}").await, Err(Error::InvalidUtterance(_))));
    assert!(matches!(engine.record_turn("c1", "water water water").await, Err(Error::InvalidUtterance(_))));
    assert!(matches!(engine.export_state("c1").await, Err(Error::NotFound(_))));

    let report = engine.record_turn("c1", "water\n").await.expect("newline is fine");
    assert_eq!(report.score.total, 8);
}

#[tokio::test]
async fn empty_utterance_records_a_turn_without_hits() {
    let (provider, engine) = new_engine();
    let report = engine.record_turn("c1", "").await.expect("turn");
    assert_eq!(report.score.total, 0);
    assert!(report.warnings.is_empty());
    assert_eq!(provider.calls(), 0);
    assert_eq!(engine.export_state("c1").await.expect("state").turns, 1);
}

#[tokio::test]
async fn utterance_embedding_is_cached_across_turns() {
    let (provider, engine) = new_engine();
    engine.record_turn("c1", "hello").await.expect("turn");
    let after_first = provider.calls();
    assert_eq!(after_first, 1 + engine.catalog().keyword_count());
    engine.record_turn("c2", "  HELLO ").await.expect("turn");
    assert_eq!(provider.calls(), after_first);
}

#[tokio::test]
async fn warm_up_embeds_each_keyword_once() {
    let (provider, engine) = new_engine();
    let n = engine.warm_up(16).await.expect("warm");
    assert_eq!(n, engine.catalog().keyword_count());
    assert_eq!(engine.warm_up(16).await.expect("warm again"), 0);
    engine.record_turn("c1", "hello").await.expect("turn");
    assert_eq!(provider.calls(), n + 1, "only the utterance is new");
}

#[tokio::test]
async fn cancelled_turn_commits_nothing() {
    let provider = Arc::new(StaticProvider::new(2).with_delay(Duration::from_secs(5)));
    let config = ScoringConfig { embed_timeout_ms: 10_000, ..ScoringConfig::default() };
    let engine = engine_with(provider, config);

    let cancelled = tokio::time::timeout(Duration::from_millis(50), engine.record_turn("c1", "salt sugar chips")).await;
    assert!(cancelled.is_err(), "caller gave up");
    let state = engine.export_state("c1").await.expect("slot exists");
    assert_eq!(state.turns, 0);
    assert_eq!(engine.get_score("c1").await.total, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_turns_on_one_conversation_are_serialized() {
    let (_, engine) = new_engine();
    let engine = Arc::new(engine);
    let utterances = ["water", "salt", "breakfast", "protein", "apple", "sugar", "lunch", "fat"];
    let tasks: Vec<_> = utterances
        .iter()
        .map(|u| {
            let engine = engine.clone();
            let u = (*u).to_string();
            tokio::spawn(async move { engine.record_turn("shared", &u).await })
        })
        .collect();
    for t in tasks { t.await.expect("join").expect("turn"); }
    let state = engine.export_state("shared").await.expect("state");
    assert_eq!(state.turns, utterances.len() as u64);
    let score = engine.get_score("shared").await;
    assert_eq!(score.points(CategoryId::ProcessedFoods), 14);
    assert_eq!(score.points(CategoryId::MealTiming), 14);
    assert_eq!(score.points(CategoryId::BalancedMeals), 14);
    assert_eq!(score.total, 8 + 8 + 14 + 14 + 14);
}

#[tokio::test]
async fn export_import_round_trip() -> anyhow::Result<()> {
    let (_, engine) = new_engine();
    engine.record_turn("c1", "I drink water and eat salad at lunch").await?;
    let exported = engine.export_state("c1").await?;
    let json = serde_json::to_string(&exported)?;

    let (_, restored) = new_engine();
    let state: ConversationState = serde_json::from_str(&json)?;
    restored.import_state("c9", state).await?;
    let a = engine.get_score("c1").await;
    let b = restored.get_score("c9").await;
    assert_eq!(a.categories, b.categories);
    assert_eq!(a.total, b.total);
    Ok(())
}

#[tokio::test]
async fn import_recomputes_points_and_rejects_foreign_terms() {
    let (_, engine) = new_engine();
    let mut state = ConversationState::default();
    if let Some(h) = state.categories.get_mut(&CategoryId::Hydration) {
        h.matched_terms.insert("water".into());
        h.points = 20;
    }
    engine.import_state("c1", state.clone()).await.expect("import");
    assert_eq!(engine.get_score("c1").await.points(CategoryId::Hydration), 8);

    if let Some(h) = state.categories.get_mut(&CategoryId::Hydration) {
        h.matched_terms.insert("salt".into());
    }
    assert!(matches!(engine.import_state("c1", state).await, Err(Error::InvalidState(_))));
    assert_eq!(engine.get_score("c1").await.points(CategoryId::Hydration), 8, "failed import changes nothing");
}

#[tokio::test]
async fn reset_clears_a_conversation() {
    let (_, engine) = new_engine();
    engine.record_turn("c1", "water").await.expect("turn");
    assert!(engine.reset("c1").await);
    assert_eq!(engine.get_score("c1").await.total, 0);
    assert!(!engine.reset("unknown").await);
}

#[tokio::test]
async fn custom_curve_and_threshold_are_honoured() {
    let provider = Arc::new(StaticProvider::new(8));
    let config = ScoringConfig { tier_percents: vec![50, 100], ..ScoringConfig::default() };
    let engine = engine_with(provider, config);
    let score = engine.record_turn("c1", "water").await.expect("turn").score;
    assert_eq!(score.points(CategoryId::Hydration), 10);

    let bad = ScoringConfig { similarity_threshold: 2.0, ..ScoringConfig::default() };
    assert!(ScoringEngine::lexical_only(catalog(), bad).is_err());
}

#[test]
fn catalog_with_keywords_equal_after_folding_is_rejected_at_startup() {
    let mut categories: Vec<Category> = catalog().categories().to_vec();
    categories[CategoryId::BalancedMeals.ordinal()].keywords.push("sivi".into());
    let folded_twin = Catalog::new(categories).expect("distinct as written");
    let res = ScoringEngine::lexical_only(folded_twin, ScoringConfig::default());
    assert!(matches!(res, Err(Error::InvalidConfig(_))));
}
