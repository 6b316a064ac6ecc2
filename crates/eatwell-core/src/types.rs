//! Domain types shared by the matchers and the aggregator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Embedding of a text span. Shared read-only once computed.
pub type EmbeddingVector = Arc<[f32]>;

/// Deduplicated, ordered set of normalized matched terms.
pub type TermSet = BTreeSet<String>;

/// Matched terms per category for one matcher run.
pub type CategoryHits = BTreeMap<CategoryId, TermSet>;

/// Lowercase, trim, and collapse inner whitespace.
///
/// Applied identically to catalog keywords, cache keys and matched terms so
/// that `"  Daily   Water "` and `"daily water"` are the same key.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One of the five healthy-eating topics, in fixed catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    FruitsVegetables,
    Hydration,
    BalancedMeals,
    ProcessedFoods,
    MealTiming,
}

impl CategoryId {
    pub const ALL: [CategoryId; 5] = [
        CategoryId::FruitsVegetables,
        CategoryId::Hydration,
        CategoryId::BalancedMeals,
        CategoryId::ProcessedFoods,
        CategoryId::MealTiming,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CategoryId::FruitsVegetables => "fruits_vegetables",
            CategoryId::Hydration => "hydration",
            CategoryId::BalancedMeals => "balanced_meals",
            CategoryId::ProcessedFoods => "processed_foods",
            CategoryId::MealTiming => "meal_timing",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CategoryId::FruitsVegetables => "Fruits & Vegetables",
            CategoryId::Hydration => "Hydration",
            CategoryId::BalancedMeals => "Balanced Meals",
            CategoryId::ProcessedFoods => "Processed Foods",
            CategoryId::MealTiming => "Meal Timing",
        }
    }

    /// Position in `ALL`.
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A scored topic with its literal keyword set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub keywords: Vec<String>,
    #[serde(default = "default_max_points")]
    pub max_points: u32,
}

fn default_max_points() -> u32 {
    20
}

/// Step function from distinct-term count to a share of `max_points`.
///
/// `tier_percents[i]` applies to `i + 1` matches; counts past the last tier
/// stay on the last tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointCurve {
    tier_percents: Vec<u32>,
}

impl Default for PointCurve {
    fn default() -> Self {
        Self { tier_percents: vec![40, 70, 100] }
    }
}

impl PointCurve {
    pub fn new(tier_percents: Vec<u32>) -> crate::Result<Self> {
        if tier_percents.is_empty() {
            return Err(crate::Error::InvalidConfig("point curve needs at least one tier".into()));
        }
        if tier_percents.iter().any(|&p| p > 100) {
            return Err(crate::Error::InvalidConfig(format!("tier percents must be <= 100: {tier_percents:?}")));
        }
        if tier_percents.windows(2).any(|w| w[0] > w[1]) {
            return Err(crate::Error::InvalidConfig(format!("tier percents must be non-decreasing: {tier_percents:?}")));
        }
        Ok(Self { tier_percents })
    }

    pub fn tiers(&self) -> &[u32] {
        &self.tier_percents
    }

    pub fn points(&self, matches: usize, max_points: u32) -> u32 {
        if matches == 0 {
            return 0;
        }
        let tier = matches.min(self.tier_percents.len()) - 1;
        let points = u64::from(max_points) * u64::from(self.tier_percents[tier]) / 100;
        u32::try_from(points).unwrap_or(max_points)
    }
}

/// Cumulative hits for one category within one conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScoreState {
    pub matched_terms: TermSet,
    pub points: u32,
}

impl CategoryScoreState {
    /// Re-derive `points` from the term count; never patched incrementally.
    pub fn recompute(&mut self, curve: &PointCurve, max_points: u32) {
        self.points = curve.points(self.matched_terms.len(), max_points);
    }
}

/// Everything the core remembers about one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub categories: BTreeMap<CategoryId, CategoryScoreState>,
    pub turns: u64,
    pub updated_at: DateTime<Utc>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            categories: CategoryId::ALL.iter().map(|&id| (id, CategoryScoreState::default())).collect(),
            turns: 0,
            updated_at: Utc::now(),
        }
    }
}

impl ConversationState {
    pub fn category(&self, id: CategoryId) -> Option<&CategoryScoreState> {
        self.categories.get(&id)
    }
}

/// Per-category line of a `ScoreResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub id: CategoryId,
    pub name: String,
    pub points: u32,
    pub max_points: u32,
    pub matched_terms: Vec<String>,
}

/// Snapshot of a conversation's score, built on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub conversation_id: String,
    pub total: u32,
    pub max_possible: u32,
    pub categories: Vec<CategoryScore>,
}

impl ScoreResult {
    pub fn category(&self, id: CategoryId) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn points(&self, id: CategoryId) -> u32 {
        self.category(id).map_or(0, |c| c.points)
    }

    /// Level on a 0–100 scale, independent of the catalog's max.
    pub fn level(&self) -> ScoreLevel {
        if self.max_possible == 0 {
            return ScoreLevel::from_percent(0);
        }
        let pct = u64::from(self.total) * 100 / u64::from(self.max_possible);
        ScoreLevel::from_percent(u32::try_from(pct).unwrap_or(u32::MAX))
    }

    /// Categories below half of their maximum.
    pub fn weak_categories(&self) -> Vec<&CategoryScore> {
        self.categories.iter().filter(|c| c.points * 2 < c.max_points).collect()
    }

    pub fn summary(&self) -> String {
        let level = self.level();
        let mut out = format!("Level: {} ({}/{})\n{}", level, self.total, self.max_possible, level.message());
        let weak: Vec<&str> = self.weak_categories().iter().map(|c| c.name.as_str()).collect();
        if !weak.is_empty() {
            out.push_str("\nAreas to explore: ");
            out.push_str(&weak.join(", "));
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreLevel {
    Excellent,
    Good,
    Fair,
    Basic,
    NeedsImprovement,
}

impl ScoreLevel {
    pub fn from_percent(pct: u32) -> Self {
        match pct {
            80.. => ScoreLevel::Excellent,
            60..=79 => ScoreLevel::Good,
            40..=59 => ScoreLevel::Fair,
            20..=39 => ScoreLevel::Basic,
            _ => ScoreLevel::NeedsImprovement,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ScoreLevel::Excellent => "You have demonstrated comprehensive knowledge about healthy eating!",
            ScoreLevel::Good => "You have a solid understanding of healthy eating principles.",
            ScoreLevel::Fair => "You show some awareness of healthy eating, but there's room for improvement.",
            ScoreLevel::Basic => "You have touched on a few aspects of healthy eating.",
            ScoreLevel::NeedsImprovement => "Consider exploring more topics related to healthy eating.",
        }
    }
}

impl fmt::Display for ScoreLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScoreLevel::Excellent => "Excellent",
            ScoreLevel::Good => "Good",
            ScoreLevel::Fair => "Fair",
            ScoreLevel::Basic => "Basic",
            ScoreLevel::NeedsImprovement => "Needs Improvement",
        };
        f.write_str(s)
    }
}
