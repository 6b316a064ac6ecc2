use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{normalize_text, Category, CategoryId};

/// Upper bound for a category's `max_points`; keeps totals and percentages in `u32`.
pub const MAX_CATEGORY_POINTS: u32 = 1_000_000;

/// The immutable set of five scored categories.
///
/// Built once at startup and injected into the matchers and the engine.
/// Keywords are stored normalized (see `normalize_text`).
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    categories: Vec<Category>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        if categories.len() != CategoryId::ALL.len() {
            return Err(Error::InvalidConfig(format!(
                "catalog must define exactly {} categories, got {}",
                CategoryId::ALL.len(),
                categories.len()
            )));
        }
        let mut slots: Vec<Option<Category>> = vec![None; CategoryId::ALL.len()];
        let mut owner: HashMap<String, CategoryId> = HashMap::new();
        for mut category in categories {
            let id = category.id;
            if slots[id.ordinal()].is_some() {
                return Err(Error::InvalidConfig(format!("category '{id}' defined twice")));
            }
            if category.max_points == 0 || category.max_points > MAX_CATEGORY_POINTS {
                return Err(Error::InvalidConfig(format!(
                    "category '{id}' has max_points = {}, expected 1..={MAX_CATEGORY_POINTS}",
                    category.max_points
                )));
            }
            if category.keywords.is_empty() {
                return Err(Error::InvalidConfig(format!("category '{id}' has no keywords")));
            }
            let mut normalized = Vec::with_capacity(category.keywords.len());
            for raw in &category.keywords {
                let kw = normalize_text(raw);
                if kw.is_empty() {
                    return Err(Error::InvalidConfig(format!("category '{id}' has an empty keyword")));
                }
                if let Some(prev) = owner.insert(kw.clone(), id) {
                    return Err(Error::InvalidConfig(format!("keyword '{kw}' appears in both '{prev}' and '{id}'")));
                }
                normalized.push(kw);
            }
            category.keywords = normalized;
            if category.name.trim().is_empty() {
                category.name = id.display_name().to_string();
            }
            slots[id.ordinal()] = Some(category);
        }
        // Length and uniqueness checks above guarantee every slot is filled.
        let categories = slots.into_iter().flatten().collect();
        Ok(Self { categories })
    }

    /// The built-in healthy-eating taxonomy (English + Turkish keywords).
    pub fn healthy_eating() -> Result<Self> {
        Self::new(builtin_categories())
    }

    /// All categories in `CategoryId::ALL` order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn get(&self, id: CategoryId) -> &Category {
        &self.categories[id.ordinal()]
    }

    pub fn max_total(&self) -> u32 {
        self.categories.iter().map(|c| c.max_points).sum()
    }

    pub fn keyword_count(&self) -> usize {
        self.categories.iter().map(|c| c.keywords.len()).sum()
    }

    /// Every keyword of every category, in catalog order.
    pub fn all_keywords(&self) -> Vec<String> {
        self.categories.iter().flat_map(|c| c.keywords.iter().cloned()).collect()
    }
}

fn category(id: CategoryId, description: &str, keywords: &[&str]) -> Category {
    Category {
        id,
        name: id.display_name().to_string(),
        description: description.to_string(),
        keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        max_points: 20,
    }
}

fn builtin_categories() -> Vec<Category> {
    vec![
        category(
            CategoryId::FruitsVegetables,
            "Daily intake, variety, and nutritional benefits",
            &[
                "fruit", "fruits", "vegetable", "vegetables", "meyve", "sebze",
                "vitamin", "vitamins", "daily", "daily intake", "günlük tüketim",
                "apple", "elma", "banana", "muz", "orange", "portakal",
                "broccoli", "brokoli", "spinach", "ıspanak", "carrot", "havuç",
                "salad", "salata", "greens", "yeşillik", "fiber", "lif",
                "antioxidant", "antioksidan", "nutritional", "besin değeri",
            ],
        ),
        category(
            CategoryId::Hydration,
            "Importance of drinking enough water throughout the day",
            &[
                "water", "su", "hydration", "hidrasyon", "drink", "içmek",
                "fluid", "sıvı", "daily water", "günlük su",
                "glasses", "8 bardak", "dehydration", "susuzluk",
                "thirst", "susama", "liquid", "sıvı tüketimi",
                "hydrated", "water intake", "su tüketimi",
            ],
        ),
        category(
            CategoryId::BalancedMeals,
            "Combining proteins, carbs, and fats in proper proportions",
            &[
                "protein", "proteins", "carb", "carbs", "carbohydrate", "karbonhidrat",
                "fat", "fats", "yağ", "balanced", "dengeli", "proportion", "oran",
                "macros", "macronutrients", "makro besin", "meal plan", "öğün planı",
                "portion", "porsiyon", "healthy fats", "sağlıklı yağlar",
                "whole grains", "tam tahıl", "lean protein", "yağsız protein",
                "omega", "complex carbs", "kompleks karbonhidrat",
            ],
        ),
        category(
            CategoryId::ProcessedFoods,
            "Awareness of additives, sugar, salt, and unhealthy fats",
            &[
                "processed", "işlenmiş", "additive", "katkı maddesi",
                "sugar", "şeker", "salt", "tuz", "unhealthy fat", "sağlıksız yağ",
                "junk food", "abur cubur", "fast food", "chips", "cips", "soda",
                "preservative", "koruyucu", "artificial", "yapay", "refined", "rafine",
                "trans fat", "trans yağ", "saturated", "doymuş yağ",
                "packaged", "paketli", "label", "etiket", "ingredients", "içindekiler",
            ],
        ),
        category(
            CategoryId::MealTiming,
            "Regular eating patterns and avoiding long gaps without food",
            &[
                "meal timing", "öğün zamanı", "breakfast", "kahvaltı",
                "lunch", "öğle yemeği", "dinner", "akşam yemeği",
                "snacking", "ara öğün", "regular", "düzenli",
                "schedule", "program", "interval", "aralık",
                "skip meals", "öğün atlamak", "eating pattern", "yeme düzeni",
                "metabolism", "metabolizma", "blood sugar", "kan şekeri",
                "fasting", "açlık", "meal frequency", "öğün sıklığı",
            ],
        ),
    ]
}
