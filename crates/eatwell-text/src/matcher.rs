use std::collections::HashMap;

use tantivy::tokenizer::TextAnalyzer;
use tracing::debug;

use eatwell_core::types::{Category, CategoryHits, CategoryId, TermSet};
use eatwell_core::{Catalog, Error, Result};

use crate::tantivy_utils::{build_analyzer, tokenize};

/// A keyword pre-split into analyzer tokens.
#[derive(Debug, Clone)]
struct KeywordPattern {
	term: String,
	tokens: Vec<String>,
}

/// Token-boundary keyword matcher over a fixed catalog.
///
/// Keywords are tokenized once at construction. A keyword hits when its
/// token sequence appears as a contiguous run of utterance tokens, so
/// "water" never hits "underwater" while "whole grains" hits
/// "Whole-Grains". Reported terms are the catalog's normalized keywords.
#[derive(Clone)]
pub struct LexicalMatcher {
	analyzer: TextAnalyzer,
	patterns: Vec<(CategoryId, Vec<KeywordPattern>)>,
}

impl LexicalMatcher {
	/// Fails with `InvalidConfig` when two keywords analyze to the same
	/// tokens (e.g. `sıvı` and `sivi`), since one utterance token would then
	/// count twice.
	pub fn new(catalog: &Catalog) -> Result<Self> {
		let mut analyzer = build_analyzer();
		let patterns: Vec<(CategoryId, Vec<KeywordPattern>)> =
			catalog.iter().map(|c| (c.id, compile(&mut analyzer, c))).collect();
		let mut seen: HashMap<&[String], (CategoryId, &str)> = HashMap::new();
		for (id, category_patterns) in &patterns {
			for p in category_patterns {
				if let Some((prev_id, prev)) = seen.insert(p.tokens.as_slice(), (*id, p.term.as_str())) {
					return Err(Error::InvalidConfig(format!(
						"keywords '{prev}' ({prev_id}) and '{}' ({id}) match the same text",
						p.term
					)));
				}
			}
		}
		Ok(Self { analyzer, patterns })
	}

	/// Keywords of `category` found in `utterance`.
	pub fn match_category(&self, utterance: &str, category: &Category) -> TermSet {
		let mut analyzer = self.analyzer.clone();
		let tokens = tokenize(&mut analyzer, utterance);
		if tokens.is_empty() { return TermSet::new(); }
		let patterns = compile(&mut analyzer, category);
		find(&tokens, &patterns)
	}

	/// Hits for every catalog category; the utterance is tokenized once.
	pub fn match_all(&self, utterance: &str) -> CategoryHits {
		let mut analyzer = self.analyzer.clone();
		let tokens = tokenize(&mut analyzer, utterance);
		let hits: CategoryHits = self.patterns.iter().map(|(id, patterns)| (*id, find(&tokens, patterns))).collect();
		let total: usize = hits.values().map(TermSet::len).sum();
		if total > 0 { debug!(tokens = tokens.len(), hits = total, "lexical matches"); }
		hits
	}
}

fn compile(analyzer: &mut TextAnalyzer, category: &Category) -> Vec<KeywordPattern> {
	category
		.keywords
		.iter()
		.map(|kw| KeywordPattern { term: kw.clone(), tokens: tokenize(analyzer, kw) })
		.filter(|p| !p.tokens.is_empty())
		.collect()
}

fn find(tokens: &[String], patterns: &[KeywordPattern]) -> TermSet {
	let mut out = TermSet::new();
	if tokens.is_empty() { return out; }
	for p in patterns {
		if p.tokens.len() <= tokens.len() && tokens.windows(p.tokens.len()).any(|w| w == p.tokens.as_slice()) {
			out.insert(p.term.clone());
		}
	}
	out
}
