use std::borrow::Cow;

use tantivy::tokenizer::{AsciiFoldingFilter, LowerCaser, SimpleTokenizer, TextAnalyzer, TokenStream};

const DOTTED_CAPITAL_I: char = '\u{130}';
const COMBINING_DOT_ABOVE: char = '\u{307}';

/// Splits on non-alphanumerics, lowercases, and folds diacritics
/// ("Ispanak", "ıspanak" and "ISPANAK" all become `ispanak`).
pub fn build_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(AsciiFoldingFilter)
		.build()
}

/// Maps `İ` to `I` and drops a combining dot above.
///
/// Unicode lowercases `İ` to `i` + U+0307, which ASCII folding keeps, so
/// "İçmek" would never equal "içmek".
fn fold_dotted_i(text: &str) -> Cow<'_, str> {
	if !text.contains(&[DOTTED_CAPITAL_I, COMBINING_DOT_ABOVE][..]) {
		return Cow::Borrowed(text);
	}
	Cow::Owned(
		text.chars()
			.filter(|c| *c != COMBINING_DOT_ABOVE)
			.map(|c| if c == DOTTED_CAPITAL_I { 'I' } else { c })
			.collect(),
	)
}

pub fn tokenize(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
	let text = fold_dotted_i(text);
	let mut stream = analyzer.token_stream(&text);
	let mut tokens = Vec::new();
	while stream.advance() { tokens.push(stream.token().text.clone()); }
	tokens
}
