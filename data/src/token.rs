//! Token resolution for template generators.
//!
//! A pattern such as `"{Prefix}{Suffix} the {Title}"` is filled by drawing a
//! random item from the generator each token is mapped to. Tokens that cannot
//! be resolved are left in the output untouched.

use std::{collections::BTreeSet, sync::LazyLock};

use rand::{Rng, seq::SliceRandom};
use regex::{Captures, Regex};

use crate::generator::{Generator, Template};

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("token regex"));

/// Distinct tokens of a pattern in order of first appearance.
pub fn tokens_in(pattern: &str) -> Vec<String> {
	let mut seen = BTreeSet::new();
	TOKEN_RE
		.captures_iter(pattern)
		.filter_map(|c| c.get(1))
		.map(|m| m.as_str().to_string())
		.filter(|t| seen.insert(t.clone()))
		.collect()
}

/// Distinct tokens over all patterns of a template.
pub fn all_tokens(template: &Template) -> Vec<String> {
	let mut seen = BTreeSet::new();
	template.patterns
		.iter()
		.flat_map(|p| tokens_in(p))
		.filter(|t| seen.insert(t.clone()))
		.collect()
}

/// Tokens that have no mapping in the mode the template is using.
pub fn unmapped_tokens(template: &Template) -> Vec<String> {
	all_tokens(template)
		.into_iter()
		.filter(|t| {
			let simple = template.token_map.get(t).is_some_and(|id| !id.is_empty());
			let multi = template.multi_token_map.get(t).is_some_and(|ids| !ids.is_empty());
			if template.advanced_mode { !(simple || multi) } else { !simple }
		})
		.collect()
}

/// Pick the source generator id for one token occurrence.
fn source_id<'a>(template: &'a Template, token: &str, rng: &mut impl Rng) -> Option<&'a str> {
	if template.advanced_mode {
		if let Some(id) = template.multi_token_map.get(token).and_then(|ids| ids.choose(rng)) {
			return Some(id.as_str());
		}
	}
	template.token_map.get(token).map(String::as_str)
}

/// Fill a random pattern of the template. An empty template yields `""`.
pub fn resolve(template: &Template, generators: &[Generator], rng: &mut impl Rng) -> String {
	let Some(pattern) = template.patterns.choose(rng) else {
		return String::new();
	};
	fill(pattern, template, generators, rng)
}

/// Substitute every token of `pattern`, drawing independently per occurrence.
pub fn fill(pattern: &str, template: &Template, generators: &[Generator], rng: &mut impl Rng) -> String {
	TOKEN_RE
		.replace_all(pattern, |caps: &Captures| {
			let literal = caps[0].to_string();
			let Some(id) = source_id(template, &caps[1], rng) else {
				return literal;
			};
			let Some(source) = generators.iter().find(|g| g.id == id) else {
				tracing::debug!(token = &caps[1], id, "token source generator missing");
				return literal;
			};
			source
				.source_items()
				.choose(rng)
				.map(|item| item.to_string())
				.unwrap_or(literal)
		})
		.into_owned()
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeMap;

	use rand::{SeedableRng, rngs::StdRng};

	use super::*;
	use crate::generator::{GeneratorKind, LexiconEntry};

	fn list(id: &str, items: &[&str]) -> Generator {
		Generator {
			id: id.into(),
			folder: String::new(),
			name: id.into(),
			kind: GeneratorKind::List(items.iter().map(|s| s.to_string()).collect()),
		}
	}

	fn simple(patterns: &[&str], map: &[(&str, &str)]) -> Template {
		Template {
			patterns: patterns.iter().map(|s| s.to_string()).collect(),
			token_map: map.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
			..Default::default()
		}
	}

	#[test]
	fn single_item_sources_always_give_the_same_text() {
		let generators = vec![list("a", &["x"]), list("b", &["y"])];
		let template = simple(&["{A}{B}"], &[("A", "a"), ("B", "b")]);
		let mut rng = StdRng::seed_from_u64(1);

		for _ in 0..20 {
			assert_eq!(resolve(&template, &generators, &mut rng), "xy");
		}
	}

	#[test]
	fn unresolvable_tokens_stay_literal() {
		let generators = vec![list("a", &["x"]), list("empty", &[])];
		let template = simple(&["{A}-{Gone}-{Empty}-{Unmapped}"], &[("A", "a"), ("Gone", "deleted"), ("Empty", "empty")]);
		let mut rng = StdRng::seed_from_u64(2);

		assert_eq!(resolve(&template, &generators, &mut rng), "x-{Gone}-{Empty}-{Unmapped}");
	}

	#[test]
	fn advanced_mode_picks_among_candidates() {
		let generators = vec![list("a", &["x"]), list("b", &["y"])];
		let template = Template {
			patterns: vec!["{T}".into()],
			multi_token_map: BTreeMap::from([("T".into(), vec!["a".into(), "b".into()])]),
			advanced_mode: true,
			..Default::default()
		};
		let mut rng = StdRng::seed_from_u64(3);

		let seen = (0..200).map(|_| resolve(&template, &generators, &mut rng)).collect::<BTreeSet<_>>();
		assert_eq!(seen, BTreeSet::from(["x".to_string(), "y".to_string()]));
	}

	#[test]
	fn advanced_mode_falls_back_to_simple_map() {
		let generators = vec![list("a", &["x"])];
		let mut template = simple(&["{T}"], &[("T", "a")]);
		template.advanced_mode = true;
		let mut rng = StdRng::seed_from_u64(4);

		assert_eq!(resolve(&template, &generators, &mut rng), "x");
		assert!(unmapped_tokens(&template).is_empty());
	}

	#[test]
	fn lexicon_sources_contribute_their_words() {
		let lexicon = Generator {
			id: "lex".into(),
			folder: String::new(),
			name: "lex".into(),
			kind: GeneratorKind::Lexicon(vec![LexiconEntry { english: "moon".into(), valathi: "ilun".into() }]),
		};
		let template = simple(&["{W}dor"], &[("W", "lex")]);
		let mut rng = StdRng::seed_from_u64(5);

		assert_eq!(resolve(&template, &[lexicon], &mut rng), "ilundor");
	}

	#[test]
	fn templates_do_not_recurse() {
		let inner = Generator {
			id: "inner".into(),
			folder: String::new(),
			name: "inner".into(),
			kind: GeneratorKind::Advanced(simple(&["nested"], &[])),
		};
		let template = simple(&["{I}"], &[("I", "inner")]);
		let mut rng = StdRng::seed_from_u64(6);

		assert_eq!(resolve(&template, &[inner], &mut rng), "{I}");
	}

	#[test]
	fn empty_template_is_empty_string() {
		let mut rng = StdRng::seed_from_u64(7);
		assert_eq!(resolve(&Template::default(), &[], &mut rng), "");
	}

	#[test]
	fn token_listing() {
		assert_eq!(tokens_in("{A} of {B} and {A}"), vec!["A", "B"]);
		let template = simple(&["{A}{B}", "{C}"], &[("A", "a")]);
		assert_eq!(all_tokens(&template), vec!["A", "B", "C"]);
		assert_eq!(unmapped_tokens(&template), vec!["B", "C"]);
	}
}
