//! Dice expression evaluation.
//!
//! Supports sums of dice and flat modifiers like `2d6+1d4+3`, `d20-1` or
//! `4D6 - 2`. Whitespace is ignored and the `d` is case-insensitive.

use std::{fmt, sync::LazyLock};

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on dice rolled by a single term.
pub const MAX_DICE_PER_TERM: u32 = 1000;

static TERM_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"([+-]?)(?:(\d*)d(\d+)|(\d+))").expect("dice term regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
	#[error("empty dice expression")]
	Empty,
	#[error("no dice or modifiers found in '{0}'")]
	NoTerms(String),
	#[error("unexpected '{0}' in dice expression")]
	InvalidTerm(String),
	#[error("dice count must be at least 1")]
	ZeroDice,
	#[error("a die needs at least 1 face")]
	ZeroFaces,
	#[error("at most {MAX_DICE_PER_TERM} dice per term")]
	TooManyDice,
	#[error("number too large: {0}")]
	Overflow(String),
}

/// One signed term of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Term {
	Dice { negative: bool, count: u32, faces: u32 },
	Modifier(i64),
}

impl fmt::Display for Term {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match *self {
			Term::Dice { negative, count, faces } => {
				write!(f, "{}{count}d{faces}", if negative { "-" } else { "" })
			}
			Term::Modifier(v) => write!(f, "{v}"),
		}
	}
}

/// Parse an expression into its terms without rolling.
pub fn parse_expression(expr: &str) -> Result<Vec<Term>, DiceError> {
	let cleaned: String = expr
		.chars()
		.filter(|c| !c.is_whitespace())
		.collect::<String>()
		.to_lowercase();
	if cleaned.is_empty() {
		return Err(DiceError::Empty);
	}

	let mut terms = Vec::new();
	let mut cursor = 0;
	for caps in TERM_RE.captures_iter(&cleaned) {
		let Some(whole) = caps.get(0) else { continue };
		if whole.start() != cursor {
			return Err(DiceError::InvalidTerm(cleaned[cursor..whole.start()].to_string()));
		}
		// Every term after the first needs an explicit sign.
		if !terms.is_empty() && caps[1].is_empty() {
			return Err(DiceError::InvalidTerm(whole.as_str().to_string()));
		}
		cursor = whole.end();

		let negative = &caps[1] == "-";
		if let Some(faces) = caps.get(3) {
			let count = match caps.get(2).map(|m| m.as_str()).filter(|s| !s.is_empty()) {
				Some(c) => c.parse::<u32>().map_err(|_| DiceError::Overflow(c.to_string()))?,
				None => 1,
			};
			let faces = faces
				.as_str()
				.parse::<u32>()
				.map_err(|_| DiceError::Overflow(faces.as_str().to_string()))?;
			if count == 0 {
				return Err(DiceError::ZeroDice);
			}
			if faces == 0 {
				return Err(DiceError::ZeroFaces);
			}
			if count > MAX_DICE_PER_TERM {
				return Err(DiceError::TooManyDice);
			}
			terms.push(Term::Dice { negative, count, faces });
		} else if let Some(value) = caps.get(4) {
			let value = value
				.as_str()
				.parse::<i64>()
				.map_err(|_| DiceError::Overflow(value.as_str().to_string()))?;
			terms.push(Term::Modifier(if negative { -value } else { value }));
		}
	}

	if terms.is_empty() {
		return Err(DiceError::NoTerms(expr.trim().to_string()));
	}
	if cursor != cleaned.len() {
		return Err(DiceError::InvalidTerm(cleaned[cursor..].to_string()));
	}
	Ok(terms)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermRoll {
	pub term: Term,
	/// Individual die results (empty for modifiers).
	pub rolls: Vec<u32>,
	/// Signed contribution to the total.
	pub subtotal: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roll {
	pub expression: String,
	pub terms: Vec<TermRoll>,
	pub total: i64,
}

impl Roll {
	/// Human readable breakdown, e.g. `2d6[3, 5] + 3 = 11`.
	pub fn breakdown(&self) -> String {
		let mut out = String::new();
		for (i, t) in self.terms.iter().enumerate() {
			let (negative, body) = match t.term {
				Term::Dice { negative, count, faces } => {
					let rolls = t.rolls.iter().map(u32::to_string).collect::<Vec<_>>().join(", ");
					(negative, format!("{count}d{faces}[{rolls}]"))
				}
				Term::Modifier(v) => (v < 0, v.unsigned_abs().to_string()),
			};
			match (i, negative) {
				(0, false) => {}
				(0, true) => out.push('-'),
				(_, false) => out.push_str(" + "),
				(_, true) => out.push_str(" - "),
			}
			out.push_str(&body);
		}
		format!("{out} = {}", self.total)
	}
}

/// Roll parsed terms. Fails with [`DiceError::Overflow`] when the total does
/// not fit in an `i64`.
pub fn roll_terms(expression: &str, terms: &[Term], rng: &mut impl Rng) -> Result<Roll, DiceError> {
	let terms = terms
		.iter()
		.map(|&term| match term {
			Term::Dice { negative, count, faces } => {
				let rolls = (0..count).map(|_| rng.gen_range(1..=faces)).collect::<Vec<_>>();
				let sum = rolls.iter().map(|&r| r as i64).sum::<i64>();
				TermRoll { term, rolls, subtotal: if negative { -sum } else { sum } }
			}
			Term::Modifier(v) => TermRoll { term, rolls: Vec::new(), subtotal: v },
		})
		.collect::<Vec<_>>();
	let total = terms
		.iter()
		.try_fold(0i64, |acc, t| acc.checked_add(t.subtotal))
		.ok_or_else(|| DiceError::Overflow(expression.trim().to_string()))?;
	Ok(Roll { expression: expression.trim().to_string(), terms, total })
}

pub fn roll_expression(expr: &str, rng: &mut impl Rng) -> Result<Roll, DiceError> {
	let terms = parse_expression(expr)?;
	roll_terms(expr, &terms, rng)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollMode {
	#[default]
	Normal,
	Advantage,
	Disadvantage,
}

impl fmt::Display for RollMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RollMode::Normal => write!(f, "Normal"),
			RollMode::Advantage => write!(f, "Advantage"),
			RollMode::Disadvantage => write!(f, "Disadvantage"),
		}
	}
}

/// Result of a roll, with the discarded roll kept for advantage/disadvantage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeRoll {
	pub mode: RollMode,
	pub chosen: Roll,
	pub other: Option<Roll>,
}

impl ModeRoll {
	pub fn total(&self) -> i64 {
		self.chosen.total
	}

	/// One-line history entry.
	pub fn describe(&self) -> String {
		match &self.other {
			None => format!("{}: {}", self.chosen.expression, self.chosen.breakdown()),
			Some(other) => format!(
				"{} ({}): {} | {} -> {}",
				self.chosen.expression,
				self.mode,
				self.chosen.breakdown(),
				other.breakdown(),
				self.chosen.total,
			),
		}
	}
}

pub fn roll_with_mode(expr: &str, mode: RollMode, rng: &mut impl Rng) -> Result<ModeRoll, DiceError> {
	let terms = parse_expression(expr)?;
	let first = roll_terms(expr, &terms, rng)?;
	if mode == RollMode::Normal {
		return Ok(ModeRoll { mode, chosen: first, other: None });
	}

	let second = roll_terms(expr, &terms, rng)?;
	let first_wins = match mode {
		RollMode::Advantage => first.total >= second.total,
		_ => first.total <= second.total,
	};
	let (chosen, other) = if first_wins { (first, second) } else { (second, first) };
	Ok(ModeRoll { mode, chosen, other: Some(other) })
}

/// Rolling history shown by the dice panel. Newest entry first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
	pub entries: Vec<String>,
}

impl History {
	pub fn push(&mut self, result: &Result<ModeRoll, DiceError>, limit: usize) {
		let line = match result {
			Ok(roll) => roll.describe(),
			Err(err) => format!("Error: {err}"),
		};
		self.entries.insert(0, line);
		self.entries.truncate(limit.max(1));
	}
}
