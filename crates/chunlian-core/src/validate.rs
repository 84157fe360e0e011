//! Hard constraints on generated text.
//!
//! Everything here is pure and deterministic. Characters are counted as
//! Unicode scalar values, so `"春回大地"` has four. Surrounding whitespace is
//! not part of a line.

use serde::{Deserialize, Serialize};

/// Pass/fail verdict with an operator-facing reason on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidationOutcome {
    pub fn pass() -> Self {
        Self {
            passed: true,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: Some(reason.into()),
        }
    }

    /// Reason text, or an empty string for a passing outcome.
    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or_default()
    }
}

pub fn char_count(text: &str) -> usize {
    text.trim().chars().count()
}

/// `text` must have exactly `expected` characters.
pub fn validate_line_length(text: &str, expected: usize) -> ValidationOutcome {
    let actual = char_count(text);
    if actual == expected {
        ValidationOutcome::pass()
    } else {
        ValidationOutcome::fail(format!(
            "\"{}\" has {actual} characters, expected {expected}",
            text.trim()
        ))
    }
}

/// Exactly `expected_count` banners of `expected_chars_each` characters.
pub fn validate_banner_set(
    banners: &[String],
    expected_count: usize,
    expected_chars_each: usize,
) -> ValidationOutcome {
    if banners.len() != expected_count {
        return ValidationOutcome::fail(format!(
            "expected {expected_count} banners, got {}: [{}]",
            banners.len(),
            banners.join(", ")
        ));
    }

    let offending: Vec<String> = banners
        .iter()
        .filter(|b| char_count(b) != expected_chars_each)
        .map(|b| format!("\"{}\" ({})", b.trim(), char_count(b)))
        .collect();

    if offending.is_empty() {
        ValidationOutcome::pass()
    } else {
        ValidationOutcome::fail(format!(
            "banners must have {expected_chars_each} characters each, offending: {}",
            offending.join(", ")
        ))
    }
}
