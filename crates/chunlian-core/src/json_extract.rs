//! Pull a JSON object out of a raw completion.
//!
//! Models are asked for bare JSON but regularly wrap it in markdown fences or
//! chat around it. [`parse_json`] walks an ordered list of extraction
//! strategies, each a pure `&str -> Option<&str>` returning a candidate span;
//! the first span that deserializes into `T` wins.
//!
//! ```rust
//! use chunlian_core::json_extract::parse_json;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Upper { #[serde(rename = "upperCouplet")] upper: String }
//!
//! let raw = "好的，这是上联：\n```json\n{\"upperCouplet\":\"春回大地千山秀\"}\n```";
//! let parsed: Upper = parse_json(raw).unwrap();
//! assert_eq!(parsed.upper, "春回大地千山秀");
//! ```

use serde::de::DeserializeOwned;
use thiserror::Error;

const EXCERPT_CHARS: usize = 80;

/// No strategy produced a span that deserializes into the requested type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("could not extract a JSON object from the completion: {excerpt:?}")]
pub struct ParseError {
    excerpt: String,
}

impl ParseError {
    /// Build the error for `raw`, keeping only a short excerpt.
    pub fn new(raw: &str) -> Self {
        let mut excerpt: String = raw.trim().chars().take(EXCERPT_CHARS).collect();
        if raw.trim().chars().count() > EXCERPT_CHARS {
            excerpt.push('…');
        }
        Self { excerpt }
    }

    /// Leading part of the completion that failed to parse.
    pub fn excerpt(&self) -> &str {
        &self.excerpt
    }
}

/// Extraction strategy: locate a candidate JSON span inside the completion.
pub type Strategy = fn(&str) -> Option<&str>;

/// Strategies in the order they are tried.
pub const STRATEGIES: [(&str, Strategy); 4] = [
    ("whole", whole_text),
    ("json_fence", json_fence),
    ("any_fence", any_fence),
    ("brace_span", brace_span),
];

/// Deserialize the first candidate span that is valid JSON for `T`.
pub fn parse_json<T>(raw: &str) -> Result<T, ParseError>
where
    T: DeserializeOwned,
{
    STRATEGIES
        .iter()
        .filter_map(|(_, strategy)| strategy(raw))
        .find_map(|span| serde_json::from_str(span).ok())
        .ok_or_else(|| ParseError::new(raw))
}

fn whole_text(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn json_fence(raw: &str) -> Option<&str> {
    let start = raw.find("```json")? + "```json".len();
    let end = raw[start..].find("```")?;
    Some(raw[start..start + end].trim())
}

fn any_fence(raw: &str) -> Option<&str> {
    let mut start = raw.find("```")? + 3;
    // Skip a language tag such as `JSON` or `javascript`.
    let tag_len = raw[start..]
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(0);
    if raw[start + tag_len..].starts_with(['\n', '\r']) {
        start += tag_len;
    }
    let end = raw[start..].find("```")?;
    Some(raw[start..start + end].trim())
}

/// Greedy: from the first `{` to the last `}`.
fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Scrolls {
        spring_scrolls: Vec<String>,
    }

    fn sample() -> Scrolls {
        Scrolls {
            spring_scrolls: vec!["春回大地".into(), "万象更新".into()],
        }
    }

    #[test]
    fn serialized_value_parses_back() {
        let raw = serde_json::to_string(&sample()).unwrap();
        assert_eq!(parse_json::<Scrolls>(&raw).unwrap(), sample());
    }

    #[test]
    fn bare_fenced_and_embedded_parse_identically() {
        let json = r#"{"springScrolls":["春回大地","万象更新"]}"#;
        let bare = parse_json::<Scrolls>(json).unwrap();
        let fenced = parse_json::<Scrolls>(&format!("```json\n{json}\n```")).unwrap();
        let untagged = parse_json::<Scrolls>(&format!("```\n{json}\n```")).unwrap();
        let prose = parse_json::<Scrolls>(&format!("以下是挥春：{json} 祝新春愉快！")).unwrap();

        assert_eq!(bare, sample());
        assert_eq!(fenced, bare);
        assert_eq!(untagged, bare);
        assert_eq!(prose, bare);
    }

    #[test]
    fn uppercase_language_tag_is_skipped() {
        let raw = "```JSON\n{\"springScrolls\":[\"春回大地\",\"万象更新\"]}\n```";
        assert_eq!(parse_json::<Scrolls>(raw).unwrap(), sample());
    }

    #[test]
    fn broken_fence_falls_back_to_brace_span() {
        let raw = "```json\n{\"springScrolls\": [\"春回大地\", \"万象更新\"]}";
        assert_eq!(parse_json::<Scrolls>(raw).unwrap(), sample());
    }

    #[test]
    fn plain_text_is_a_parse_error() {
        let err = parse_json::<Scrolls>("抱歉，我无法完成这个请求。").unwrap_err();
        assert_eq!(err.excerpt(), "抱歉，我无法完成这个请求。");
    }

    #[test]
    fn long_excerpts_are_truncated() {
        let raw = "字".repeat(200);
        let err = parse_json::<Scrolls>(&raw).unwrap_err();
        assert_eq!(err.excerpt().chars().count(), EXCERPT_CHARS + 1);
        assert!(err.excerpt().ends_with('…'));
    }

    #[test]
    fn wrong_shape_is_a_parse_error() {
        assert!(parse_json::<Scrolls>(r#"{"upperCouplet":"春回大地千山秀"}"#).is_err());
    }
}
