//! Inputs of a couplet run: the topic, the line-length constraint, the
//! banner layout and the caller's form.
//!
//! Inputs are validated once, when they are constructed; everything
//! downstream can rely on a [`Topic`] being 1–50 characters and a
//! [`RequiredLineLength`] being 5, 7 or 9.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use chunlian_core::validate::char_count;

pub const TOPIC_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("topic must not be empty")]
    Empty,
    #[error("topic has {0} characters, at most {TOPIC_MAX_CHARS} are allowed")]
    TooLong(usize),
}

/// User supplied theme of the couplet, e.g. `事业` or `家庭`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    pub fn new(topic: impl AsRef<str>) -> Result<Self, TopicError> {
        let trimmed = topic.as_ref().trim();
        match char_count(trimmed) {
            0 => Err(TopicError::Empty),
            n if n > TOPIC_MAX_CHARS => Err(TopicError::TooLong(n)),
            _ => Ok(Self(trimmed.to_owned())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Topic {
    type Error = TopicError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Topic> for String {
    fn from(value: Topic) -> Self {
        value.0
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported line length `{0}`, expected 5, 7 or 9")]
pub struct LineLengthError(pub String);

/// Number of characters every couplet line must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "LengthRepr", into = "String")]
pub enum RequiredLineLength {
    Five,
    #[default]
    Seven,
    Nine,
}

impl RequiredLineLength {
    pub const ALL: [RequiredLineLength; 3] = [Self::Five, Self::Seven, Self::Nine];

    pub fn chars(&self) -> usize {
        match self {
            Self::Five => 5,
            Self::Seven => 7,
            Self::Nine => 9,
        }
    }

    /// Traditional name of the form: 五言, 七言, 九言.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Five => "五言",
            Self::Seven => "七言",
            Self::Nine => "九言",
        }
    }
}

impl TryFrom<u64> for RequiredLineLength {
    type Error = LineLengthError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            5 => Ok(Self::Five),
            7 => Ok(Self::Seven),
            9 => Ok(Self::Nine),
            other => Err(LineLengthError(other.to_string())),
        }
    }
}

impl FromStr for RequiredLineLength {
    type Err = LineLengthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map_err(|_| LineLengthError(s.to_owned()))
            .and_then(Self::try_from)
    }
}

impl Display for RequiredLineLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.chars())
    }
}

impl From<RequiredLineLength> for String {
    fn from(value: RequiredLineLength) -> Self {
        value.to_string()
    }
}

/// Callers send the length either as `"7"` or as `7`.
#[derive(Deserialize)]
#[serde(untagged)]
enum LengthRepr {
    Text(String),
    Number(u64),
}

impl TryFrom<LengthRepr> for RequiredLineLength {
    type Error = LineLengthError;

    fn try_from(value: LengthRepr) -> Result<Self, Self::Error> {
        match value {
            LengthRepr::Text(text) => text.parse(),
            LengthRepr::Number(n) => Self::try_from(n),
        }
    }
}

/// How many banners (挥春) a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BannerCount {
    #[default]
    Four,
    Six,
}

impl BannerCount {
    pub fn get(&self) -> usize {
        match self {
            Self::Four => 4,
            Self::Six => 6,
        }
    }
}

impl TryFrom<u8> for BannerCount {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(Self::Four),
            6 => Ok(Self::Six),
            other => Err(format!("unsupported banner count {other}, expected 4 or 6")),
        }
    }
}

impl From<BannerCount> for u8 {
    fn from(value: BannerCount) -> Self {
        value.get() as u8
    }
}

/// One generated couplet pair. Every attempt that produced both lines is
/// kept, compliant or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupletCandidate {
    pub upper_line: String,
    pub lower_line: String,
    /// 1-based couplet attempt that produced the pair.
    pub attempt_index: u32,
}

impl CoupletCandidate {
    pub fn new(upper_line: impl Into<String>, lower_line: impl Into<String>, attempt_index: u32) -> Self {
        Self {
            upper_line: upper_line.into(),
            lower_line: lower_line.into(),
            attempt_index,
        }
    }

    /// Both lines have exactly `length` characters.
    pub fn is_length_compliant(&self, length: RequiredLineLength) -> bool {
        char_count(&self.upper_line) == length.chars() && char_count(&self.lower_line) == length.chars()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoupletOrder {
    /// Upper line on the left.
    #[default]
    UpperLower,
    LowerUpper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HorizontalDirection {
    #[default]
    LeftRight,
    RightLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FuDirection {
    #[default]
    Upright,
    /// The inverted 福 ("福到了").
    Rotated,
}

/// Presentation preferences. The workflow never interprets them; they ride
/// along so the caller can restore its form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutPrefs {
    pub couplet_order: CoupletOrder,
    pub horizontal_direction: HorizontalDirection,
    pub fu_direction: FuDirection,
}

/// The caller's input form, handed back on failure or abort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormData {
    pub topic: Topic,
    pub word_count: RequiredLineLength,
    #[serde(flatten)]
    pub layout: LayoutPrefs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_bounds() {
        assert_eq!(Topic::new("  事业  ").unwrap().as_str(), "事业");
        assert_eq!(Topic::new("   "), Err(TopicError::Empty));
        assert!(Topic::new("福".repeat(50)).is_ok());
        assert_eq!(Topic::new("福".repeat(51)), Err(TopicError::TooLong(51)));
    }

    #[test]
    fn line_length_accepts_strings_and_numbers() {
        assert_eq!("7".parse::<RequiredLineLength>().unwrap(), RequiredLineLength::Seven);
        assert_eq!(RequiredLineLength::try_from(9).unwrap().label(), "九言");
        assert!("6".parse::<RequiredLineLength>().is_err());
        assert!("seven".parse::<RequiredLineLength>().is_err());

        let from_text: RequiredLineLength = serde_json::from_str("\"5\"").unwrap();
        let from_number: RequiredLineLength = serde_json::from_str("5").unwrap();
        assert_eq!(from_text, from_number);
        assert_eq!(serde_json::to_string(&from_text).unwrap(), "\"5\"");
    }

    #[test]
    fn candidate_compliance_counts_characters() {
        let ok = CoupletCandidate::new("春回大地千山秀", "福满人间万户欢", 1);
        let short = CoupletCandidate::new("春回大地千山秀", "福满人间", 2);
        assert!(ok.is_length_compliant(RequiredLineLength::Seven));
        assert!(!ok.is_length_compliant(RequiredLineLength::Five));
        assert!(!short.is_length_compliant(RequiredLineLength::Seven));
    }

    #[test]
    fn form_data_wire_shape() {
        let form = FormData {
            topic: Topic::new("家庭").unwrap(),
            word_count: RequiredLineLength::Nine,
            layout: LayoutPrefs {
                couplet_order: CoupletOrder::LowerUpper,
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "topic": "家庭",
                "wordCount": "9",
                "coupletOrder": "lower-upper",
                "horizontalDirection": "left-right",
                "fuDirection": "upright"
            })
        );
        let back: FormData = serde_json::from_value(json).unwrap();
        assert_eq!(back, form);
    }

    #[test]
    fn banner_count_from_config_values() {
        assert_eq!(serde_json::from_str::<BannerCount>("6").unwrap(), BannerCount::Six);
        assert!(serde_json::from_str::<BannerCount>("5").is_err());
    }
}
