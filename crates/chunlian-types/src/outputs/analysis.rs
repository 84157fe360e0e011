//! Topic analysis: the guidance every later stage is conditioned on.
//!
//! The analysis model may answer in two shapes. Older prompts asked for a
//! JSON object (theme core, imagery, suggested pairs …); the current prompt
//! asks for a short prose brief. [`TopicAnalysis::from_completion`] accepts
//! both and always ends up with a prose `guidance` string to paste into the
//! downstream prompts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use chunlian_core::json_extract::{ParseError, parse_json};
use chunlian_prompt::builder::PromptBuilder;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicAnalysis {
    pub guidance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<AnalysisDetail>,
    /// Set when every analysis attempt failed and `guidance` was derived
    /// locally from the topic.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl TopicAnalysis {
    /// Interpret a raw analysis completion.
    ///
    /// A completion that parses as [`AnalysisDetail`] keeps the structured
    /// detail and renders it as guidance. Anything else non-empty is taken as
    /// prose guidance verbatim (trimmed).
    pub fn from_completion(raw: &str) -> Result<Self, ParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ParseError::new(raw));
        }

        match parse_json::<AnalysisDetail>(trimmed) {
            Ok(detail) if !detail.theme_core.trim().is_empty() => Ok(Self {
                guidance: detail.to_guidance(),
                detail: Some(detail),
                fallback: false,
            }),
            _ => Ok(Self {
                guidance: trimmed.to_owned(),
                detail: None,
                fallback: false,
            }),
        }
    }

    /// Deterministic guidance used once the analysis budget is spent.
    pub fn fallback_for(topic: &str, line_label: &str) -> Self {
        let guidance = PromptBuilder::new()
            .add_key_value("主题", topic)
            .add_key_value("体裁", line_label)
            .add_line(format_args!(
                "围绕\"{topic}\"抒写新春祝福，意象取自春景、福气、团圆与吉祥，语气喜庆昂扬。"
            ))
            .finalize();
        Self {
            guidance: guidance.trim_end().to_owned(),
            detail: None,
            fallback: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDetail {
    /// One sentence naming the core of the theme.
    pub theme_core: String,
    #[serde(default)]
    pub cultural_imagery: Vec<String>,
    /// Imagery tied to the year's zodiac animal.
    #[serde(default, alias = "horseYearElements")]
    pub zodiac_elements: Vec<String>,
    #[serde(default)]
    pub emotional_tone: String,
    #[serde(default)]
    pub key_nouns: Vec<String>,
    #[serde(default)]
    pub key_verbs: Vec<String>,
    #[serde(default)]
    pub key_adjectives: Vec<String>,
    /// Suggested antithetical word pairs.
    #[serde(default)]
    pub couplet_pairs: Vec<WordPair>,
    #[serde(default)]
    pub horizontal_direction: String,
    #[serde(default)]
    pub scroll_themes: Vec<ScrollTheme>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WordPair {
    pub upper: String,
    pub lower: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScrollTheme {
    pub theme: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl AnalysisDetail {
    /// Render the structured analysis as the prose brief later prompts embed.
    pub fn to_guidance(&self) -> String {
        let mut builder = PromptBuilder::new().add_key_value("主题核心", &self.theme_core);

        let lists = [
            ("文化意象", &self.cultural_imagery),
            ("生肖元素", &self.zodiac_elements),
            ("名词", &self.key_nouns),
            ("动词", &self.key_verbs),
            ("形容词", &self.key_adjectives),
        ];
        for (label, items) in lists {
            if !items.is_empty() {
                builder = builder.add_key_value(label, items.join("、"));
            }
        }

        if !self.emotional_tone.is_empty() {
            builder = builder.add_key_value("情感基调", &self.emotional_tone);
        }
        if !self.couplet_pairs.is_empty() {
            let pairs: Vec<String> = self
                .couplet_pairs
                .iter()
                .map(|p| format!("{}/{}", p.upper, p.lower))
                .collect();
            builder = builder.add_key_value("对仗词组", pairs.join("，"));
        }
        if !self.horizontal_direction.is_empty() {
            builder = builder.add_key_value("横批方向", &self.horizontal_direction);
        }
        if !self.scroll_themes.is_empty() {
            builder = builder.add_line("挥春主题：").add_bullets(self.scroll_themes.iter().map(|t| {
                if t.keywords.is_empty() {
                    t.theme.clone()
                } else {
                    format!("{}（{}）", t.theme, t.keywords.join("、"))
                }
            }));
        }

        builder.finalize().trim_end().to_owned()
    }
}
