//! JSON shapes the generation stages answer with.
//!
//! Field names follow the camelCase keys the prompts ask for. Unknown keys
//! are ignored; models like to add commentary fields.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpperLineOutput {
    pub upper_couplet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowerLineOutput {
    pub lower_couplet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BannersOutput {
    pub spring_scrolls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HorizontalScrollOutput {
    pub horizontal_scroll: String,
}

/// The model's pick among the enumerated candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ElectionChoice {
    /// 1-based position in the list the prompt enumerated.
    pub selected_index: i64,
    #[serde(default)]
    pub reason: String,
}
