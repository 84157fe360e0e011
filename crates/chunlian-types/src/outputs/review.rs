use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Verdict of the optional format review of a finished couplet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ReviewVerdict {
    pub passed: bool,
    pub errors: Vec<ReviewIssue>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ReviewIssue {
    /// Category such as `length`, `tone` or `antithesis`.
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl ReviewVerdict {
    /// Issues joined into a single line for step logs.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("[{}] {}", e.kind, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
