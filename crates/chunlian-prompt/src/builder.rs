//! Builder-style helper for constructing the **markdown prompts** sent to the
//! couplet stages.
//!
//! Every stage prompt has the same skeleton: an opening instruction, a few
//! `##` sections (guidance, the lines produced so far, numbered
//! requirements) and the JSON shape to answer with. `PromptBuilder` keeps
//! that skeleton consistent across stages:
//!
//! ```rust
//! use chunlian_prompt::builder::PromptBuilder;
//!
//! let md = PromptBuilder::new()
//!     .add_line("为主题\"事业\"生成七言上联。")
//!     .add_blank_line()
//!     .add_section_h2("要求")
//!     .add_numbered(["字数严格7字", "末字仄声"])
//!     .add_blank_line()
//!     .add_section_h2("输出JSON")
//!     .add_line(r#"{"upperCouplet":"上联内容"}"#)
//!     .finalize();
//!
//! assert!(md.contains("## 要求\n1. 字数严格7字\n2. 末字仄声\n"));
//! ```
//!
//! The builder performs no validation and no smart formatting; newlines are
//! emitted exactly as requested.

use std::fmt::Display;

/// Fluent helper to produce markdown fragments.
///
/// Internally it owns a `String` buffer that grows with each chained call.
/// Once you’re done, call [`Self::finalize`] to obtain the assembled markdown.
#[derive(Debug, Default, Clone)]
pub struct PromptBuilder {
    buffer: String,
}

impl PromptBuilder {
    /// Create a fresh, empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a level-1 (`#`) heading.
    pub fn add_section_h1(self, line: impl Display) -> Self {
        self.add_line(format_args!("# {line}"))
    }

    /// Add a level-2 (`##`) heading.
    pub fn add_section_h2(self, line: impl Display) -> Self {
        self.add_line(format_args!("## {line}"))
    }

    /// Add a plain line of text and a trailing newline.
    pub fn add_line(mut self, line: impl Display) -> Self {
        self.buffer.push_str(&line.to_string());
        self.buffer.push('\n');
        self
    }

    /// Add a bold line (`**text**`) and a trailing newline.
    pub fn add_line_bold(self, line: impl Display) -> Self {
        self.add_line(format_args!("**{line}**"))
    }

    /// Add a plain `key：value` line using the full-width colon of the
    /// Chinese prompts.
    pub fn add_key_value(self, key: impl Display, value: impl Display) -> Self {
        self.add_line(format_args!("{key}：{value}"))
    }

    /// Add `1. …`, `2. …` lines.
    pub fn add_numbered<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        for (i, item) in items.into_iter().enumerate() {
            self = self.add_line(format_args!("{}. {item}", i + 1));
        }
        self
    }

    /// Add `- …` lines.
    pub fn add_bullets<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        for item in items {
            self = self.add_line(format_args!("- {item}"));
        }
        self
    }

    /// Embed a code block fenced as `json`.
    pub fn add_text_json(self, content: impl Display) -> Self {
        self.add_line("```json").add_line(content).add_line("```")
    }

    /// Insert a single blank line.
    pub fn add_blank_line(mut self) -> Self {
        self.buffer.push('\n');
        self
    }

    /// Insert a "---" delimiter.
    pub fn add_delimiter(self) -> Self {
        self.add_line("---")
    }

    /// Retrieve the accumulated markdown and consume the builder.
    pub fn finalize(self) -> String {
        self.buffer
    }
}
