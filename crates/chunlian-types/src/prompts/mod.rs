//! Prompt text for every stage, behind a swappable [`PromptCatalog`].
//!
//! A catalog is a set of pure functions from stage inputs to a
//! system/user [`PromptText`] pair. The stage wrappers below
//! ([`UpperLinePrompt`], [`BannersPrompt`], …) bind that text to the stage's
//! sampling temperature and output type so it can be fed straight into
//! [`CoupletClient::prompt_execute`](chunlian_core::client::CoupletClient::prompt_execute).

mod classic;

pub use classic::ClassicCatalog;

use chunlian_core::{
    generic::{GenericMessage, GenericRole},
    template::{IntoPrompt, PromptTemplate},
};
use chunlian_prompt::chain::PromptChain;

use crate::{
    couplet::{BannerCount, CoupletCandidate, RequiredLineLength, Topic},
    fragments::StaticFragment,
    outputs::{
        AnalysisDetail, BannersOutput, ElectionChoice, HorizontalScrollOutput, LowerLineOutput,
        ReviewVerdict, TopicAnalysis, UpperLineOutput,
    },
};

/// System instruction plus user prompt for one model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptText {
    pub system: String,
    pub user: String,
}

impl PromptText {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// A rejected couplet attempt, shown to the model on the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptFeedback {
    pub upper_line: Option<String>,
    pub lower_line: Option<String>,
    /// Validation failures and review errors, one per entry.
    pub problems: Vec<String>,
    pub suggestions: Vec<String>,
}

impl AttemptFeedback {
    pub fn is_empty(&self) -> bool {
        self.problems.is_empty() && self.suggestions.is_empty()
    }
}

/// What every post-analysis stage is conditioned on.
#[derive(Debug, Clone, Copy)]
pub struct CoupletContext<'a> {
    pub topic: &'a Topic,
    pub length: RequiredLineLength,
    pub analysis: &'a TopicAnalysis,
    /// Set on couplet retries only.
    pub feedback: Option<&'a AttemptFeedback>,
}

impl<'a> CoupletContext<'a> {
    pub fn new(topic: &'a Topic, length: RequiredLineLength, analysis: &'a TopicAnalysis) -> Self {
        Self {
            topic,
            length,
            analysis,
            feedback: None,
        }
    }

    pub fn with_feedback(mut self, feedback: Option<&'a AttemptFeedback>) -> Self {
        self.feedback = feedback;
        self
    }
}

/// Source of stage prompts.
pub trait PromptCatalog: Send + Sync {
    fn topic_analysis(&self, topic: &Topic, length: RequiredLineLength) -> PromptText;

    /// `ctx.feedback` carries the previous rejected attempt, if any.
    fn upper_line(&self, ctx: CoupletContext<'_>) -> PromptText;

    fn lower_line(&self, ctx: CoupletContext<'_>, upper: &str) -> PromptText;

    fn review(&self, ctx: CoupletContext<'_>, upper: &str, lower: &str) -> PromptText;

    /// `candidates` are the qualifying pairs, enumerated 1-based in the
    /// prompt.
    fn election(&self, ctx: CoupletContext<'_>, candidates: &[&CoupletCandidate]) -> PromptText;

    fn banners(&self, ctx: CoupletContext<'_>, upper: &str, lower: &str, count: BannerCount) -> PromptText;

    fn horizontal_scroll(&self, ctx: CoupletContext<'_>, upper: &str, lower: &str) -> PromptText;
}

macro_rules! stage_prompt {
    ($(#[$meta:meta])* $name:ident => $output:ty, temperature = $temperature:expr $(, max_tokens = $max_tokens:expr)?) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub PromptText);

        impl From<PromptText> for $name {
            fn from(text: PromptText) -> Self {
                Self(text)
            }
        }

        impl IntoPrompt for $name {
            type Message = GenericMessage;

            fn into_prompt(self) -> Vec<Self::Message> {
                PromptChain::new()
                    .with(StaticFragment::new(&self.0.system, GenericRole::System))
                    .with(StaticFragment::new(&self.0.user, GenericRole::User))
                    .build()
            }
        }

        impl PromptTemplate for $name {
            type Output = $output;
            const TEMPERATURE: f64 = $temperature;
            $(const MAX_TOKENS: Option<u32> = Some($max_tokens);)?
        }
    };
}

stage_prompt!(
    /// Free text or [`AnalysisDetail`] JSON; see [`TopicAnalysis::from_completion`].
    AnalysisPrompt => AnalysisDetail, temperature = 0.7, max_tokens = 500
);
stage_prompt!(UpperLinePrompt => UpperLineOutput, temperature = 0.8);
stage_prompt!(LowerLinePrompt => LowerLineOutput, temperature = 0.8);
stage_prompt!(BannersPrompt => BannersOutput, temperature = 0.8);
stage_prompt!(HorizontalScrollPrompt => HorizontalScrollOutput, temperature = 0.8);
stage_prompt!(ReviewPrompt => ReviewVerdict, temperature = 0.3);
stage_prompt!(ElectionPrompt => ElectionChoice, temperature = 0.7, max_tokens = 1000);
