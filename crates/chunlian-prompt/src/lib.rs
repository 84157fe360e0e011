//! Prompt composition helpers: a markdown [`builder::PromptBuilder`] and a
//! message [`chain::PromptChain`].
pub mod builder;
pub mod chain;
