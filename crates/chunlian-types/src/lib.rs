//! Domain vocabulary of the chunlian workflow.
//!
//! * [`couplet`] – validated run inputs and couplet candidates.
//! * [`outputs`] – JSON shapes the stages answer with.
//! * [`prompts`] – the [`PromptCatalog`](prompts::PromptCatalog) and the
//!   stage prompt wrappers.
//! * [`fragments`] – reusable prompt pieces.
//! * [`workflow`] – steps, progress events, results and history records.
pub mod couplet;
pub mod fragments;
pub mod outputs;
pub mod prompts;
pub mod workflow;
