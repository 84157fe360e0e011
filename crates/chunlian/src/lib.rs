//! # `chunlian` – The umbrella crate
//!
//! One import for the whole couplet stack:
//!
//! | Crate                     | What it provides                                                        |
//! |---------------------------|-------------------------------------------------------------------------|
//! | **`chunlian-core`**       | Gateway contract, [`CoupletClient`], JSON extraction, length validation |
//! | **`chunlian-prompt`**     | Builders for assembling prompt fragments                                |
//! | **`chunlian-types`**      | Topics, candidates, stage outputs, prompts, steps and results           |
//! | **`chunlian-workflow`**   | The retrying, cancellable orchestrator plus progress and history ports  |
//! | **`chunlian-openai`**     | OpenAI-compatible HTTP gateway *(feature `openai`, on by default)*      |
//!
//! ## Quick example
//!
//! ```rust,no_run
//! use chunlian::{Settings, WorkflowRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load(None)?;
//!     let workflow = chunlian::connect(&settings.llm, settings.workflow)?;
//!
//!     let result = workflow
//!         .execute_workflow(WorkflowRequest::new("事业", "7")?)
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```
#![doc(html_root_url = "https://docs.rs/chunlian/latest")]

pub use chunlian_core::*;
pub use chunlian_prompt as prompt;
pub use chunlian_types as types;
pub use chunlian_workflow as workflow;
pub use chunlian_workflow::{
    CoupletWorkflow, HistorySink, InMemoryHistory, ProgressListener, Settings, WorkflowConfig, WorkflowReport,
    WorkflowRequest,
};

#[cfg(feature = "openai")]
pub use chunlian_openai as openai;

/// Build a workflow that talks to the OpenAI-compatible endpoint in `llm`.
///
/// # Errors
///
/// Fails when `llm` or `workflow` is invalid, or when the HTTP client
/// cannot be built.
#[cfg(feature = "openai")]
pub fn connect(
    llm: &config::LlmConfig,
    workflow: WorkflowConfig,
) -> error::Result<CoupletWorkflow<openai::OpenAiAdapter>> {
    llm.validate()?;

    let backend = openai::OpenAiAdapterBuilder::from_config(llm).build()?;
    let client = CoupletClient::new(backend, llm.model.clone())
        .with_max_tokens(llm.max_tokens)
        .with_structured_output(llm.structured_output);

    CoupletWorkflow::try_new(client, workflow).map_err(|err| error::ChunlianError::Invalid(err.to_string()))
}
