//! Orchestration of a couplet run: topic analysis, the upper/lower line
//! retry loop, election over the candidate history, banners and the
//! horizontal scroll.
//!
//! ```no_run
//! # use chunlian_core::provider::ChatCompletionProvider;
//! # async fn demo<B: ChatCompletionProvider>(client: chunlian_core::CoupletClient<B>) {
//! use chunlian_workflow::{CoupletWorkflow, WorkflowConfig, WorkflowRequest};
//!
//! let workflow = CoupletWorkflow::new(client, WorkflowConfig::default());
//! let request = WorkflowRequest::new("事业", "7").unwrap();
//! let result = workflow.execute_workflow(request).await;
//! # }
//! ```
pub mod config;
pub mod election;
pub mod generators;
pub mod history;
pub mod orchestrator;
pub mod progress;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, Settings, WorkflowConfig};
pub use history::{HistoryError, HistorySink, InMemoryHistory, NoHistory};
pub use orchestrator::{CoupletWorkflow, RequestError, WorkflowReport, WorkflowRequest};
pub use progress::{NoProgress, ProgressListener, ProgressRecorder};
