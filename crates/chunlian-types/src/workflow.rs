//! Run bookkeeping shared by the orchestrator, progress listeners and history
//! sinks: stage names, steps, progress events, results and stored records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    couplet::{FormData, RequiredLineLength, Topic},
    outputs::TopicAnalysis,
};

/// The stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    TopicAnalysis,
    UpperLine,
    LowerLine,
    FormatReview,
    Election,
    Banners,
    HorizontalScroll,
}

impl Stage {
    /// Stable step name written to events and history.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TopicAnalysis => "topic_analysis",
            Self::UpperLine => "upper_line",
            Self::LowerLine => "lower_line",
            Self::FormatReview => "format_review",
            Self::Election => "election",
            Self::Banners => "banners",
            Self::HorizontalScroll => "horizontal_scroll",
        }
    }

    /// Human readable label shown next to a running step.
    pub fn description(&self) -> &'static str {
        match self {
            Self::TopicAnalysis => "分析主题",
            Self::UpperLine => "生成上联",
            Self::LowerLine => "生成下联",
            Self::FormatReview => "审查格式",
            Self::Election => "选举最优春联",
            Self::Banners => "生成挥春",
            Self::HorizontalScroll => "生成横批",
        }
    }

    /// Description of the `retry_count`-th retry, e.g. `生成上联 (retry 2)`.
    pub fn retry_description(&self, retry_count: u32) -> String {
        if retry_count == 0 {
            self.description().to_owned()
        } else {
            format!("{} (retry {retry_count})", self.description())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl WorkflowStep {
    pub fn running(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            status: StepStatus::Running,
            output: None,
            error: None,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    pub fn complete(mut self, output: Value) -> Self {
        self.status = StepStatus::Completed;
        self.output = Some(output);
        self.end_time = Some(Utc::now());
        self
    }

    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.status = StepStatus::Failed;
        self.error = Some(error.into());
        self.end_time = Some(Utc::now());
        self
    }

    pub fn is_running(&self) -> bool {
        self.status == StepStatus::Running
    }
}

/// Record `step` in `steps`.
///
/// If the most recent step with the same name is still running it is
/// replaced in place (keeping its id and start time); otherwise the step is
/// appended.
pub fn upsert_step(steps: &mut Vec<WorkflowStep>, step: WorkflowStep) {
    match steps.iter().rposition(|s| s.name == step.name) {
        Some(i) if steps[i].is_running() => {
            let existing = &mut steps[i];
            *existing = WorkflowStep {
                id: existing.id,
                start_time: existing.start_time,
                ..step
            };
        }
        _ => steps.push(step),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressEventKind {
    StageStarted,
    StageCompleted,
    StageFailed,
    WorkflowCompleted,
    WorkflowFailed,
    WorkflowAborted,
}

impl ProgressEventKind {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::WorkflowCompleted | Self::WorkflowFailed | Self::WorkflowAborted
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub kind: ProgressEventKind,
    pub timestamp: DateTime<Utc>,
    pub step_name: String,
    pub step_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub is_retry: bool,
    pub retry_count: u32,
}

impl ProgressEvent {
    pub fn new(kind: ProgressEventKind, step_name: impl Into<String>, step_description: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            step_name: step_name.into(),
            step_description: step_description.into(),
            output: None,
            error: None,
            is_retry: false,
            retry_count: 0,
        }
    }

    pub fn with_output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_retry(mut self, retry_count: u32) -> Self {
        self.is_retry = retry_count > 0;
        self.retry_count = retry_count;
        self
    }
}

/// How the winning couplet of an exhausted run was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSummary {
    /// Index into the candidate history.
    pub selected_index: usize,
    pub reason: String,
    pub candidate_count: usize,
}

/// A finished couplet set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoupletSet {
    pub upper_line: String,
    pub lower_line: String,
    pub horizontal_scroll: String,
    pub banners: Vec<String>,
    /// The run's topic analysis, attached on request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<TopicAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub election: Option<ElectionSummary>,
}

/// Payload that sends the caller back to its input form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowFallback {
    pub should_return_to_home: bool,
    pub error_message: String,
    pub form_data: FormData,
}

impl WorkflowFallback {
    pub fn new(error_message: impl Into<String>, form_data: FormData) -> Self {
        Self {
            should_return_to_home: true,
            error_message: error_message.into(),
            form_data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortedPayload {
    pub aborted: bool,
    pub form_data: FormData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowResult {
    Completed(CoupletSet),
    Failed(WorkflowFallback),
    Aborted(AbortedPayload),
}

impl WorkflowResult {
    pub fn aborted(form_data: FormData) -> Self {
        Self::Aborted(AbortedPayload {
            aborted: true,
            form_data,
        })
    }

    pub fn failed(error_message: impl Into<String>, form_data: FormData) -> Self {
        Self::Failed(WorkflowFallback::new(error_message, form_data))
    }

    pub fn couplets(&self) -> Option<&CoupletSet> {
        match self {
            Self::Completed(set) => Some(set),
            _ => None,
        }
    }

    pub fn fallback(&self) -> Option<&WorkflowFallback> {
        match self {
            Self::Failed(fallback) => Some(fallback),
            _ => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Completed,
    Failed,
    Aborted,
}

/// One run as kept by a history sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub topic: Topic,
    pub word_count: RequiredLineLength,
    pub form_data: FormData,
    pub status: RecordStatus,
    pub steps: Vec<WorkflowStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CoupletSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationRecord {
    pub fn new(id: Uuid, form_data: FormData) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            topic: form_data.topic.clone(),
            word_count: form_data.word_count,
            form_data,
            status: RecordStatus::Pending,
            steps: Vec::new(),
            result: None,
            error: None,
        }
    }
}
