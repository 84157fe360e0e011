//! The couplet run state machine.
//!
//! ```text
//! Idle → AnalyzingTopic → GeneratingUpper ⇄ GeneratingLower → GeneratingBanners
//!      → GeneratingScroll → Completed
//!                       ↘ Election (budget spent) ↗        ↘ Failed / Aborted
//! ```
//!
//! Stages run strictly in sequence. Every attempt is a step: it is started,
//! then completed or failed, and each transition is both emitted to the
//! progress listener and written to the history sink. Cancellation is polled
//! before every stage and attempt, and again when a model call returns; a
//! result that arrives after the token fired is discarded.

use std::sync::Arc;

use serde_json::{Value, json};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;
use uuid::Uuid;

use chunlian_core::{
    CoupletClient,
    provider::ChatCompletionProvider,
    validate::{char_count, validate_banner_set, validate_line_length},
};
use chunlian_types::{
    couplet::{CoupletCandidate, FormData, LayoutPrefs, LineLengthError, RequiredLineLength, Topic, TopicError},
    outputs::TopicAnalysis,
    prompts::{AttemptFeedback, ClassicCatalog, CoupletContext, PromptCatalog},
    workflow::{
        CoupletSet, ElectionSummary, ProgressEvent, ProgressEventKind, RecordStatus, Stage, WorkflowResult,
        WorkflowStep, upsert_step,
    },
};

use crate::{
    config::{ConfigError, WorkflowConfig},
    election::elect,
    generators::StageGenerators,
    history::{HistorySink, NoHistory},
    progress::{NoProgress, ProgressListener},
};

/// Expected length of a horizontal scroll. Other lengths are logged only.
const SCROLL_CHARS: usize = 4;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    Length(#[from] LineLengthError),
}

/// Validated input of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRequest {
    form: FormData,
    include_analysis: bool,
}

impl WorkflowRequest {
    /// `word_count` is `"5"`, `"7"` or `"9"`.
    pub fn new(topic: impl AsRef<str>, word_count: &str) -> Result<Self, RequestError> {
        Ok(Self::from_form(FormData {
            topic: Topic::new(topic)?,
            word_count: word_count.parse()?,
            layout: LayoutPrefs::default(),
        }))
    }

    pub fn from_form(form: FormData) -> Self {
        Self {
            form,
            include_analysis: false,
        }
    }

    /// Attach the topic analysis guidance to a successful result.
    pub fn with_analysis(mut self, include: bool) -> Self {
        self.include_analysis = include;
        self
    }

    pub fn with_layout(mut self, layout: LayoutPrefs) -> Self {
        self.form.layout = layout;
        self
    }

    pub fn form_data(&self) -> &FormData {
        &self.form
    }
}

/// A run's result together with what it went through.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub result: WorkflowResult,
    pub record_id: Uuid,
    pub steps: Vec<WorkflowStep>,
    pub candidates: Vec<CoupletCandidate>,
    pub analysis: Option<TopicAnalysis>,
}

/// Why the stage sequence stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    #[error("workflow aborted")]
    Aborted,
    #[error("{0}")]
    Exhausted(String),
}

/// How one coupled upper/lower attempt ended.
enum AttemptOutcome {
    Accepted(String, String),
    /// `None` when nothing useful can be fed back, e.g. a gateway error.
    Rejected(Option<AttemptFeedback>),
}

impl AttemptOutcome {
    fn rejected(feedback: AttemptFeedback) -> Self {
        Self::Rejected((!feedback.is_empty()).then_some(feedback))
    }
}

/// Drives one couplet run per `execute_workflow` call.
pub struct CoupletWorkflow<B> {
    generators: StageGenerators<B>,
    config: WorkflowConfig,
    listener: Arc<dyn ProgressListener>,
    history: Arc<dyn HistorySink>,
    cancel: CancellationToken,
}

impl<B> CoupletWorkflow<B>
where
    B: ChatCompletionProvider,
{
    /// Build a workflow without checking `config`; see [`Self::try_new`].
    pub fn new(client: CoupletClient<B>, config: WorkflowConfig) -> Self {
        Self {
            generators: StageGenerators::new(client, Arc::new(ClassicCatalog::new())),
            config,
            listener: Arc::new(NoProgress),
            history: Arc::new(NoHistory),
            cancel: CancellationToken::new(),
        }
    }

    /// Build a workflow after [`WorkflowConfig::validate`] accepted `config`.
    pub fn try_new(client: CoupletClient<B>, config: WorkflowConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(client, config))
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn PromptCatalog>) -> Self {
        self.generators.set_catalog(catalog);
        self
    }

    pub fn with_history(mut self, history: Arc<dyn HistorySink>) -> Self {
        self.history = history;
        self
    }

    /// Share an externally owned token, e.g. a child of a server's shutdown
    /// token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn set_progress_callback(&mut self, listener: impl ProgressListener + 'static) {
        self.listener = Arc::new(listener);
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request cancellation of the current run. The token stays cancelled,
    /// so later runs abort immediately until [`Self::reset_cancellation`].
    pub fn abort(&self) {
        tracing::info!("abort requested");
        self.cancel.cancel();
    }

    pub fn reset_cancellation(&mut self) {
        self.cancel = CancellationToken::new();
    }

    pub async fn execute_workflow(&self, request: WorkflowRequest) -> WorkflowResult {
        self.execute_workflow_with_report(request).await.result
    }

    pub async fn execute_workflow_with_report(&self, request: WorkflowRequest) -> WorkflowReport {
        let record_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "couplet_workflow",
            %record_id,
            topic = %request.form.topic,
            length = request.form.word_count.chars()
        );
        self.run(record_id, request).instrument(span).await
    }

    async fn run(&self, record_id: Uuid, request: WorkflowRequest) -> WorkflowReport {
        let WorkflowRequest { form, include_analysis } = request;
        if let Err(err) = self.history.create_record(record_id, &form).await {
            tracing::warn!(error = %err, "history: create record failed");
        }

        let mut run = Run {
            workflow: self,
            record_id,
            form,
            steps: Vec::new(),
            candidates: Vec::new(),
            analysis: None,
        };

        let outcome = run.drive(include_analysis).await;
        let result = run.finish(outcome).await;

        WorkflowReport {
            result,
            record_id,
            steps: run.steps,
            candidates: run.candidates,
            analysis: run.analysis,
        }
    }
}

/// State owned by a single run.
struct Run<'w, B> {
    workflow: &'w CoupletWorkflow<B>,
    record_id: Uuid,
    form: FormData,
    steps: Vec<WorkflowStep>,
    candidates: Vec<CoupletCandidate>,
    analysis: Option<TopicAnalysis>,
}

impl<B> Run<'_, B>
where
    B: ChatCompletionProvider,
{
    fn config(&self) -> &WorkflowConfig {
        &self.workflow.config
    }

    fn generators(&self) -> &StageGenerators<B> {
        &self.workflow.generators
    }

    async fn drive(&mut self, include_analysis: bool) -> Result<CoupletSet, StageError> {
        self.check_cancelled()?;

        let topic = self.form.topic.clone();
        let length = self.form.word_count;

        let analysis = self.analyze(&topic, length).await?;
        self.analysis = Some(analysis.clone());

        let ctx = CoupletContext::new(&topic, length, &analysis);

        let (upper_line, lower_line, election) = self.couplet(ctx).await?;
        let banners = self.banners(ctx, &upper_line, &lower_line).await?;
        let horizontal_scroll = self.horizontal_scroll(ctx, &upper_line, &lower_line).await?;

        Ok(CoupletSet {
            upper_line,
            lower_line,
            horizontal_scroll,
            banners,
            analysis: include_analysis.then(|| analysis.clone()),
            election,
        })
    }

    async fn finish(&mut self, outcome: Result<CoupletSet, StageError>) -> WorkflowResult {
        match outcome {
            Ok(set) => {
                tracing::info!(upper = %set.upper_line, lower = %set.lower_line, "workflow completed");
                self.emit(
                    ProgressEvent::new(ProgressEventKind::WorkflowCompleted, "workflow", "春联生成完成")
                        .with_output(json!(set)),
                );
                self.set_status(RecordStatus::Completed, Some(&set), None).await;
                WorkflowResult::Completed(set)
            }
            Err(StageError::Aborted) => {
                tracing::info!("workflow aborted");
                self.emit(ProgressEvent::new(
                    ProgressEventKind::WorkflowAborted,
                    "workflow",
                    "已取消生成",
                ));
                self.set_status(RecordStatus::Aborted, None, Some("aborted")).await;
                WorkflowResult::aborted(self.form.clone())
            }
            Err(StageError::Exhausted(reason)) => {
                tracing::warn!(%reason, candidates = self.candidates.len(), "workflow failed");
                self.emit(
                    ProgressEvent::new(ProgressEventKind::WorkflowFailed, "workflow", "春联生成失败")
                        .with_error(reason.clone()),
                );
                self.set_status(RecordStatus::Failed, None, Some(reason.as_str())).await;
                WorkflowResult::failed(
                    format!("春联生成失败：{reason}。请返回首页调整主题后重试。"),
                    self.form.clone(),
                )
            }
        }
    }

    async fn analyze(&mut self, topic: &Topic, length: RequiredLineLength) -> Result<TopicAnalysis, StageError> {
        let budget = self.config().analysis_attempts;
        for attempt in 0..budget {
            self.check_cancelled()?;
            let step = self.start(Stage::TopicAnalysis, attempt).await;
            let outcome = self.generators().analyze_topic(topic, length).await;
            self.check_returned(&step).await?;

            match outcome {
                Ok(analysis) => {
                    self.complete(step, attempt, json!(analysis.guidance)).await;
                    return Ok(analysis);
                }
                Err(err) => self.fail(step, attempt, err.to_string()).await,
            }
        }

        tracing::warn!(attempts = budget, "topic analysis exhausted, using fallback guidance");
        Ok(TopicAnalysis::fallback_for(topic.as_str(), length.label()))
    }

    async fn couplet(
        &mut self,
        ctx: CoupletContext<'_>,
    ) -> Result<(String, String, Option<ElectionSummary>), StageError> {
        let budget = self.config().couplet_attempts;
        let mut feedback: Option<AttemptFeedback> = None;
        for attempt in 0..budget {
            self.check_cancelled()?;
            let outcome = self
                .couplet_attempt(ctx.with_feedback(feedback.as_ref()), attempt)
                .await?;
            match outcome {
                AttemptOutcome::Accepted(upper, lower) => return Ok((upper, lower, None)),
                AttemptOutcome::Rejected(Some(rejected)) => feedback = Some(rejected),
                AttemptOutcome::Rejected(None) => {}
            }
        }

        let n = ctx.length.chars();
        if self.candidates.is_empty() {
            return Err(StageError::Exhausted(format!(
                "{budget} 次尝试均未生成完整的上下联"
            )));
        }

        self.check_cancelled()?;
        let step = self.start(Stage::Election, 0).await;
        let elected = elect(self.generators(), ctx, &self.candidates).await;
        self.check_returned(&step).await?;

        let election = match elected {
            Ok(election) => election,
            Err(err) => {
                self.fail(step, 0, err.to_string()).await;
                return Err(StageError::Exhausted(err.to_string()));
            }
        };

        let output = json!({
            "selectedIndex": election.selected_index,
            "reason": election.reason,
            "upperLine": election.upper_line,
            "lowerLine": election.lower_line,
        });
        let winner = &self.candidates[election.selected_index];
        if !winner.is_length_compliant(ctx.length) {
            self.fail(step, 0, format!("elected pair is not {n} characters per line"))
                .await;
            return Err(StageError::Exhausted(format!(
                "{budget} 次尝试均未生成符合{n}字要求的春联"
            )));
        }

        tracing::info!(
            selected = election.selected_index,
            candidates = self.candidates.len(),
            "couplet elected"
        );
        self.complete(step, 0, output).await;
        let summary = election.summary(self.candidates.len());
        Ok((election.upper_line, election.lower_line, Some(summary)))
    }

    /// One coupled attempt. Both lines are always generated so the pair lands
    /// in the candidate history.
    async fn couplet_attempt(
        &mut self,
        ctx: CoupletContext<'_>,
        attempt: u32,
    ) -> Result<AttemptOutcome, StageError> {
        let n = ctx.length.chars();
        let mut feedback = AttemptFeedback::default();

        let step = self.start(Stage::UpperLine, attempt).await;
        let generated = self.generators().upper_line(ctx).await;
        self.check_returned(&step).await?;
        let upper = match generated {
            Ok(upper) => upper,
            Err(err) => {
                self.fail(step, attempt, err.to_string()).await;
                return Ok(AttemptOutcome::rejected(feedback));
            }
        };
        feedback.upper_line = Some(upper.clone());
        let upper_check = validate_line_length(&upper, n);
        if upper_check.passed {
            self.complete(step, attempt, json!(upper)).await;
        } else {
            feedback.problems.push(upper_check.reason().to_owned());
            self.fail(step, attempt, upper_check.reason()).await;
        }

        self.check_cancelled()?;
        let step = self.start(Stage::LowerLine, attempt).await;
        let generated = self.generators().lower_line(ctx, &upper).await;
        self.check_returned(&step).await?;
        let lower = match generated {
            Ok(lower) => lower,
            Err(err) => {
                self.fail(step, attempt, err.to_string()).await;
                return Ok(AttemptOutcome::rejected(feedback));
            }
        };
        self.candidates
            .push(CoupletCandidate::new(upper.clone(), lower.clone(), attempt + 1));
        feedback.lower_line = Some(lower.clone());

        let lower_check = validate_line_length(&lower, n);
        if lower_check.passed {
            self.complete(step, attempt, json!(lower)).await;
        } else {
            feedback.problems.push(lower_check.reason().to_owned());
            self.fail(step, attempt, lower_check.reason()).await;
        }

        if !(upper_check.passed && lower_check.passed) {
            tracing::debug!(attempt, %upper, %lower, "couplet pair rejected on length");
            return Ok(AttemptOutcome::rejected(feedback));
        }

        if self.config().review_couplets {
            self.check_cancelled()?;
            let step = self.start(Stage::FormatReview, attempt).await;
            let verdict = self.generators().review(ctx, &upper, &lower).await;
            self.check_returned(&step).await?;
            match verdict {
                Ok(verdict) if verdict.passed => self.complete(step, attempt, json!(verdict)).await,
                Ok(verdict) => {
                    let summary = verdict.summary();
                    let error = if summary.is_empty() {
                        "format review rejected the couplet".to_owned()
                    } else {
                        summary
                    };
                    feedback.problems = verdict
                        .errors
                        .iter()
                        .map(|issue| format!("{}: {}", issue.kind, issue.message))
                        .collect();
                    if feedback.problems.is_empty() {
                        feedback.problems.push(error.clone());
                    }
                    feedback.suggestions = verdict.suggestions;
                    self.fail(step, attempt, error).await;
                    return Ok(AttemptOutcome::rejected(feedback));
                }
                Err(err) => {
                    self.fail(step, attempt, err.to_string()).await;
                    return Ok(AttemptOutcome::rejected(feedback));
                }
            }
        }

        Ok(AttemptOutcome::Accepted(upper, lower))
    }

    async fn banners(&mut self, ctx: CoupletContext<'_>, upper: &str, lower: &str) -> Result<Vec<String>, StageError> {
        let budget = self.config().banner_attempts;
        let count = self.config().banner_count;
        let chars = self.config().banner_chars;

        for attempt in 0..budget {
            self.check_cancelled()?;
            let step = self.start(Stage::Banners, attempt).await;
            let generated = self.generators().banners(ctx, upper, lower, count).await;
            self.check_returned(&step).await?;

            match generated {
                Ok(banners) => {
                    let check = validate_banner_set(&banners, count.get(), chars);
                    if check.passed {
                        self.complete(step, attempt, json!(banners)).await;
                        return Ok(banners);
                    }
                    self.fail(step, attempt, check.reason()).await;
                }
                Err(err) => self.fail(step, attempt, err.to_string()).await,
            }
        }

        let fallback = self.config().fallback_banners();
        let check = validate_banner_set(&fallback, count.get(), chars);
        if !check.passed {
            tracing::error!(reason = check.reason(), "banners exhausted and the default set is unusable");
            return Err(StageError::Exhausted(format!(
                "{budget} 次挥春生成均未通过校验，默认挥春也不可用"
            )));
        }
        tracing::warn!(attempts = budget, "banners exhausted, using default set");
        Ok(fallback)
    }

    async fn horizontal_scroll(
        &mut self,
        ctx: CoupletContext<'_>,
        upper: &str,
        lower: &str,
    ) -> Result<String, StageError> {
        self.check_cancelled()?;
        let step = self.start(Stage::HorizontalScroll, 0).await;
        let generated = self.generators().horizontal_scroll(ctx, upper, lower).await;
        self.check_returned(&step).await?;

        match generated {
            Ok(scroll) if !scroll.is_empty() => {
                if char_count(&scroll) != SCROLL_CHARS {
                    tracing::warn!(%scroll, "horizontal scroll is not {SCROLL_CHARS} characters");
                }
                self.complete(step, 0, json!(scroll)).await;
                Ok(scroll)
            }
            Ok(_) => {
                self.fail(step, 0, "empty horizontal scroll").await;
                Ok(self.config().default_horizontal_scroll.clone())
            }
            Err(err) => {
                self.fail(step, 0, err.to_string()).await;
                Ok(self.config().default_horizontal_scroll.clone())
            }
        }
    }

    fn check_cancelled(&self) -> Result<(), StageError> {
        if self.workflow.cancel.is_cancelled() {
            Err(StageError::Aborted)
        } else {
            Ok(())
        }
    }

    /// Poll after a model call; a cancelled run drops the result and closes
    /// the step.
    async fn check_returned(&mut self, step: &WorkflowStep) -> Result<(), StageError> {
        if self.workflow.cancel.is_cancelled() {
            self.record(step.clone().fail("aborted")).await;
            return Err(StageError::Aborted);
        }
        Ok(())
    }

    async fn start(&mut self, stage: Stage, retry: u32) -> WorkflowStep {
        let step = WorkflowStep::running(stage.name(), stage.retry_description(retry));
        tracing::debug!(stage = stage.name(), attempt = retry + 1, "stage started");
        self.emit(
            ProgressEvent::new(ProgressEventKind::StageStarted, &step.name, &step.description).with_retry(retry),
        );
        self.record(step.clone()).await;
        step
    }

    async fn complete(&mut self, step: WorkflowStep, retry: u32, output: Value) {
        tracing::debug!(stage = %step.name, attempt = retry + 1, "stage completed");
        self.emit(
            ProgressEvent::new(ProgressEventKind::StageCompleted, &step.name, &step.description)
                .with_output(output.clone())
                .with_retry(retry),
        );
        self.record(step.complete(output)).await;
    }

    async fn fail(&mut self, step: WorkflowStep, retry: u32, error: impl Into<String>) {
        let error = error.into();
        tracing::info!(stage = %step.name, attempt = retry + 1, %error, "stage failed");
        self.emit(
            ProgressEvent::new(ProgressEventKind::StageFailed, &step.name, &step.description)
                .with_error(error.clone())
                .with_retry(retry),
        );
        self.record(step.fail(error)).await;
    }

    async fn record(&mut self, step: WorkflowStep) {
        if let Err(err) = self.workflow.history.add_or_update_step(self.record_id, &step).await {
            tracing::warn!(error = %err, step = %step.name, "history: step update failed");
        }
        upsert_step(&mut self.steps, step);
    }

    async fn set_status(&self, status: RecordStatus, result: Option<&CoupletSet>, error: Option<&str>) {
        if let Err(err) = self
            .workflow
            .history
            .update_record_status(self.record_id, status, result, error)
            .await
        {
            tracing::warn!(error = %err, ?status, "history: status update failed");
        }
    }

    fn emit(&self, event: ProgressEvent) {
        self.workflow.listener.on_event(&event);
    }
}

#[cfg(test)]
mod tests;
