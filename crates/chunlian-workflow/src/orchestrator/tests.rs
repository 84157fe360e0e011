use std::sync::Arc;

use chunlian_core::{
    provider::BoxFuture,
    validate::{char_count, validate_line_length},
};
use chunlian_types::{
    couplet::{BannerCount, FormData, LayoutPrefs},
    workflow::{CoupletSet, RecordStatus, StepStatus, WorkflowStep},
};
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::{
    history::{HistoryError, HistoryResult, InMemoryHistory},
    progress::ProgressRecorder,
    testing::{ScriptedBackend, TestCatalog, client},
};

const UPPER: &str = "鹏程万里展宏图";
const LOWER: &str = "骏业千秋开新局";
const BANNERS: &str = r#"{"springScrolls":["马到成功","万事如意","步步高升","前程似锦"]}"#;

fn upper(line: &str) -> String {
    format!(r#"{{"upperCouplet":"{line}"}}"#)
}

fn lower(line: &str) -> String {
    format!(r#"{{"lowerCouplet":"{line}"}}"#)
}

fn happy_backend() -> ScriptedBackend {
    ScriptedBackend::new()
        .reply("analysis", "事业主题：鹏程、宏图、骏马。")
        .reply("upper", upper(UPPER))
        .reply("lower", lower(LOWER))
        .reply("banners", BANNERS)
        .reply("scroll", r#"{"horizontalScroll":"事业有成"}"#)
}

fn workflow(backend: &Arc<ScriptedBackend>, config: WorkflowConfig) -> CoupletWorkflow<Arc<ScriptedBackend>> {
    CoupletWorkflow::new(client(backend), config).with_catalog(Arc::new(TestCatalog))
}

fn recorded(workflow: &mut CoupletWorkflow<Arc<ScriptedBackend>>) -> ProgressRecorder {
    let recorder = ProgressRecorder::new();
    workflow.set_progress_callback(recorder.clone());
    recorder
}

fn request() -> WorkflowRequest {
    WorkflowRequest::new("事业", "7").unwrap()
}

#[tokio::test]
async fn first_time_success_yields_generated_lines() {
    let backend = Arc::new(happy_backend());
    let history = Arc::new(InMemoryHistory::new());
    let mut workflow = workflow(&backend, WorkflowConfig::default()).with_history(history.clone());
    let recorder = recorded(&mut workflow);

    let report = workflow.execute_workflow_with_report(request()).await;

    let set = report.result.couplets().expect("completed");
    assert_eq!(set.upper_line, UPPER);
    assert_eq!(set.lower_line, LOWER);
    assert_eq!(set.horizontal_scroll, "事业有成");
    assert_eq!(set.banners.len(), 4);
    assert!(set.election.is_none());
    assert!(set.analysis.is_none());

    let events = recorder.events();
    assert_eq!(events.len(), 11);
    assert!(events.iter().all(|e| !e.is_retry));
    assert_eq!(events.last().unwrap().kind, ProgressEventKind::WorkflowCompleted);

    let names: Vec<&str> = report.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        ["topic_analysis", "upper_line", "lower_line", "banners", "horizontal_scroll"]
    );
    assert!(report.steps.iter().all(|s| s.status == StepStatus::Completed));
    assert_eq!(report.candidates.len(), 1);

    let record = history.get_record(report.record_id).unwrap();
    assert_eq!(record.status, RecordStatus::Completed);
    assert_eq!(record.result.as_ref(), Some(set));
    assert_eq!(record.steps.len(), 5);
}

#[tokio::test]
async fn analysis_is_attached_on_request() {
    let backend = Arc::new(happy_backend());
    let workflow = workflow(&backend, WorkflowConfig::default());
    let result = workflow.execute_workflow(request().with_analysis(true)).await;
    let analysis = result.couplets().unwrap().analysis.as_ref().unwrap();
    assert_eq!(analysis.guidance, "事业主题：鹏程、宏图、骏马。");
    assert!(analysis.detail.is_none());
}

#[tokio::test]
async fn attached_analysis_keeps_structured_detail() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .reply(
                "analysis",
                r#"{"themeCore":"事业发展","culturalImagery":["鹏程万里"],"keyNouns":["宏图"],"horizontalDirection":"事业有成"}"#,
            )
            .reply("upper", upper(UPPER))
            .reply("lower", lower(LOWER))
            .reply("banners", BANNERS)
            .reply("scroll", r#"{"horizontalScroll":"事业有成"}"#),
    );
    let workflow = workflow(&backend, WorkflowConfig::default());

    let result = workflow.execute_workflow(request().with_analysis(true)).await;

    let analysis = result.couplets().unwrap().analysis.as_ref().unwrap();
    let detail = analysis.detail.as_ref().unwrap();
    assert_eq!(detail.theme_core, "事业发展");
    assert_eq!(detail.cultural_imagery, ["鹏程万里"]);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["analysis"]["detail"]["themeCore"], "事业发展");
}

#[tokio::test]
async fn wrong_lengths_exhaust_the_budget() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .reply("analysis", "事业")
            .reply("upper", upper("春回大地"))
            .reply("lower", lower("福满人间")),
    );
    let history = Arc::new(InMemoryHistory::new());
    let mut workflow = workflow(&backend, WorkflowConfig::default()).with_history(history.clone());
    let recorder = recorded(&mut workflow);

    let report = workflow.execute_workflow_with_report(request()).await;

    let fallback = report.result.fallback().expect("failed");
    assert!(fallback.should_return_to_home);
    assert!(!fallback.error_message.is_empty());
    assert_eq!(fallback.form_data.topic.as_str(), "事业");
    assert_eq!(report.candidates.len(), 5);
    assert_eq!(backend.calls("upper"), 5);
    assert_eq!(backend.calls("lower"), 5);
    assert_eq!(backend.calls("banners"), 0);

    let events = recorder.events();
    assert!(events.iter().any(|e| e.is_retry && e.retry_count == 4));
    assert_eq!(events.last().unwrap().kind, ProgressEventKind::WorkflowFailed);

    let election = report.steps.iter().find(|s| s.name == "election").unwrap();
    assert_eq!(election.status, StepStatus::Failed);
    assert_eq!(
        history.get_record(report.record_id).unwrap().status,
        RecordStatus::Failed
    );
}

#[tokio::test]
async fn retry_regenerates_both_lines() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .reply("analysis", "事业")
            .replies("upper", [upper("春回大地"), upper(UPPER)])
            .reply("lower", lower(LOWER))
            .reply("banners", BANNERS)
            .reply("scroll", r#"{"horizontalScroll":"事业有成"}"#),
    );
    let mut workflow = workflow(&backend, WorkflowConfig::default());
    let recorder = recorded(&mut workflow);

    let report = workflow.execute_workflow_with_report(request()).await;

    assert_eq!(report.result.couplets().unwrap().upper_line, UPPER);
    assert_eq!(backend.calls("lower"), 2);
    assert_eq!(report.candidates.len(), 2);
    assert_eq!(report.candidates[1].attempt_index, 2);

    let retry = recorder
        .events()
        .into_iter()
        .find(|e| e.kind == ProgressEventKind::StageStarted && e.step_name == "upper_line" && e.is_retry)
        .unwrap();
    assert_eq!(retry.retry_count, 1);
    assert_eq!(retry.step_description, "生成上联 (retry 1)");

    let upper_prompts = backend.prompts("upper");
    assert!(!upper_prompts[0].contains("previous"));
    let reason = validate_line_length("春回大地", 7).reason().to_owned();
    assert!(upper_prompts[1].contains(&format!("previous 春回大地 / {LOWER}: {reason}")));
    assert!(backend.prompts("lower")[1].contains(&reason));

    let upper_steps: Vec<&WorkflowStep> = report.steps.iter().filter(|s| s.name == "upper_line").collect();
    assert_eq!(upper_steps.len(), 2);
    assert_eq!(upper_steps[0].status, StepStatus::Failed);
    assert_eq!(upper_steps[1].status, StepStatus::Completed);
}

#[tokio::test]
async fn review_rejections_lead_to_election() {
    let uppers = ["春回大地千山秀", "鹏程万里展宏图", "福满人间万户欢", "骏马奔腾迎盛世", "金蛇起舞贺新春"];
    let backend = Arc::new(
        ScriptedBackend::new()
            .reply("analysis", "事业")
            .replies("upper", uppers.iter().map(|u| upper(u)))
            .reply("lower", lower(LOWER))
            .reply(
                "review",
                r#"{"passed":false,"errors":[{"type":"对仗","message":"词性不对"}],"suggestions":[]}"#,
            )
            .reply("election", r#"{"selectedIndex":3,"reason":"意境最佳"}"#)
            .reply("banners", BANNERS)
            .reply("scroll", r#"{"horizontalScroll":"事业有成"}"#),
    );
    let workflow = workflow(&backend, WorkflowConfig::default().with_review(true));

    let report = workflow.execute_workflow_with_report(request()).await;

    let set = report.result.couplets().expect("completed");
    assert_eq!(set.upper_line, "福满人间万户欢");
    let election = set.election.as_ref().unwrap();
    assert_eq!(election.selected_index, 2);
    assert_eq!(election.candidate_count, 5);
    assert_eq!(election.reason, "意境最佳");
    assert_eq!(backend.calls("review"), 5);
    assert_eq!(backend.calls("election"), 1);

    let upper_prompts = backend.prompts("upper");
    assert!(upper_prompts[1].contains("previous 春回大地千山秀 / 骏业千秋开新局: 对仗: 词性不对"));
    assert!(upper_prompts[4].contains("previous 骏马奔腾迎盛世"));

    let review = report.steps.iter().find(|s| s.name == "format_review").unwrap();
    assert_eq!(review.error.as_deref(), Some("[对仗] 词性不对"));
}

#[tokio::test]
async fn abort_before_start_emits_one_event() {
    let backend = Arc::new(happy_backend());
    let history = Arc::new(InMemoryHistory::new());
    let mut workflow = workflow(&backend, WorkflowConfig::default()).with_history(history.clone());
    let recorder = recorded(&mut workflow);

    workflow.abort();
    let report = workflow.execute_workflow_with_report(request()).await;

    assert!(report.result.is_aborted());
    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ProgressEventKind::WorkflowAborted);
    assert_eq!(backend.total_calls(), 0);
    assert_eq!(
        history.get_record(report.record_id).unwrap().status,
        RecordStatus::Aborted
    );

    let value = serde_json::to_value(&report.result).unwrap();
    assert_eq!(value["aborted"], true);
}

#[tokio::test]
async fn abort_during_a_call_discards_its_result() {
    let token = CancellationToken::new();
    let backend = Arc::new(happy_backend().cancel_on("upper", token.clone()));
    let mut workflow = workflow(&backend, WorkflowConfig::default()).with_cancellation(token);
    let recorder = recorded(&mut workflow);

    let report = workflow.execute_workflow_with_report(request()).await;

    assert!(report.result.is_aborted());
    assert_eq!(backend.calls("lower"), 0);
    assert!(report.candidates.is_empty());
    let last_step = report.steps.last().unwrap();
    assert_eq!(last_step.name, "upper_line");
    assert_eq!(last_step.error.as_deref(), Some("aborted"));
    assert_eq!(
        recorder.events().last().unwrap().kind,
        ProgressEventKind::WorkflowAborted
    );
}

#[tokio::test]
async fn banner_budget_falls_back_to_defaults() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .reply("analysis", "事业")
            .reply("upper", upper(UPPER))
            .reply("lower", lower(LOWER))
            .reply("banners", r#"{"springScrolls":["马到成功","万事如意","福到"]}"#)
            .reply("scroll", r#"{"horizontalScroll":"事业有成"}"#),
    );
    let config = WorkflowConfig::default().with_banner_count(BannerCount::Six);
    let expected = config.fallback_banners();
    let workflow = workflow(&backend, config);

    let result = workflow.execute_workflow(request()).await;

    assert_eq!(result.couplets().unwrap().banners, expected);
    assert_eq!(expected.len(), 6);
    assert_eq!(backend.calls("banners"), 5);
}

#[tokio::test]
async fn unvalidated_short_defaults_are_topped_up() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .reply("analysis", "事业")
            .reply("upper", upper(UPPER))
            .reply("lower", lower(LOWER))
            .reply("banners", r#"{"springScrolls":["福到"]}"#)
            .reply("scroll", r#"{"horizontalScroll":"事业有成"}"#),
    );
    let config = WorkflowConfig {
        default_banners: vec!["福到".into(), "吉祥".into()],
        ..Default::default()
    }
    .with_banner_count(BannerCount::Six);
    let workflow = workflow(&backend, config);

    let result = workflow.execute_workflow(request()).await;

    let banners = &result.couplets().expect("completed").banners;
    assert_eq!(banners.len(), 6);
    assert!(banners.iter().all(|b| char_count(b) == 4));
}

#[tokio::test]
async fn unusable_default_banners_fail_the_run() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .reply("analysis", "事业")
            .reply("upper", upper(UPPER))
            .reply("lower", lower(LOWER))
            .reply("banners", BANNERS),
    );
    let config = WorkflowConfig {
        banner_chars: 5,
        default_banners: Vec::new(),
        ..Default::default()
    };
    let workflow = workflow(&backend, config);

    let result = workflow.execute_workflow(request()).await;

    assert!(result.fallback().unwrap().should_return_to_home);
    assert_eq!(backend.calls("scroll"), 0);
}

#[test]
fn try_new_rejects_invalid_config() {
    let backend = Arc::new(ScriptedBackend::new());
    let config = WorkflowConfig {
        default_banners: vec!["福到".into()],
        ..Default::default()
    };
    assert!(CoupletWorkflow::try_new(client(&backend), config).is_err());
    assert!(CoupletWorkflow::try_new(client(&backend), WorkflowConfig::default()).is_ok());
}

#[tokio::test]
async fn scroll_failure_uses_default_without_retry() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .reply("analysis", "事业")
            .reply("upper", upper(UPPER))
            .reply("lower", lower(LOWER))
            .reply("banners", BANNERS)
            .fail("scroll"),
    );
    let workflow = workflow(&backend, WorkflowConfig::default());

    let result = workflow.execute_workflow(request()).await;

    assert_eq!(result.couplets().unwrap().horizontal_scroll, "新春大吉");
    assert_eq!(backend.calls("scroll"), 1);
}

#[tokio::test]
async fn failed_analysis_uses_fallback_guidance() {
    let backend = Arc::new(
        ScriptedBackend::new()
            .fail("analysis")
            .reply("upper", upper(UPPER))
            .reply("lower", lower(LOWER))
            .reply("banners", BANNERS)
            .reply("scroll", r#"{"horizontalScroll":"事业有成"}"#),
    );
    let workflow = workflow(&backend, WorkflowConfig::default());

    let report = workflow.execute_workflow_with_report(request()).await;

    assert!(report.result.couplets().is_some());
    assert_eq!(backend.calls("analysis"), 3);
    assert!(report.analysis.unwrap().fallback);
}

struct BrokenHistory;

impl HistorySink for BrokenHistory {
    fn create_record<'a>(&'a self, _id: Uuid, _form_data: &'a FormData) -> BoxFuture<'a, HistoryResult<()>> {
        Box::pin(async { Err(HistoryError::Storage("disk full".into())) })
    }

    fn add_or_update_step<'a>(&'a self, _id: Uuid, _step: &'a WorkflowStep) -> BoxFuture<'a, HistoryResult<()>> {
        Box::pin(async { Err(HistoryError::Storage("disk full".into())) })
    }

    fn update_record_status<'a>(
        &'a self,
        _id: Uuid,
        _status: RecordStatus,
        _result: Option<&'a CoupletSet>,
        _error: Option<&'a str>,
    ) -> BoxFuture<'a, HistoryResult<()>> {
        Box::pin(async { Err(HistoryError::Storage("disk full".into())) })
    }
}

#[tokio::test]
async fn history_failures_do_not_fail_the_run() {
    let backend = Arc::new(happy_backend());
    let workflow = workflow(&backend, WorkflowConfig::default()).with_history(Arc::new(BrokenHistory));
    let result = workflow.execute_workflow(request()).await;
    assert!(result.couplets().is_some());
}

#[test]
fn request_carries_the_form() {
    let request = WorkflowRequest::new("  事业 ", "9").unwrap();
    let form = request.form_data();
    assert_eq!(form.topic.as_str(), "事业");
    assert_eq!(form.word_count.chars(), 9);
    assert_eq!(form.layout, LayoutPrefs::default());
}

#[test]
fn invalid_requests_are_rejected_up_front() {
    assert!(matches!(WorkflowRequest::new("", "7"), Err(RequestError::Topic(_))));
    assert!(matches!(WorkflowRequest::new("事业", "6"), Err(RequestError::Length(_))));
}

fn line(len: usize) -> String {
    "福".repeat(len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn accepted_lines_always_have_the_required_length(
        length in prop_oneof![Just("5"), Just("7"), Just("9")],
        attempts in proptest::collection::vec((1usize..=10, 1usize..=10), 5),
    ) {
        let backend = Arc::new(
            ScriptedBackend::new()
                .reply("analysis", "福")
                .replies("upper", attempts.iter().map(|(u, _)| upper(&line(*u))))
                .replies("lower", attempts.iter().map(|(_, l)| lower(&line(*l))))
                .reply("banners", BANNERS)
                .reply("scroll", r#"{"horizontalScroll":"福满人间"}"#),
        );
        let workflow = workflow(&backend, WorkflowConfig::default());
        let request = WorkflowRequest::new("福", length).unwrap();
        let n: usize = length.parse().unwrap();

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let result = runtime.block_on(workflow.execute_workflow(request));

        let any_compliant = attempts.iter().any(|&(u, l)| u == n && l == n);
        match result.couplets() {
            Some(set) => {
                prop_assert_eq!(char_count(&set.upper_line), n);
                prop_assert_eq!(char_count(&set.lower_line), n);
                prop_assert_eq!(set.banners.len(), 4);
            }
            None => prop_assert!(!any_compliant),
        }
        prop_assert_eq!(result.couplets().is_some(), any_compliant);
    }
}
