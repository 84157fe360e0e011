use chunlian::{
    Settings, WorkflowRequest,
    types::workflow::{ProgressEvent, ProgressEventKind},
};
use tracing_subscriber::EnvFilter;

/// # Couplet demo – one full run against an OpenAI-compatible endpoint
///
/// Prints every progress event as it happens and the final result as JSON.
/// Ctrl-C aborts the run.
///
/// ```bash
/// export CHUNLIAN_API_KEY=sk-…                           # mandatory
/// export CHUNLIAN_API_BASE_URL=https://api.deepseek.com/v1
/// export CHUNLIAN_MODEL=deepseek-chat
/// RUST_LOG=chunlian_workflow=debug \
///   cargo run -p chunlian --example couplet_demo -- 事业 7
/// ```
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let topic = args.next().unwrap_or_else(|| "阖家幸福".to_owned());
    let word_count = args.next().unwrap_or_else(|| "7".to_owned());

    let settings = Settings::load(None)?;
    let mut workflow = chunlian::connect(&settings.llm, settings.workflow)?;
    workflow.set_progress_callback(|event: &ProgressEvent| {
        if event.kind.is_terminal() {
            println!("■ {}", event.step_description);
            return;
        }
        match event.kind {
            ProgressEventKind::StageStarted => println!("▶ {}", event.step_description),
            ProgressEventKind::StageCompleted => println!("✔ {}", event.step_description),
            _ => println!(
                "✘ {}: {}",
                event.step_description,
                event.error.as_deref().unwrap_or("unknown error")
            ),
        }
    });

    let token = workflow.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let request = WorkflowRequest::new(topic, &word_count)?.with_analysis(true);
    let form = request.form_data();
    println!("主题：{}（{}）", form.topic, form.word_count.label());
    let result = workflow.execute_workflow(request).await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
