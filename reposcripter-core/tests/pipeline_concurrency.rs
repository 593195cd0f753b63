mod support;

use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use reposcripter_core::{
    FixtureSnapshot, Pipeline, PipelineConfig, PipelineError, SourceFile, StaticSnapshot,
};
use support::{status_recorder, EventLog, HangingClient, ScriptedClient};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Layer, Registry};

fn three_file_snapshot() -> StaticSnapshot {
    StaticSnapshot::new(vec![
        SourceFile::new("a.js", "// a"),
        SourceFile::new("b.js", "// b"),
        SourceFile::new("c.js", "// c"),
    ])
}

#[tokio::test]
async fn test_parallel_summaries_keep_enumeration_order() {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let client = Arc::new(
        ScriptedClient::new()
            .with_log(log.clone())
            .with_slow_path("a.js", Duration::from_millis(50)),
    );
    let config = PipelineConfig {
        summary_concurrency: 3,
        sections: Vec::new(),
        ..PipelineConfig::default()
    };
    let mut run = Pipeline::new(client.clone(), Arc::new(three_file_snapshot()))
        .with_config(config)
        .run("letters", status_recorder(log.clone()))
        .unwrap();
    while let Some(item) = run.next_fragment().await {
        item.unwrap();
    }

    let order: Vec<&str> = run.summaries().iter().map(|s| s.path.as_str()).collect();
    assert_eq!(order, vec!["a.js", "b.js", "c.js"]);

    let prompts = client.recorded();
    let synthesis = prompts.last().unwrap();
    let a = synthesis.find("**a.js**").unwrap();
    let b = synthesis.find("**b.js**").unwrap();
    let c = synthesis.find("**c.js**").unwrap();
    assert!(a < b && b < c);

    // Every per-file status is reported before the first summarize call.
    let events = log.lock().unwrap().clone();
    let first_call = events.iter().position(|e| e.starts_with("call:")).unwrap();
    let statuses = events[..first_call]
        .iter()
        .filter(|e| e.starts_with("status:Summarizing"))
        .count();
    assert_eq!(statuses, 3);
}

#[tokio::test]
async fn test_cancelled_run_makes_no_further_calls() {
    let client = Arc::new(ScriptedClient::new());
    let mut run = Pipeline::new(client.clone(), Arc::new(FixtureSnapshot))
        .run("acme/widget-api", |_: &str| {})
        .unwrap();
    let token = run.cancellation_token();

    assert_eq!(run.next_fragment().await.unwrap().unwrap(), "# widget-api\n\n");
    token.cancel();
    let err = run.next_fragment().await.unwrap().unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled));
    assert!(run.next_fragment().await.is_none());
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_cancellation_interrupts_in_flight_call() {
    let token = CancellationToken::new();
    let mut run = Pipeline::new(Arc::new(HangingClient), Arc::new(FixtureSnapshot))
        .run("acme/widget-api", |_: &str| {})
        .unwrap()
        .with_cancellation(token.clone());

    run.next_fragment().await.unwrap().unwrap();
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let outcome = tokio::time::timeout(Duration::from_secs(5), run.next_fragment())
        .await
        .expect("cancellation should end the hanging call");
    assert!(matches!(outcome, Some(Err(PipelineError::Cancelled))));
    canceller.await.unwrap();
}

#[tokio::test]
async fn test_stream_is_lazy_and_can_be_abandoned() {
    let client = Arc::new(ScriptedClient::new());
    let run = Pipeline::new(client.clone(), Arc::new(FixtureSnapshot))
        .run("acme/widget-api", |_: &str| {})
        .unwrap();
    assert_eq!(client.call_count(), 0, "nothing runs before polling");

    let first: Vec<_> = run.into_stream().take(1).collect().await;
    assert_eq!(first.len(), 1);
    assert_eq!(client.call_count(), 0, "abandoning after the title issues no calls");
}

#[tokio::test]
async fn test_stream_fragments_concatenate_to_document() {
    let fragments: Vec<String> = Pipeline::new(Arc::new(ScriptedClient::new()), Arc::new(FixtureSnapshot))
        .run("acme/widget-api", |_: &str| {})
        .unwrap()
        .into_stream()
        .map(|f| f.unwrap())
        .collect()
        .await;

    assert_eq!(fragments.len(), 5);
    assert!(fragments.concat().starts_with("# widget-api\n\n<OVERVIEW>\n\n## Installation"));
}

#[tokio::test]
async fn test_concurrent_runs_do_not_interfere() {
    let pipeline = Pipeline::new(Arc::new(ScriptedClient::new()), Arc::new(FixtureSnapshot));
    let first = pipeline.run("acme/first", |_: &str| {}).unwrap();
    let second = pipeline.run("acme/second", |_: &str| {}).unwrap();
    assert_ne!(first.run_id(), second.run_id());

    let (first, second) = tokio::join!(first.collect_document(), second.collect_document());
    let (first, second) = (first.unwrap(), second.unwrap());
    assert!(first.starts_with("# first\n\n"));
    assert!(second.starts_with("# second\n\n"));
    assert_eq!(
        first.trim_start_matches("# first\n\n"),
        second.trim_start_matches("# second\n\n")
    );
}

/// Collects the `message` field of every `WARN` event.
struct WarningCollector {
    warnings: Arc<Mutex<Vec<String>>>,
}

struct MessageVisitor<'a>(&'a mut String);

impl tracing::field::Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.0, "{value:?}");
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for WarningCollector {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == tracing::Level::WARN {
            let mut msg = String::new();
            event.record(&mut MessageVisitor(&mut msg));
            self.warnings.lock().unwrap().push(msg);
        }
    }
}

#[tokio::test]
async fn test_missing_summary_is_logged_as_warning() {
    let warnings = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Registry::default().with(WarningCollector {
        warnings: warnings.clone(),
    });
    let _guard = tracing::subscriber::set_default(subscriber);

    Pipeline::new(Arc::new(ScriptedClient::new()), Arc::new(FixtureSnapshot))
        .with_filter(|f: &SourceFile| f.path == "server.js")
        .run("acme/widget-api", |_: &str| {})
        .unwrap()
        .collect_document()
        .await
        .unwrap();

    let warnings = warnings.lock().unwrap();
    assert_eq!(warnings.len(), 1, "only the routes lookup is missing: {warnings:?}");
    assert!(warnings[0].contains("No summary for referenced file"));
}
