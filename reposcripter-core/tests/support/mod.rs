//! Shared stubs for pipeline integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reposcripter_core::{GenerationClient, GenerationError};

pub type EventLog = Arc<Mutex<Vec<String>>>;

fn between<'a>(haystack: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = haystack.find(start)? + start.len();
    let len = haystack[from..].find(end)?;
    Some(&haystack[from..from + len])
}

/// What kind of prompt this is, as `summary:<path>`, `section:<title>` or `overview`.
pub fn classify(prompt: &str) -> String {
    if let Some(path) = between(prompt, "File Path: `", "`") {
        format!("summary:{path}")
    } else if let Some(title) = between(prompt, "write the \"", "\" section") {
        format!("section:{title}")
    } else {
        "overview".to_string()
    }
}

/// Deterministic canned text per prompt kind.
pub fn canned_response(prompt: &str) -> String {
    let kind = classify(prompt);
    if let Some(path) = kind.strip_prefix("summary:") {
        format!("<SUMMARY:{path}>")
    } else if let Some(title) = kind.strip_prefix("section:") {
        format!("<SECTION:{title}>")
    } else {
        "<OVERVIEW>".to_string()
    }
}

/// Records every prompt, optionally fails on the n-th call (1-based) and
/// optionally delays summaries of chosen paths.
#[derive(Default)]
pub struct ScriptedClient {
    pub prompts: Mutex<Vec<String>>,
    pub fail_on: Option<usize>,
    pub log: Option<EventLog>,
    pub slow_paths: Vec<(String, Duration)>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn with_slow_path(mut self, path: &str, delay: Duration) -> Self {
        self.slow_paths.push((path.to_string(), delay));
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn recorded(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };
        let kind = classify(prompt);
        if let Some(log) = &self.log {
            log.lock().unwrap().push(format!("call:{kind}"));
        }
        let delay = self
            .slow_paths
            .iter()
            .find(|(path, _)| kind == format!("summary:{path}"))
            .map(|(_, d)| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on == Some(call) {
            return Err(GenerationError::Api {
                status: 503,
                message: format!("stub failure on call {call}"),
            });
        }
        Ok(canned_response(prompt))
    }
}

/// Never answers; used to hold a call in flight.
pub struct HangingClient;

#[async_trait]
impl GenerationClient for HangingClient {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        futures::future::pending::<()>().await;
        Ok(String::new())
    }
}

/// Status callback that appends `status:<message>` to `log`.
pub fn status_recorder(log: EventLog) -> impl FnMut(&str) + Send {
    move |message: &str| log.lock().unwrap().push(format!("status:{message}"))
}
