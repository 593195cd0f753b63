#![doc = "Gemini integration: implements the core `GenerationClient` trait over the `generateContent` REST endpoint."]
//
//! # Gemini client (CLI <-> Core)
//!
//! - Construct [`GeminiClient`] with [`GeminiClient::from_env`] (`GEMINI_API_KEY`, falling back to `API_KEY`).
//! - One prompt maps to one `POST {base_url}/models/{model}:generateContent` request. No retries.
//! - HTTP and body failures are mapped onto [`GenerationError`] variants so the pipeline can
//!   surface a readable cause.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reposcripter_core::{GenerationClient, GenerationError};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::load_config::GenerationSection;

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(
        settings: &GenerationSection,
        api_key: Option<String>,
    ) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| GenerationError::NotConfigured(format!("HTTP client: {e}")))?;
        tracing::info!(
            model = %settings.model,
            base_url = %settings.base_url,
            api_key_set = api_key.is_some(),
            "Initialized GeminiClient"
        );
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
        })
    }

    pub fn from_env(settings: &GenerationSection) -> Result<Self, GenerationError> {
        dotenvy::dotenv().ok();
        let api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("Neither GEMINI_API_KEY nor API_KEY is set; generation calls will fail");
        }
        Self::new(settings, api_key)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Pull the generated text out of a `generateContent` response body.
pub fn extract_text(body: &str) -> Result<String, GenerationError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(format!("undecodable body: {e}")))?;

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(GenerationError::MalformedResponse(format!(
            "prompt was blocked: {reason}"
        )));
    }

    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| GenerationError::MalformedResponse("no candidates in response".into()))?;
    let text: String = candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        return Err(GenerationError::MalformedResponse(format!(
            "candidate carried no text (finish reason: {reason})"
        )));
    }
    Ok(text)
}

/// Prefer the service's own error message; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            GenerationError::NotConfigured("set GEMINI_API_KEY or API_KEY".to_string())
        })?;

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Sending generateContent request");
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "generateContent request failed");
                GenerationError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok());
            tracing::warn!(?retry_after_secs, "generateContent rate limited");
            return Err(GenerationError::RateLimited { retry_after_secs });
        }

        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(format!("reading response body: {e}")))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::error!(status = status.as_u16(), "generateContent rejected credentials");
            return Err(GenerationError::Unauthorized {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "generateContent returned an error");
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let generated = extract_text(&text)?;
        tracing::debug!(response_len = generated.len(), "generateContent succeeded");
        Ok(generated)
    }
}
