//! AI fallback over an OpenRouter-style chat-completions endpoint. Every
//! query the local matcher cannot resolve ends up here with the full
//! session history, so the model can handle follow-ups itself. Failures
//! are mapped to fixed, user-facing apology strings; the resolver never
//! sees an error from this module.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::history::{ChatTurn, Role};

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "mistralai/mistral-small-3.1-24b-instruct:free";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 150;

/// Prepended when the history carries no system turn of its own.
const SYSTEM_PROMPT: &str = "You are Sage, the information assistant for Juniper Hill Public \
School and its annual conclave of inter-school events. Use the full conversation to resolve \
follow-up questions, stay factual about the school, and keep answers friendly and under 60 words.";

#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("AI fallback is not configured")]
    NotConfigured,
    #[error("AI request timed out")]
    Timeout,
    #[error("could not reach the AI service: {0}")]
    Transport(String),
    #[error("AI service rate limit hit")]
    RateLimited,
    #[error("AI service returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("could not parse the AI service response")]
    MalformedPayload,
}

impl FallbackError {
    /// The canned reply shown to the user for this failure. Stable strings,
    /// asserted by tests; the operator-facing detail goes to the log
    /// instead.
    pub fn user_message(&self) -> String {
        match self {
            FallbackError::NotConfigured => {
                "Sorry, AI service is not configured. Please set OPENROUTER_API_KEY environment variable.".to_string()
            }
            FallbackError::Timeout => {
                "Sorry, the AI service is taking too long to respond. Please try again.".to_string()
            }
            FallbackError::Transport(_) => {
                "Sorry, I couldn't connect to the AI service. Please check your internet connection.".to_string()
            }
            FallbackError::RateLimited => {
                "Sorry, the AI service is temporarily busy. Please try again later.".to_string()
            }
            FallbackError::Api { message, .. } => {
                format!("Sorry, the AI service returned an error: {message}")
            }
            FallbackError::MalformedPayload => {
                "Sorry, I couldn't get an answer from the AI service.".to_string()
            }
        }
    }
}

/// HTTP client for the chat-completions endpoint. Cheap to share: reqwest
/// clients are internally reference-counted.
#[derive(Debug, Clone)]
pub struct FallbackClient {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
    referer: String,
}

impl FallbackClient {
    pub fn new(
        api_url: String,
        model: String,
        api_key: Option<String>,
        referer: String,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;
        Ok(FallbackClient {
            http,
            api_url,
            model,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            referer,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Ask the model to answer the last user turn given the whole history.
    /// Always returns something presentable: the model's reply on success,
    /// the matching apology string on failure.
    pub async fn complete(&self, turns: &[ChatTurn]) -> String {
        match self.request_completion(turns).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "AI fallback failed");
                e.user_message()
            }
        }
    }

    async fn request_completion(&self, turns: &[ChatTurn]) -> Result<String, FallbackError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(FallbackError::NotConfigured);
        };

        let payload = self.build_payload(turns);
        debug!(turns = turns.len(), model = %self.model, "requesting AI completion");

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .header("Referer", self.referer.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FallbackError::Timeout
                } else {
                    FallbackError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        // Parse the body before checking the status: rate-limit and error
        // details ride in the JSON even on non-2xx responses.
        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                FallbackError::Timeout
            } else {
                FallbackError::MalformedPayload
            }
        })?;

        if status.as_u16() == 429 || error_code(&body) == Some(429) {
            return Err(FallbackError::RateLimited);
        }
        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            return Err(FallbackError::Api {
                status: status.as_u16(),
                message,
            });
        }

        extract_content(&body).ok_or(FallbackError::MalformedPayload)
    }

    fn build_payload(&self, turns: &[ChatTurn]) -> Value {
        let mut messages: Vec<Value> = Vec::with_capacity(turns.len() + 1);
        if !turns.iter().any(|turn| turn.role == Role::System) {
            messages.push(json!({"role": "system", "content": SYSTEM_PROMPT}));
        }
        for turn in turns {
            messages.push(json!({"role": turn.role.as_str(), "content": turn.content}));
        }
        json!({
            "model": self.model,
            "messages": messages,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        })
    }
}

/// Some providers signal rate limiting inside a 200 body instead of the
/// status line.
fn error_code(body: &Value) -> Option<i64> {
    body.get("error")?.get("code")?.as_i64()
}

fn extract_content(body: &Value) -> Option<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
}
