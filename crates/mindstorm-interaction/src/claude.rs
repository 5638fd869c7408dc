//! Claude classifier: direct REST client for the Anthropic messages API.
//!
//! Configuration priority: ~/.config/mindstorm/secret.json > environment
//! variables (ANTHROPIC_API_KEY, MINDSTORM_CLAUDE_MODEL).

use async_trait::async_trait;
use mindstorm_core::classifier::{Classifier, ClassifierError};
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::config::load_secret_config;

pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-6";
const BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Classifier that talks to the Claude HTTP API.
#[derive(Clone)]
pub struct ClaudeClassifier {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ClaudeClassifier {
    /// Creates a new classifier with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Loads configuration from ~/.config/mindstorm/secret.json or
    /// environment variables.
    ///
    /// Model name defaults to `claude-sonnet-4-6` if not specified.
    pub fn try_from_env() -> Result<Self, ClassifierError> {
        if let Ok(secret) = load_secret_config() {
            if let Some(claude) = secret.claude {
                let model = claude
                    .model_name
                    .unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string());
                return Ok(Self::new(claude.api_key, model));
            }
        }

        let api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| {
            ClassifierError::configuration(
                "ANTHROPIC_API_KEY not found in ~/.config/mindstorm/secret.json or environment variables",
            )
        })?;
        let model =
            env::var("MINDSTORM_CLAUDE_MODEL").unwrap_or_else(|_| DEFAULT_CLAUDE_MODEL.into());
        Ok(Self::new(api_key, model))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sends a minimal request to check that the key is accepted.
    pub async fn verify_key(&self) -> Result<(), ClassifierError> {
        let request = CreateMessageRequest {
            model: self.model.clone(),
            messages: vec![Message::user("ping")],
            max_tokens: 1,
        };
        self.send_request(&request).await.map(|_| ())
    }

    async fn send_request(&self, body: &CreateMessageRequest) -> Result<String, ClassifierError> {
        tracing::debug!(model = %self.model, "sending Claude request");
        let response = self
            .client
            .post(BASE_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| {
                ClassifierError::transport(
                    format!("Claude API request failed: {err}"),
                    err.is_connect() || err.is_timeout(),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Claude error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let parsed: CreateMessageResponse = response.json().await.map_err(|err| {
            ClassifierError::api(None, format!("Failed to parse Claude response: {err}"), false)
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl Classifier for ClaudeClassifier {
    fn model_tag(&self) -> String {
        self.model.clone()
    }

    async fn classify(&self, prompt: &str) -> Result<String, ClassifierError> {
        let request = CreateMessageRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompt)],
            max_tokens: self.max_tokens,
        };
        self.send_request(&request).await
    }
}

#[derive(Serialize)]
struct CreateMessageRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

impl Message {
    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlockResponse>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlockResponse {
    #[serde(rename = "text")]
    Text { text: String },
    /// Non-text blocks are skipped when extracting the reply.
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    r#type: String,
    message: String,
}

fn extract_text_response(response: CreateMessageResponse) -> Result<String, ClassifierError> {
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlockResponse::Text { text } => Some(text),
            ContentBlockResponse::Other => None,
        })
        .ok_or(ClassifierError::EmptyResponse)
}

fn map_http_error(
    status: StatusCode,
    body: String,
    retry_after: Option<Duration>,
) -> ClassifierError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.clone());

    let is_retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    match retry_after {
        Some(delay) => {
            ClassifierError::api_with_retry_after(status.as_u16(), message, is_retryable, delay)
        }
        None => ClassifierError::api(Some(status.as_u16()), message, is_retryable),
    }
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // Retry-After HTTP-date parsing is omitted for simplicity
    None
}
