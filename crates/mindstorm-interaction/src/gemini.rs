//! Gemini classifier: direct REST client for the generateContent API.
//!
//! Configuration priority: ~/.config/mindstorm/secret.json > environment
//! variables (GEMINI_API_KEY, MINDSTORM_GEMINI_MODEL).

use async_trait::async_trait;
use mindstorm_core::classifier::{Classifier, ClassifierError};
use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::config::load_secret_config;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Classifier that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiClassifier {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClassifier {
    /// Creates a new classifier with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Loads configuration from ~/.config/mindstorm/secret.json or
    /// environment variables.
    ///
    /// Model name defaults to `gemini-2.5-flash` if not specified.
    pub fn try_from_env() -> Result<Self, ClassifierError> {
        if let Ok(secret) = load_secret_config() {
            if let Some(gemini) = secret.gemini {
                let model = gemini
                    .model_name
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
                return Ok(Self::new(gemini.api_key, model));
            }
        }

        let api_key = env::var("GEMINI_API_KEY").map_err(|_| {
            ClassifierError::configuration(
                "GEMINI_API_KEY not found in ~/.config/mindstorm/secret.json or environment variables",
            )
        })?;
        let model =
            env::var("MINDSTORM_GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.into());
        Ok(Self::new(api_key, model))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sends a minimal request to check that the key is accepted.
    pub async fn verify_key(&self) -> Result<(), ClassifierError> {
        self.send_request("ping").await.map(|_| ())
    }

    fn request_url(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            BASE_URL, self.model, self.api_key
        )
    }

    async fn send_request(&self, prompt: &str) -> Result<String, ClassifierError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        tracing::debug!(model = %self.model, "sending Gemini request");
        let response = self
            .client
            .post(self.request_url())
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                ClassifierError::transport(
                    format!("Gemini API request failed: {err}"),
                    err.is_connect() || err.is_timeout(),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text, retry_after));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            ClassifierError::api(None, format!("Failed to parse Gemini response: {err}"), false)
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl Classifier for GeminiClassifier {
    fn model_tag(&self) -> String {
        self.model.clone()
    }

    async fn classify(&self, prompt: &str) -> Result<String, ClassifierError> {
        self.send_request(prompt).await
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<PartResponse>>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[allow(dead_code)]
    code: Option<u32>,
    message: String,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, ClassifierError> {
    response
        .candidates
        .into_iter()
        .flatten()
        .filter_map(|candidate| candidate.content)
        .filter_map(|content| content.parts)
        .flatten()
        .find_map(|part| part.text)
        .ok_or(ClassifierError::EmptyResponse)
}

fn map_http_error(
    status: StatusCode,
    body: String,
    retry_after: Option<Duration>,
) -> ClassifierError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| match wrapper.error.status {
            Some(api_status) => format!("{}: {}", api_status, wrapper.error.message),
            None => wrapper.error.message,
        })
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
    value.parse::<u64>().ok().map(Duration::from_secs)
}
