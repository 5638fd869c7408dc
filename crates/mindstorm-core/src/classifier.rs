//! Classifier seam between the analysis pipeline and concrete LLM backends.
//!
//! The pipeline only needs "prompt in, raw text out" plus enough error detail
//! to decide whether a retry makes sense. Concrete HTTP clients live in
//! `mindstorm-interaction`; tests plug in local fakes.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors a classifier backend can report.
#[derive(Error, Debug, Clone)]
pub enum ClassifierError {
    /// The request never reached the backend or the connection dropped.
    #[error("classifier transport error: {message}")]
    Transport { message: String, retryable: bool },

    /// The backend answered with a non-success status.
    #[error("classifier API error: {message}")]
    Api {
        status: Option<u16>,
        message: String,
        retryable: bool,
        retry_after: Option<Duration>,
    },

    /// The backend replied without any usable text content.
    #[error("classifier returned an empty response")]
    EmptyResponse,

    /// Local setup problems, e.g. a missing API key.
    #[error("classifier configuration error: {message}")]
    Configuration { message: String },
}

impl ClassifierError {
    pub fn transport(message: impl Into<String>, retryable: bool) -> Self {
        Self::Transport {
            message: message.into(),
            retryable,
        }
    }

    pub fn api(status: Option<u16>, message: impl Into<String>, retryable: bool) -> Self {
        Self::Api {
            status,
            message: message.into(),
            retryable,
            retry_after: None,
        }
    }

    pub fn api_with_retry_after(
        status: u16,
        message: impl Into<String>,
        retryable: bool,
        retry_after: Duration,
    ) -> Self {
        Self::Api {
            status: Some(status),
            message: message.into(),
            retryable,
            retry_after: Some(retry_after),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// True when the same request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { retryable, .. } | Self::Api { retryable, .. } => *retryable,
            Self::EmptyResponse => true,
            Self::Configuration { .. } => false,
        }
    }

    /// Server-suggested delay before the next attempt, when one was given.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Api { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// A backend able to turn a classification prompt into a raw text reply.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Short identifier of the backing model, recorded on generated mindmaps.
    fn model_tag(&self) -> String;

    /// Sends one classification prompt and returns the raw model reply.
    async fn classify(&self, prompt: &str) -> Result<String, ClassifierError>;
}
