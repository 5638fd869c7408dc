use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the session and analysis layers.
///
/// Variants are grouped by how callers are expected to react: input problems
/// (`Validation`, `Throttled`), lookup problems (`NotFound`), lifecycle
/// conflicts (`AlreadyInProgress`, `SessionClosed`, `AnalysisCancelled`) and
/// classifier trouble (`AnalysisUnavailable`, `AnalysisMalformed`).
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum MindstormError {
    /// Caller input was rejected before any state changed.
    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A mindmap generation is already running for this session.
    #[error("analysis already in progress for session {code}")]
    AlreadyInProgress { code: String },

    /// The session is closed and no longer accepts mutations.
    #[error("session {code} is closed")]
    SessionClosed { code: String },

    /// The classifier could not be reached or kept failing. Session state is
    /// untouched, so the same generation can simply be retried.
    #[error("analysis unavailable: {message}")]
    AnalysisUnavailable { message: String },

    /// The classifier answered, but the payload could not be turned into a
    /// usable tree even after repair.
    #[error("analysis response malformed: {message}")]
    AnalysisMalformed { message: String },

    /// The generation was cancelled (session closed) before a result could be
    /// stored.
    #[error("analysis cancelled for session {code}")]
    AnalysisCancelled { code: String },

    #[error("mindmap rendering failed: {message}")]
    RenderFailed { message: String },

    /// An author is submitting faster or more repetitively than the session
    /// limits allow.
    #[error("submission rejected: {message}")]
    Throttled { message: String },

    /// A bounded retry loop ran out of attempts, e.g. session code generation
    /// against a saturated code space.
    #[error("resource exhausted: {message}")]
    ResourceExhausted { message: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },

    #[error("io error: {message}")]
    Io { message: String },
}

impl MindstormError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn already_in_progress(code: impl Into<String>) -> Self {
        Self::AlreadyInProgress { code: code.into() }
    }

    pub fn session_closed(code: impl Into<String>) -> Self {
        Self::SessionClosed { code: code.into() }
    }

    pub fn analysis_unavailable(message: impl Into<String>) -> Self {
        Self::AnalysisUnavailable {
            message: message.into(),
        }
    }

    pub fn analysis_malformed(message: impl Into<String>) -> Self {
        Self::AnalysisMalformed {
            message: message.into(),
        }
    }

    pub fn analysis_cancelled(code: impl Into<String>) -> Self {
        Self::AnalysisCancelled { code: code.into() }
    }

    pub fn render_failed(message: impl Into<String>) -> Self {
        Self::RenderFailed {
            message: message.into(),
        }
    }

    pub fn throttled(message: impl Into<String>) -> Self {
        Self::Throttled {
            message: message.into(),
        }
    }

    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Self::ResourceExhausted {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// True when retrying the same call later can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AnalysisUnavailable { .. } | Self::Throttled { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<serde_json::Error> for MindstormError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<toml::de::Error> for MindstormError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for MindstormError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MindstormError>;
