//! Provider registry: choose a classifier backend by name.

use std::sync::Arc;

use mindstorm_core::classifier::{Classifier, ClassifierError};
use strum_macros::{Display, EnumIter, EnumString};

use crate::claude::{ClaudeClassifier, DEFAULT_CLAUDE_MODEL};
use crate::gemini::{DEFAULT_GEMINI_MODEL, GeminiClassifier};

/// Supported classifier backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Provider {
    Claude,
    Gemini,
}

impl Provider {
    /// The model used when neither secret.json nor the environment names one.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Claude => DEFAULT_CLAUDE_MODEL,
            Self::Gemini => DEFAULT_GEMINI_MODEL,
        }
    }

    /// Builds the classifier for this provider from secret.json or the
    /// environment.
    pub fn classifier_from_env(self) -> Result<Arc<dyn Classifier>, ClassifierError> {
        match self {
            Self::Claude => Ok(Arc::new(ClaudeClassifier::try_from_env()?)),
            Self::Gemini => Ok(Arc::new(GeminiClassifier::try_from_env()?)),
        }
    }
}
