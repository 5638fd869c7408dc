//! Classifier backends for mindstorm.
//!
//! Concrete [`Classifier`](mindstorm_core::classifier::Classifier)
//! implementations that call LLM HTTP APIs directly, plus the secrets file
//! they are configured from. Retry and timeout policy lives in
//! `mindstorm-core`; these clients only label each failure as retryable or
//! not.

pub mod claude;
pub mod config;
pub mod gemini;
pub mod provider;

pub use claude::{ClaudeClassifier, DEFAULT_CLAUDE_MODEL};
pub use config::{ProviderSecret, SecretConfig, load_secret_config};
pub use gemini::{DEFAULT_GEMINI_MODEL, GeminiClassifier};
pub use provider::Provider;
