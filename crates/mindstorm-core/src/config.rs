//! Runtime configuration for sessions, analysis and lifecycle management.
//!
//! All values have working defaults, so a missing or partial config file is
//! fine. The file is TOML and lives at `~/.config/mindstorm/config.toml`
//! (platform equivalent via `dirs`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level configuration, assembled from the `[limits]`, `[codes]`,
/// `[analysis]` and `[lifecycle]` sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MindstormConfig {
    pub limits: SubmissionLimits,
    pub codes: CodeConfig,
    pub analysis: AnalysisConfig,
    pub lifecycle: LifecycleConfig,
}

impl MindstormConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Default config file location (`<config_dir>/mindstorm/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mindstorm").join("config.toml"))
    }

    /// Loads from the default location, falling back to defaults when the
    /// file is absent or unreadable.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "failed to load config, using defaults");
            Self::default()
        })
    }
}

/// Per-submission guardrails enforced before an idea enters a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionLimits {
    /// Maximum length of a single idea, in characters.
    pub max_idea_chars: usize,
    /// Maximum length of a session topic, in characters.
    pub max_topic_chars: usize,
    /// Minimum time between two submissions by the same author, in
    /// milliseconds. Zero disables the check.
    pub min_interval_ms: u64,
    /// How many times one author may submit the exact same text within a
    /// session. Zero disables the check.
    pub max_identical_per_author: u32,
}

impl Default for SubmissionLimits {
    fn default() -> Self {
        Self {
            max_idea_chars: 500,
            max_topic_chars: 200,
            min_interval_ms: 750,
            max_identical_per_author: 1,
        }
    }
}

impl SubmissionLimits {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// Shape of generated session codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    /// Number of characters in a session code.
    pub length: usize,
    /// How many collisions to tolerate before giving up on code generation.
    pub max_attempts: u32,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            length: 6,
            max_attempts: 8,
        }
    }
}

/// Retry and timeout policy for classifier calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Per-attempt timeout for a single classifier call, in milliseconds.
    pub request_timeout_ms: u64,
    /// Total attempts (first call plus retries) before giving up.
    pub max_attempts: u32,
    /// Base delay of the exponential backoff between attempts, in
    /// milliseconds.
    pub backoff_base_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            max_attempts: 3,
            backoff_base_ms: 500,
        }
    }
}

impl AnalysisConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Backoff before the given retry, doubling per completed attempt.
    /// `attempt` is 1-based and names the attempt that just failed.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(8);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

/// Idle-session eviction and event fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Sessions untouched for this long are closed and evicted, in seconds.
    pub idle_timeout_secs: u64,
    /// How often the eviction sweep runs, in seconds.
    pub sweep_interval_secs: u64,
    /// Buffered events per session channel before slow subscribers skip.
    pub event_capacity: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3600,
            sweep_interval_secs: 60,
            event_capacity: 256,
        }
    }
}

impl LifecycleConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = MindstormConfig::default();
        assert_eq!(config.limits.max_idea_chars, 500);
        assert_eq!(config.limits.min_interval_ms, 750);
        assert_eq!(config.codes.length, 6);
        assert_eq!(config.analysis.max_attempts, 3);
        assert_eq!(config.lifecycle.idle_timeout_secs, 3600);
        assert_eq!(config.lifecycle.event_capacity, 256);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[limits]\nmax_idea_chars = 120").unwrap();

        let config = MindstormConfig::load(file.path()).unwrap();
        assert_eq!(config.limits.max_idea_chars, 120);
        // Untouched sections and fields fall back to defaults.
        assert_eq!(config.limits.max_topic_chars, 200);
        assert_eq!(config.codes.length, 6);
        assert_eq!(config.analysis.request_timeout_ms, 30_000);
    }

    #[test]
    fn test_invalid_file_is_serialization_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "limits = 'not a table'").unwrap();

        let err = MindstormConfig::load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::MindstormError::Serialization { .. }
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = MindstormConfig::load("/nonexistent/mindstorm.toml").unwrap_err();
        assert!(matches!(err, crate::error::MindstormError::Io { .. }));
    }

    #[test]
    fn test_backoff_doubles() {
        let analysis = AnalysisConfig::default();
        assert_eq!(analysis.backoff(1), Duration::from_millis(500));
        assert_eq!(analysis.backoff(2), Duration::from_millis(1000));
        assert_eq!(analysis.backoff(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_duration_helpers() {
        let limits = SubmissionLimits::default();
        assert_eq!(limits.min_interval(), Duration::from_millis(750));
        let lifecycle = LifecycleConfig::default();
        assert_eq!(lifecycle.idle_timeout(), Duration::from_secs(3600));
        assert_eq!(lifecycle.sweep_interval(), Duration::from_secs(60));
    }
}
