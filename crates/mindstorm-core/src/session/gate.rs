//! Submission gate: idea validation and per-author throttling.

use std::collections::HashMap;

use tokio::time::Instant;

use crate::config::SubmissionLimits;
use crate::error::{MindstormError, Result};

/// Per-session guard that validates idea text and slows down spammy authors.
///
/// The gate lives inside the session's write lock, so admission decisions
/// are serialized with the idea list they protect. A rejected submission
/// leaves the author's record untouched.
#[derive(Debug)]
pub struct SubmissionGate {
    limits: SubmissionLimits,
    authors: HashMap<String, AuthorRecord>,
}

#[derive(Debug, Default)]
struct AuthorRecord {
    last_submission: Option<Instant>,
    /// Admission counts per exact (trimmed) text.
    texts: HashMap<String, u32>,
}

impl SubmissionGate {
    pub fn new(limits: SubmissionLimits) -> Self {
        Self {
            limits,
            authors: HashMap::new(),
        }
    }

    /// Validates one submission and records it, returning the trimmed text.
    pub fn admit(&mut self, author: &str, text: &str, now: Instant) -> Result<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(MindstormError::validation("idea text must not be empty"));
        }
        let chars = trimmed.chars().count();
        if chars > self.limits.max_idea_chars {
            return Err(MindstormError::validation(format!(
                "idea exceeds {} characters (got {chars})",
                self.limits.max_idea_chars
            )));
        }

        let record = self.authors.entry(author.to_string()).or_default();

        if self.limits.min_interval_ms > 0 {
            if let Some(last) = record.last_submission {
                if now.duration_since(last) < self.limits.min_interval() {
                    return Err(MindstormError::throttled(format!(
                        "{author} must wait {} ms between ideas",
                        self.limits.min_interval_ms
                    )));
                }
            }
        }

        if self.limits.max_identical_per_author > 0 {
            let count = record.texts.get(trimmed).copied().unwrap_or(0);
            if count >= self.limits.max_identical_per_author {
                return Err(MindstormError::throttled(format!(
                    "{author} already submitted this exact idea"
                )));
            }
        }

        record.last_submission = Some(now);
        if self.limits.max_identical_per_author > 0 {
            *record.texts.entry(trimmed.to_string()).or_insert(0) += 1;
        }
        Ok(trimmed.to_string())
    }
}
