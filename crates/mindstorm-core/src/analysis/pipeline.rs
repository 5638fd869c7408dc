//! The analysis pipeline: prompt, classifier call with retries, validation
//! and tree assembly.
//!
//! The pipeline never touches session state. It works on a frozen idea
//! snapshot and reports errors; attaching results and reopening the session
//! is the caller's job. Transport trouble is retried with backoff, honoring
//! a server-provided retry delay when one was given. A malformed reply is
//! not retried: the model already answered, asking again burns quota for
//! the same likely outcome.

use std::sync::Arc;

use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::classifier::Classifier;
use crate::config::AnalysisConfig;
use crate::error::{MindstormError, Result};
use crate::mindmap::{MindmapNode, UnclusteredIdea};
use crate::session::{Idea, SessionCode};

use super::prompt::build_prompt;
use super::response::parse_response;
use super::validate::{ValidatedTree, validate_tree};

/// Output of one analysis, before rendering.
#[derive(Debug)]
pub struct AnalysisOutcome {
    /// Root of the tree; its label is the session topic.
    pub root: MindmapNode,
    pub summary: Option<String>,
    pub unclustered: Vec<UnclusteredIdea>,
    pub warnings: Vec<String>,
    /// Tag of the model that produced the tree.
    pub model: String,
}

pub struct AnalysisPipeline {
    classifier: Arc<dyn Classifier>,
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    pub fn new(classifier: Arc<dyn Classifier>, config: AnalysisConfig) -> Self {
        Self { classifier, config }
    }

    /// Runs one full analysis over a frozen idea snapshot.
    pub async fn analyse(
        &self,
        code: &SessionCode,
        topic: &str,
        ideas: &[Idea],
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutcome> {
        if ideas.is_empty() {
            return Err(MindstormError::validation(
                "cannot analyse an empty idea snapshot",
            ));
        }

        tracing::info!(code = %code, ideas = ideas.len(), "analysis started");
        let prompt = build_prompt(topic, ideas);
        let raw = self.call_with_retry(code, &prompt, cancel).await?;
        let tree = parse_response(&raw)?;
        let ValidatedTree {
            nodes,
            summary,
            unclustered,
            warnings,
        } = validate_tree(tree, ideas);

        for warning in &warnings {
            tracing::warn!(code = %code, "mindmap repair: {warning}");
        }

        let mut root = MindmapNode::new(topic);
        root.children = nodes;

        tracing::info!(
            code = %code,
            nodes = root.node_count() - 1,
            unclustered = unclustered.len(),
            "analysis finished"
        );
        Ok(AnalysisOutcome {
            root,
            summary,
            unclustered,
            warnings,
            model: self.classifier.model_tag(),
        })
    }

    async fn call_with_retry(
        &self,
        code: &SessionCode,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(code = %code, "analysis cancelled during classifier call");
                    return Err(MindstormError::analysis_cancelled(code.as_str()));
                }
                outcome = timeout(self.config.request_timeout(), self.classifier.classify(prompt)) => outcome,
            };

            let (message, retry_after) = match outcome {
                Ok(Ok(reply)) => return Ok(reply),
                Ok(Err(err)) if !err.is_retryable() => {
                    return Err(MindstormError::analysis_unavailable(format!(
                        "classifier failed: {err}"
                    )));
                }
                Ok(Err(err)) => (format!("classifier failed: {err}"), err.retry_after()),
                Err(_) => (
                    format!(
                        "classifier call timed out after {} ms",
                        self.config.request_timeout_ms
                    ),
                    None,
                ),
            };

            if attempt >= self.config.max_attempts {
                tracing::warn!(code = %code, attempt, "analysis giving up: {message}");
                return Err(MindstormError::analysis_unavailable(format!(
                    "{message} (after {attempt} attempts)"
                )));
            }

            let delay = retry_after.unwrap_or_else(|| self.config.backoff(attempt));
            tracing::warn!(
                code = %code,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "analysis attempt failed, retrying: {message}"
            );
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(MindstormError::analysis_cancelled(code.as_str()));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
