//! Brainstorm orchestration: sessions, analysis and rendering behind one
//! facade.

use std::sync::Arc;

use chrono::Utc;

use mindstorm_core::analysis::AnalysisPipeline;
use mindstorm_core::classifier::Classifier;
use mindstorm_core::config::MindstormConfig;
use mindstorm_core::error::Result;
use mindstorm_core::mindmap::{MindmapResult, render_outline};
use mindstorm_core::session::{
    CloseReason, EventStream, Idea, IdeaSnapshot, NotificationBus, Session, SessionSnapshot,
    SessionStore,
};

use crate::render::{HtmlRenderer, RenderContext};

/// Application facade over the session store, the analysis pipeline and the
/// HTML renderer. One instance serves every session in the process.
///
/// Methods take session codes as typed by the user; lookup normalizes them.
pub struct BrainstormService {
    store: Arc<SessionStore>,
    pipeline: AnalysisPipeline,
    renderer: HtmlRenderer,
}

impl BrainstormService {
    pub fn new(config: &MindstormConfig, classifier: Arc<dyn Classifier>) -> Self {
        let bus = Arc::new(NotificationBus::new(config.lifecycle.event_capacity));
        let store = Arc::new(SessionStore::new(
            config.limits.clone(),
            config.codes.clone(),
            bus,
        ));
        Self {
            store,
            pipeline: AnalysisPipeline::new(classifier, config.analysis.clone()),
            renderer: HtmlRenderer::new(),
        }
    }

    /// The session registry, shared with the idle sweeper.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub async fn create_session(&self, topic: &str, moderator: &str) -> Result<Arc<Session>> {
        self.store.create(topic, moderator).await
    }

    pub async fn snapshot(&self, code: &str) -> Result<SessionSnapshot> {
        Ok(self.store.lookup(code).await?.snapshot().await)
    }

    pub async fn join(&self, code: &str, name: &str) -> Result<()> {
        self.store.lookup(code).await?.join(name).await
    }

    pub async fn leave(&self, code: &str, name: &str) -> Result<()> {
        self.store.lookup(code).await?.leave(name).await
    }

    pub async fn submit_idea(&self, code: &str, author: &str, text: &str) -> Result<Idea> {
        self.store.lookup(code).await?.submit_idea(author, text).await
    }

    /// Live event stream of a session, from now on.
    pub async fn subscribe(&self, code: &str) -> Result<EventStream> {
        Ok(self.store.lookup(code).await?.subscribe())
    }

    /// Closes a session on the moderator's behalf. It stays readable.
    pub async fn close(&self, code: &str) -> Result<()> {
        self.store.lookup(code).await?.close(CloseReason::Moderator).await
    }

    /// Runs one full mindmap generation for a session: freeze the ideas,
    /// classify, render, attach.
    ///
    /// Ideas submitted while the analysis runs are accepted but miss this
    /// generation. If the session is closed mid-flight the result is
    /// discarded and this returns `AnalysisCancelled`.
    pub async fn generate_mindmap(&self, code: &str) -> Result<MindmapResult> {
        let session = self.store.lookup(code).await?;
        let frozen = session.begin_generation().await?;

        match self.run_generation(&session, &frozen).await {
            Ok(result) => session.complete_generation(result).await,
            Err(err) => {
                session.fail_generation(&err).await;
                Err(err)
            }
        }
    }

    async fn run_generation(
        &self,
        session: &Session,
        frozen: &IdeaSnapshot,
    ) -> Result<MindmapResult> {
        let outcome = self
            .pipeline
            .analyse(session.code(), session.topic(), &frozen.ideas, &frozen.cancel)
            .await?;

        let markdown = render_outline(
            &outcome.root,
            outcome.summary.as_deref(),
            &outcome.unclustered,
        );
        let generated_at = Utc::now();
        let html = self.renderer.render(&RenderContext {
            topic: session.topic(),
            summary: outcome.summary.as_deref(),
            markdown: &markdown,
            idea_count: frozen.ideas.len(),
            category_count: outcome.root.children.len(),
            model: &outcome.model,
            generated_at: &generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        })?;

        Ok(MindmapResult {
            generation_id: frozen.generation_id,
            root: outcome.root,
            summary: outcome.summary,
            markdown,
            html,
            model: outcome.model,
            generated_at,
            unclustered: outcome.unclustered,
            warnings: outcome.warnings,
        })
    }
}
