//! The live session object: ideas, participants, status and events.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, broadcast};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::bus::EventStream;
use super::code::SessionCode;
use super::event::SessionEvent;
use super::gate::SubmissionGate;
use super::model::{CloseReason, Idea, SessionSnapshot, SessionStatus};
use crate::config::SubmissionLimits;
use crate::error::{MindstormError, Result};
use crate::mindmap::MindmapResult;

/// One live brainstorming session.
///
/// Identity fields are immutable. Everything mutable sits behind a single
/// `RwLock`, so a status check, gate decision and idea append happen in one
/// critical section. Events are published after the lock is released;
/// subscribers can never hold up a mutation.
#[derive(Debug)]
pub struct Session {
    code: SessionCode,
    topic: String,
    moderator: String,
    created_at: DateTime<Utc>,
    events: broadcast::Sender<SessionEvent>,
    state: RwLock<SessionState>,
}

#[derive(Debug)]
struct SessionState {
    status: SessionStatus,
    ideas: Vec<Idea>,
    next_seq: u64,
    participants: BTreeSet<String>,
    gate: SubmissionGate,
    mindmap: Option<MindmapResult>,
    /// Cancellation handle of the running generation, when analyzing.
    cancel: Option<CancellationToken>,
    last_touched: Instant,
}

impl SessionState {
    fn ensure_mutable(&self, code: &SessionCode) -> Result<()> {
        if self.status.is_closed() {
            return Err(MindstormError::session_closed(code.as_str()));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.last_touched = Instant::now();
    }
}

/// Frozen input of one mindmap generation. Ideas submitted after this
/// snapshot was taken stay in the session but miss the generation.
#[derive(Debug)]
pub struct IdeaSnapshot {
    pub generation_id: Uuid,
    pub ideas: Vec<Idea>,
    pub cancel: CancellationToken,
}

impl Session {
    pub(crate) fn new(
        code: SessionCode,
        topic: impl Into<String>,
        moderator: impl Into<String>,
        limits: SubmissionLimits,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            code,
            topic: topic.into(),
            moderator: moderator.into(),
            created_at: Utc::now(),
            events,
            state: RwLock::new(SessionState {
                status: SessionStatus::Open,
                ideas: Vec::new(),
                next_seq: 1,
                participants: BTreeSet::new(),
                gate: SubmissionGate::new(limits),
                mindmap: None,
                cancel: None,
                last_touched: Instant::now(),
            }),
        }
    }

    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn moderator(&self) -> &str {
        &self.moderator
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Subscribes to this session's events from now on.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// Accepts one idea. The sequence number is assigned and the idea
    /// appended atomically, so concurrent submitters can never collide or
    /// observe a gap.
    pub async fn submit_idea(&self, author: &str, text: &str) -> Result<Idea> {
        let author = author.trim();
        if author.is_empty() {
            return Err(MindstormError::validation("author name must not be empty"));
        }

        let (idea, event) = {
            let mut state = self.state.write().await;
            state.ensure_mutable(&self.code)?;
            let text = state.gate.admit(author, text, Instant::now())?;
            let seq = state.next_seq;
            state.next_seq += 1;
            let idea = Idea {
                seq,
                author: author.to_string(),
                text,
                submitted_at: Utc::now(),
            };
            state.ideas.push(idea.clone());
            state.touch();
            let event = SessionEvent::IdeaSubmitted {
                seq,
                author: idea.author.clone(),
                text: idea.text.clone(),
                idea_count: state.ideas.len(),
            };
            (idea, event)
        };

        self.publish(event);
        Ok(idea)
    }

    /// Adds a participant. Joining twice is a no-op without an event.
    pub async fn join(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MindstormError::validation(
                "participant name must not be empty",
            ));
        }

        let event = {
            let mut state = self.state.write().await;
            state.ensure_mutable(&self.code)?;
            if !state.participants.insert(name.to_string()) {
                return Ok(());
            }
            state.touch();
            SessionEvent::ParticipantJoined {
                name: name.to_string(),
                participant_count: state.participants.len(),
            }
        };

        self.publish(event);
        Ok(())
    }

    /// Removes a participant. Unknown names and closed sessions are quiet
    /// no-ops.
    pub async fn leave(&self, name: &str) -> Result<()> {
        let name = name.trim();
        let event = {
            let mut state = self.state.write().await;
            if state.status.is_closed() || !state.participants.remove(name) {
                return Ok(());
            }
            state.touch();
            SessionEvent::ParticipantLeft {
                name: name.to_string(),
                participant_count: state.participants.len(),
            }
        };

        self.publish(event);
        Ok(())
    }

    /// Starts a mindmap generation: freezes the current idea list and flips
    /// the session to `Analyzing`. At most one generation runs at a time.
    pub async fn begin_generation(&self) -> Result<IdeaSnapshot> {
        let (snapshot, event) = {
            let mut state = self.state.write().await;
            match state.status {
                SessionStatus::Closed => {
                    return Err(MindstormError::session_closed(self.code.as_str()));
                }
                SessionStatus::Analyzing => {
                    return Err(MindstormError::already_in_progress(self.code.as_str()));
                }
                SessionStatus::Open => {}
            }
            if state.ideas.is_empty() {
                return Err(MindstormError::validation(
                    "cannot generate a mindmap without ideas",
                ));
            }

            state.status = SessionStatus::Analyzing;
            let cancel = CancellationToken::new();
            state.cancel = Some(cancel.clone());
            state.touch();
            let snapshot = IdeaSnapshot {
                generation_id: Uuid::new_v4(),
                ideas: state.ideas.clone(),
                cancel,
            };
            let event = SessionEvent::AnalysisStarted {
                generation_id: snapshot.generation_id,
                idea_count: snapshot.ideas.len(),
            };
            (snapshot, event)
        };

        self.publish(event);
        Ok(snapshot)
    }

    /// Attaches a finished mindmap and reopens the session.
    ///
    /// When the session was closed while the generation ran, the result is
    /// discarded and the caller gets `AnalysisCancelled`.
    pub async fn complete_generation(&self, result: MindmapResult) -> Result<MindmapResult> {
        let event = {
            let mut state = self.state.write().await;
            if state.status != SessionStatus::Analyzing {
                return Err(MindstormError::analysis_cancelled(self.code.as_str()));
            }
            state.status = SessionStatus::Open;
            state.cancel = None;
            state.touch();
            let event = SessionEvent::MindmapReady {
                generation_id: result.generation_id,
                node_count: result.node_count(),
                unclustered_count: result.unclustered.len(),
            };
            state.mindmap = Some(result.clone());
            event
        };

        self.publish(event);
        Ok(result)
    }

    /// Reopens the session after a generation ended without a result. Ideas
    /// and any earlier mindmap are untouched. Quiet when the session was
    /// closed in the meantime; the close event already told subscribers.
    pub async fn fail_generation(&self, error: &MindstormError) {
        let event = {
            let mut state = self.state.write().await;
            if state.status != SessionStatus::Analyzing {
                return;
            }
            state.status = SessionStatus::Open;
            state.cancel = None;
            state.touch();
            SessionEvent::AnalysisFailed {
                message: error.to_string(),
                retryable: error.is_retryable(),
            }
        };

        self.publish(event);
    }

    /// Closes the session. A running generation is cancelled; its result
    /// will be discarded. Closing an already closed session is an error.
    pub async fn close(&self, reason: CloseReason) -> Result<()> {
        let event = {
            let mut state = self.state.write().await;
            if state.status.is_closed() {
                return Err(MindstormError::session_closed(self.code.as_str()));
            }
            if let Some(cancel) = state.cancel.take() {
                cancel.cancel();
            }
            state.status = SessionStatus::Closed;
            state.touch();
            SessionEvent::Closed { reason }
        };

        self.publish(event);
        Ok(())
    }

    /// Point-in-time copy for display.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            code: self.code.clone(),
            topic: self.topic.clone(),
            moderator: self.moderator.clone(),
            status: state.status,
            created_at: self.created_at,
            ideas: state.ideas.clone(),
            participants: state.participants.iter().cloned().collect(),
            mindmap: state.mindmap.clone(),
        }
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.read().await.status
    }

    /// Time since the last mutation, for idle eviction.
    pub async fn idle_for(&self) -> Duration {
        self.state.read().await.last_touched.elapsed()
    }

    fn publish(&self, event: SessionEvent) {
        tracing::debug!(code = %self.code, event = event.event_type(), "session event");
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }
}
