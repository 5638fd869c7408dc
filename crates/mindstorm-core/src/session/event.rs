//! Change notifications broadcast to session subscribers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::CloseReason;

/// Events published to a session's channel, one per successful mutation.
///
/// The serialized form is tagged so clients can dispatch on `type` without
/// knowing every variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// An idea was accepted into the session.
    IdeaSubmitted {
        seq: u64,
        author: String,
        text: String,
        idea_count: usize,
    },
    ParticipantJoined {
        name: String,
        participant_count: usize,
    },
    ParticipantLeft {
        name: String,
        participant_count: usize,
    },
    /// A mindmap generation started over a frozen idea snapshot.
    AnalysisStarted {
        generation_id: Uuid,
        idea_count: usize,
    },
    /// A generation finished and its result is attached to the session.
    MindmapReady {
        generation_id: Uuid,
        node_count: usize,
        unclustered_count: usize,
    },
    /// A generation ended without a result; the session is open again.
    AnalysisFailed { message: String, retryable: bool },
    Closed { reason: CloseReason },
}

impl SessionEvent {
    /// Stable name used in logs and client dispatch.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::IdeaSubmitted { .. } => "idea_submitted",
            Self::ParticipantJoined { .. } => "participant_joined",
            Self::ParticipantLeft { .. } => "participant_left",
            Self::AnalysisStarted { .. } => "analysis_started",
            Self::MindmapReady { .. } => "mindmap_ready",
            Self::AnalysisFailed { .. } => "analysis_failed",
            Self::Closed { .. } => "closed",
        }
    }
}
