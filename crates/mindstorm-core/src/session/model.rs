//! Session domain model: lifecycle status, ideas and read-only snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::code::SessionCode;
use crate::mindmap::MindmapResult;

/// Lifecycle state of a brainstorming session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting submissions. A finished mindmap may already be attached
    /// from an earlier generation.
    Open,
    /// A mindmap generation is running over a frozen snapshot. Submissions
    /// are still accepted; they simply miss the running generation.
    Analyzing,
    /// Terminal. All mutations are rejected; the last mindmap stays
    /// readable.
    Closed,
}

impl SessionStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Why a session was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    Moderator,
    IdleTimeout,
}

/// One submitted idea.
///
/// `seq` is unique and strictly increasing within a session. It doubles as
/// the provenance tag in classifier prompts and mindmap nodes, so an idea
/// can always be traced back to its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub seq: u64,
    pub author: String,
    pub text: String,
    pub submitted_at: DateTime<Utc>,
}

/// Point-in-time copy of a session for display.
///
/// Detached from the live session: mutations after the snapshot was taken
/// do not show up here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub code: SessionCode,
    pub topic: String,
    pub moderator: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub ideas: Vec<Idea>,
    /// Participant names, sorted.
    pub participants: Vec<String>,
    pub mindmap: Option<MindmapResult>,
}

impl SessionSnapshot {
    pub fn idea_count(&self) -> usize {
        self.ideas.len()
    }
}
