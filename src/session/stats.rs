use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{SessionLog, SlotId};

/// A question currently visible to the candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleQuestion {
    pub slot: SlotId,
    pub content: String,
    pub locked: bool,
}

/// Snapshot of a session, published after every event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: String,

    /// Current state label (e.g. "planning", "immediate_interview")
    pub state: String,

    /// When the session started, if it has
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds left in the planning phase
    pub remaining_seconds: u32,

    /// Remaining planning time as `M:SS`
    pub remaining_display: String,

    /// Slot currently receiving transcript text
    pub active_slot: Option<SlotId>,

    /// False when the platform has no speech recognition
    pub speech_available: bool,

    /// Automatic capture restarts so far
    pub capture_restarts: u32,

    pub questions: Vec<VisibleQuestion>,

    /// Text of the active slot's answer buffer
    pub live_text: Option<String>,

    /// Latest interim hypothesis (display only)
    pub interim_text: String,

    /// Answers frozen so far, keyed `plan_<idx>` / `imm_<idx>`
    pub answers: BTreeMap<String, String>,
}

/// Result of a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub duration_seconds: i64,
    pub details: SessionLog,
}
