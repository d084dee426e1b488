//! Data model shared by the session core and the interview API client.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SessionError;

/// Number of planning questions in a set.
pub const PLANNING_SLOTS: usize = 3;

/// Number of immediate-answer questions in a set.
pub const IMMEDIATE_SLOTS: usize = 2;

/// Interview phase a question slot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    /// Planning questions, answered after the silent preparation period
    #[serde(rename = "plan")]
    Plan,
    /// Immediate questions, revealed one at a time by audio prompt
    #[serde(rename = "imm")]
    Imm,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Plan => "plan",
            Phase::Imm => "imm",
        }
    }

    /// Fixed number of slots in this phase
    pub fn slot_count(&self) -> usize {
        match self {
            Phase::Plan => PLANNING_SLOTS,
            Phase::Imm => IMMEDIATE_SLOTS,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plan" => Ok(Phase::Plan),
            "imm" => Ok(Phase::Imm),
            other => Err(format!("unknown phase: {}", other)),
        }
    }
}

/// One `(phase, index)` question position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId {
    pub phase: Phase,
    pub index: usize,
}

impl SlotId {
    pub fn new(phase: Phase, index: usize) -> Self {
        Self { phase, index }
    }

    /// Key under which the slot's answer is stored in the session log
    pub fn answer_key(&self) -> String {
        format!("{}_{}", self.phase, self.index)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.phase, self.index)
    }
}

/// A question from the question bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Category name (e.g. "구상형" for planning, "즉답형" for immediate)
    pub category: String,

    /// Optional title, e.g. the exam year it was taken from
    #[serde(default)]
    pub title: Option<String>,

    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<chrono::NaiveDateTime>,
}

/// Questions drawn for one session: 3 planning + 2 immediate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub planning: Vec<Question>,
    pub immediate: Vec<Question>,
}

impl QuestionSet {
    /// Check the set has exactly the slot counts a session needs
    pub fn validate(&self) -> Result<(), SessionError> {
        for (phase, questions) in [(Phase::Plan, &self.planning), (Phase::Imm, &self.immediate)] {
            if questions.len() != phase.slot_count() {
                return Err(SessionError::IncompleteQuestionSet {
                    phase,
                    expected: phase.slot_count(),
                    actual: questions.len(),
                });
            }
        }
        Ok(())
    }

    pub fn question(&self, slot: SlotId) -> Option<&Question> {
        match slot.phase {
            Phase::Plan => self.planning.get(slot.index),
            Phase::Imm => self.immediate.get(slot.index),
        }
    }
}

/// Structured transcript of one session, as submitted to history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    #[serde(default)]
    pub planning: Vec<Question>,

    #[serde(default)]
    pub immediate: Vec<Question>,

    /// Answer text keyed by `plan_<idx>` / `imm_<idx>`
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

impl SessionLog {
    pub fn answer(&self, slot: SlotId) -> Option<&str> {
        self.answers.get(&slot.answer_key()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.planning.is_empty() && self.immediate.is_empty() && self.answers.is_empty()
    }
}

/// Generic acknowledgement returned by write endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub status: String,

    /// Number of imported rows, only set by bulk import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}
