//! Practice history entries and their display helpers.
//!
//! The history endpoint stores `session_date` as a naive UTC timestamp; it is
//! always interpreted as UTC and shifted to the configured display offset.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Phase, Question, SessionLog, SlotId};

/// Placeholder shown for a question with no recorded answer
pub const NO_ANSWER: &str = "(no answer)";

/// One completed practice session as returned by the history endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub id: Option<i64>,

    /// Naive UTC timestamp of when the session was saved
    pub session_date: NaiveDateTime,

    pub duration_seconds: i64,

    /// Full session log, absent for legacy entries
    #[serde(default)]
    pub details_json: Option<SessionLog>,
}

impl HistoryEntry {
    pub fn session_date_utc(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.session_date)
    }

    /// Session date shifted to a fixed UTC offset, in whole hours
    pub fn local_time(&self, utc_offset_hours: i32) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or(Utc.fix());
        self.session_date_utc().with_timezone(&offset)
    }

    /// `YYYY.MM.DD HH:MM` in the given offset
    pub fn display_date(&self, utc_offset_hours: i32) -> String {
        self.local_time(utc_offset_hours)
            .format("%Y.%m.%d %H:%M")
            .to_string()
    }

    pub fn display_duration(&self) -> String {
        format_duration(self.duration_seconds)
    }

    /// Question/answer pairs for one phase, in slot order
    pub fn answered_questions(&self, phase: Phase) -> Vec<(&Question, &str)> {
        let Some(details) = &self.details_json else {
            return Vec::new();
        };
        let questions = match phase {
            Phase::Plan => &details.planning,
            Phase::Imm => &details.immediate,
        };
        questions
            .iter()
            .enumerate()
            .map(|(idx, q)| {
                let answer = details
                    .answer(SlotId::new(phase, idx))
                    .filter(|a| !a.trim().is_empty())
                    .unwrap_or(NO_ANSWER);
                (q, answer)
            })
            .collect()
    }
}

/// Format whole seconds as `Mm Ss`
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Client-side category filter over the full question list
pub fn questions_in_category<'a>(questions: &'a [Question], category: &str) -> Vec<&'a Question> {
    questions.iter().filter(|q| q.category == category).collect()
}
