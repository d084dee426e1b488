use thiserror::Error;

use crate::api::ApiError;
use crate::models::Phase;

/// Errors raised by the interview session core
#[derive(Debug, Error)]
pub enum SessionError {
    /// No speech recognition capability on this platform
    #[error("speech recognition is not supported in this environment")]
    UnsupportedEnvironment,

    /// The recognition engine reported an error during an utterance
    #[error("recognition engine error: {0}")]
    RecognitionEngine(String),

    #[error("invalid question index {index} for phase {phase}")]
    InvalidIndex { phase: Phase, index: usize },

    #[error("slot {phase}_{index} is not the active slot")]
    SlotNotActive { phase: Phase, index: usize },

    #[error("cannot {action} while session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("question set has {actual} {phase} questions, expected {expected}")]
    IncompleteQuestionSet {
        phase: Phase,
        expected: usize,
        actual: usize,
    },

    /// The session task has ended and no longer accepts commands
    #[error("session is closed")]
    SessionClosed,

    /// Failure talking to the interview API (fetch or submit)
    #[error("interview API request failed: {0}")]
    Api(#[from] ApiError),
}
