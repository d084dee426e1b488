//! Interview session management
//!
//! This module provides the `InterviewSession` state machine that manages:
//! - The timed planning phase
//! - Per-question activation and locking
//! - Spoken prompts for immediate questions
//! - Live transcript capture into the session log
//! - Submission of the finished log

mod activation;
mod config;
mod session;
mod stats;
mod timer;

pub use activation::{AnswerBuffer, LockOutcome, QuestionActivation};
pub use config::SessionConfig;
pub use session::{
    InterviewSession, SessionCommand, SessionEvent, SessionHandle, SessionReply, SessionRequest,
    SessionState,
};
pub use stats::{SessionStatus, SessionSummary, VisibleQuestion};
pub use timer::{format_clock, PhaseTimer, TimerEvent};
