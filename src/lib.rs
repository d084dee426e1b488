pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod http;
pub mod models;
pub mod nats;
pub mod practice;
pub mod session;
pub mod speech;

pub use api::{ApiError, HttpInterviewApi, InterviewApi};
pub use config::Config;
pub use error::SessionError;
pub use history::HistoryEntry;
pub use http::{create_router, AppState};
pub use models::{Phase, Question, QuestionSet, SessionLog, SlotId};
pub use nats::{NatsClient, TranscriptMessage};
pub use session::{
    InterviewSession, SessionCommand, SessionConfig, SessionHandle, SessionState, SessionStatus,
    SessionSummary,
};
pub use speech::{ConfiguredEngines, EngineFactory, RecognitionEngine, SpeechSynthesizer};
