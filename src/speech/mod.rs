//! Speech capabilities used by an interview session
//!
//! - [`SpeechCaptureChannel`]: continuous recognition routed to the active question
//! - [`PromptSpeaker`]: text-to-speech prompts with a completion signal
//! - [`EngineFactory`]: builds per-session engines from configuration

mod capture;
mod factory;
mod nats_recognizer;
mod prompt;
mod recognition;

pub use capture::SpeechCaptureChannel;
pub use factory::{ConfiguredEngines, EngineFactory};
pub use nats_recognizer::{transcript_event, NatsRecognizer};
pub use prompt::{CommandSynthesizer, PromptSpeaker, SilentSynthesizer, SpeechSynthesizer};
pub use recognition::{
    RecognitionEngine, RecognitionEvent, RecognitionSegment, UnsupportedRecognizer,
};
