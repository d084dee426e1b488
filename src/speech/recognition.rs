use anyhow::Result;
use tokio::sync::mpsc;

/// One transcription hypothesis for an utterance fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionSegment {
    pub text: String,
    /// Confirmed transcription; interim segments may still be revised
    pub is_final: bool,
}

impl RecognitionSegment {
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }

    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }
}

/// Event delivered by a continuous recognition stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Results from the engine's current result index onward
    Results(Vec<RecognitionSegment>),
    /// Engine-reported error during an utterance; the stream keeps running
    Error(String),
    /// The stream terminated, solicited or not
    Ended,
}

/// Continuous speech-to-text engine
///
/// Implementations:
/// - NATS: transcripts from a remote STT service
/// - Unsupported: platform without recognition capability
///
/// Dropping the sender behind the returned receiver signals termination.
#[async_trait::async_trait]
pub trait RecognitionEngine: Send {
    /// Whether the platform offers recognition at all
    fn is_supported(&self) -> bool;

    /// Start a continuous, interim+final recognition stream
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>>;

    /// Stop the current stream
    async fn stop(&mut self) -> Result<()>;

    /// Get engine name for logging
    fn name(&self) -> &str;
}

/// Engine for platforms with no recognition capability
#[derive(Debug, Default)]
pub struct UnsupportedRecognizer;

#[async_trait::async_trait]
impl RecognitionEngine for UnsupportedRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>> {
        anyhow::bail!("Speech recognition is not available on this platform")
    }

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "unsupported"
    }
}
