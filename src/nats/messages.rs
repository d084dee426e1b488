use serde::{Deserialize, Serialize};

/// Transcript message received from the STT service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    /// Interim hypothesis that may still be revised
    pub partial: bool,
    pub timestamp: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    /// Engine-reported error for the current utterance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Recognition control action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Start,
    Stop,
}

/// Control message asking the STT service to start or stop a stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionControlMessage {
    pub session_id: String,
    pub action: ControlAction,
    pub locale: String,
    pub continuous: bool,
    pub interim_results: bool,
    pub timestamp: String, // RFC3339 timestamp
}
