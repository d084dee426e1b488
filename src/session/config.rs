use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for an interview session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "interview-<uuid>")
    pub session_id: String,

    /// Length of the silent planning phase
    /// Default: 900 seconds (15 minutes)
    pub planning_duration: Duration,

    /// Locale for both recognition and prompt synthesis
    pub locale: String,

    /// Text an answer buffer shows until the first final transcript arrives
    pub answer_placeholder: String,
}

impl SessionConfig {
    pub fn planning_seconds(&self) -> u32 {
        u32::try_from(self.planning_duration.as_secs()).unwrap_or(u32::MAX)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("interview-{}", uuid::Uuid::new_v4()),
            planning_duration: Duration::from_secs(900), // 15 minutes
            locale: "ko-KR".to_string(),
            answer_placeholder: "(답변을 편하게 말씀하세요)".to_string(),
        }
    }
}
