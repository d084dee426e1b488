use crate::api::InterviewApi;
use crate::session::{SessionConfig, SessionHandle};
use crate::speech::EngineFactory;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Running interview sessions (session_id → handle)
    pub sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,

    /// Interview backend used by every session
    pub api: Arc<dyn InterviewApi>,

    /// Builds speech engines for new sessions
    pub engines: Arc<dyn EngineFactory>,

    /// Template for new session configs (id is regenerated per session)
    pub session_defaults: SessionConfig,
}

impl AppState {
    pub fn new(
        api: Arc<dyn InterviewApi>,
        engines: Arc<dyn EngineFactory>,
        session_defaults: SessionConfig,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            api,
            engines,
            session_defaults,
        }
    }
}
