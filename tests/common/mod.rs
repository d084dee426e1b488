//! Test doubles shared by the integration tests
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use mock_interview::api::{ApiError, InterviewApi};
use mock_interview::history::HistoryEntry;
use mock_interview::models::{Ack, Question, QuestionSet, SessionLog};
use mock_interview::session::{InterviewSession, SessionConfig};
use mock_interview::speech::{
    EngineFactory, RecognitionEngine, RecognitionEvent, RecognitionSegment, SpeechSynthesizer,
    UnsupportedRecognizer,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub fn question(id: i64, category: &str, content: &str) -> Question {
    Question {
        id,
        category: category.to_string(),
        title: None,
        content: content.to_string(),
        created_at: None,
    }
}

pub fn sample_set() -> QuestionSet {
    QuestionSet {
        planning: vec![
            question(1, "구상형", "P1"),
            question(2, "구상형", "P2"),
            question(3, "구상형", "P3"),
        ],
        immediate: vec![question(4, "즉답형", "I1"), question(5, "즉답형", "I2")],
    }
}

pub fn test_config(planning_seconds: u64) -> SessionConfig {
    SessionConfig {
        session_id: "test-interview".to_string(),
        planning_duration: Duration::from_secs(planning_seconds),
        ..SessionConfig::default()
    }
}

pub fn finals(text: &str) -> RecognitionEvent {
    RecognitionEvent::Results(vec![RecognitionSegment::final_text(text)])
}

// ============================================================================
// Interview API
// ============================================================================

#[derive(Default)]
pub struct FakeApi {
    pub set: QuestionSet,
    pub submissions: Mutex<Vec<(i64, SessionLog)>>,
    pub fail_submit: bool,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            set: sample_set(),
            ..Default::default()
        })
    }

    pub fn failing_submit() -> Arc<Self> {
        Arc::new(Self {
            set: sample_set(),
            fail_submit: true,
            ..Default::default()
        })
    }

    pub fn submissions(&self) -> Vec<(i64, SessionLog)> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl InterviewApi for FakeApi {
    async fn fetch_random_question_set(&self) -> Result<QuestionSet, ApiError> {
        Ok(self.set.clone())
    }

    async fn submit_session_log(
        &self,
        duration_seconds: i64,
        details: &SessionLog,
    ) -> Result<Ack, ApiError> {
        if self.fail_submit {
            return Err(ApiError::Server("database unavailable".to_string()));
        }
        self.submissions
            .lock()
            .unwrap()
            .push((duration_seconds, details.clone()));
        Ok(Ack {
            status: "success".to_string(),
            count: None,
        })
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        Ok(Vec::new())
    }

    async fn fetch_questions(&self) -> Result<Vec<Question>, ApiError> {
        Ok(self
            .set
            .planning
            .iter()
            .chain(&self.set.immediate)
            .cloned()
            .collect())
    }

    async fn create_question(
        &self,
        _category: &str,
        _title: &str,
        _content: &str,
    ) -> Result<Ack, ApiError> {
        Ok(Ack {
            status: "success".to_string(),
            count: None,
        })
    }

    async fn bulk_import_questions(&self, _category: &str, _file: &Path) -> Result<Ack, ApiError> {
        Ok(Ack {
            status: "success".to_string(),
            count: Some(0),
        })
    }
}

// ============================================================================
// Speech engines
// ============================================================================

#[derive(Default)]
struct ProbeState {
    starts: usize,
    stops: usize,
    sender: Option<mpsc::Sender<RecognitionEvent>>,
}

/// Test-side view of a [`FakeRecognizer`]
#[derive(Clone, Default)]
pub struct RecognizerProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl RecognizerProbe {
    pub fn starts(&self) -> usize {
        self.state.lock().unwrap().starts
    }

    pub fn stops(&self) -> usize {
        self.state.lock().unwrap().stops
    }

    pub fn is_streaming(&self) -> bool {
        self.state.lock().unwrap().sender.is_some()
    }

    /// Deliver an event on the current stream; false if none is running
    pub async fn push(&self, event: RecognitionEvent) -> bool {
        let sender = self.state.lock().unwrap().sender.clone();
        match sender {
            Some(sender) => sender.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Terminate the current stream as the platform would on silence
    pub fn end_stream(&self) {
        self.state.lock().unwrap().sender = None;
    }
}

pub struct FakeRecognizer {
    probe: RecognizerProbe,
}

impl FakeRecognizer {
    pub fn new() -> (Box<dyn RecognitionEngine>, RecognizerProbe) {
        let probe = RecognizerProbe::default();
        let engine = Self {
            probe: probe.clone(),
        };
        (Box::new(engine), probe)
    }
}

#[async_trait]
impl RecognitionEngine for FakeRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<RecognitionEvent>> {
        let (tx, rx) = mpsc::channel(16);
        let mut state = self.probe.state.lock().unwrap();
        state.starts += 1;
        state.sender = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        let mut state = self.probe.state.lock().unwrap();
        state.stops += 1;
        state.sender = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Records prompts and returns immediately
#[derive(Default)]
pub struct FakeSynthesizer {
    pub spoken: Mutex<Vec<String>>,
}

impl FakeSynthesizer {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn speak(&self, text: &str, _locale: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Engine factory handing out fakes; the latest recognizer is observable
#[derive(Default)]
pub struct FakeEngines {
    pub probe: Mutex<Option<RecognizerProbe>>,
    pub synthesizer: Arc<FakeSynthesizer>,
    pub unsupported: bool,
}

impl EngineFactory for FakeEngines {
    fn recognizer(&self, _session_id: &str, _locale: &str) -> Box<dyn RecognitionEngine> {
        if self.unsupported {
            return Box::new(UnsupportedRecognizer);
        }
        let (engine, probe) = FakeRecognizer::new();
        *self.probe.lock().unwrap() = Some(probe);
        engine
    }

    fn synthesizer(&self) -> Arc<dyn SpeechSynthesizer> {
        self.synthesizer.clone()
    }
}

/// A started session wired to fakes
pub struct Harness {
    pub session: InterviewSession,
    pub api: Arc<FakeApi>,
    pub probe: RecognizerProbe,
    pub synthesizer: Arc<FakeSynthesizer>,
}

pub async fn started_session(api: Arc<FakeApi>, planning_seconds: u64) -> Harness {
    let (recognizer, probe) = FakeRecognizer::new();
    let synthesizer = Arc::new(FakeSynthesizer::default());
    let mut session = InterviewSession::new(
        test_config(planning_seconds),
        api.clone(),
        recognizer,
        synthesizer.clone(),
    );
    session.start().await.unwrap();
    Harness {
        session,
        api,
        probe,
        synthesizer,
    }
}
