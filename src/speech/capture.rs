//! Continuous speech capture with restart-on-termination.
//!
//! The channel keeps one recognition stream alive while a question is active.
//! Only final segments reach an answer buffer; interim segments are kept as
//! scratch for display. Results arriving while no slot is active are dropped.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::recognition::{RecognitionEngine, RecognitionEvent};
use crate::error::SessionError;
use crate::session::QuestionActivation;

pub struct SpeechCaptureChannel {
    engine: Box<dyn RecognitionEngine>,
    stream: Option<mpsc::Receiver<RecognitionEvent>>,
    open: bool,
    restarts: u32,
    interim: String,
}

impl SpeechCaptureChannel {
    pub fn new(engine: Box<dyn RecognitionEngine>) -> Self {
        Self {
            engine,
            stream: None,
            open: false,
            restarts: 0,
            interim: String::new(),
        }
    }

    /// Open the channel and start streaming. No-op if already open.
    pub async fn open(&mut self) -> Result<(), SessionError> {
        if self.open {
            return Ok(());
        }
        if !self.engine.is_supported() {
            return Err(SessionError::UnsupportedEnvironment);
        }

        info!("Opening speech capture ({})", self.engine.name());
        self.open = true;
        self.start_stream().await;
        Ok(())
    }

    /// Stop the engine. Idempotent; no restart happens after this.
    pub async fn close(&mut self) {
        if !self.open {
            return;
        }

        info!("Closing speech capture ({})", self.engine.name());
        self.open = false;
        self.stream = None;
        self.interim.clear();

        if let Err(e) = self.engine.stop().await {
            warn!("Failed to stop recognition engine: {}", e);
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether a recognition stream is currently running
    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Number of automatic restarts after unsolicited termination
    pub fn restart_count(&self) -> u32 {
        self.restarts
    }

    /// Latest interim hypothesis, never persisted
    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// Restart the stream if the channel is open but not streaming
    /// (a previous restart failed).
    pub async fn ensure_streaming(&mut self) {
        if self.open && self.stream.is_none() {
            info!("Resuming speech capture");
            self.start_stream().await;
        }
    }

    /// Wait for the next stream event.
    ///
    /// Yields [`RecognitionEvent::Ended`] once when the engine drops the
    /// stream, then never resolves until the stream is restarted. Cancel safe.
    pub async fn next_event(&mut self) -> RecognitionEvent {
        match self.stream.as_mut() {
            Some(stream) => match stream.recv().await {
                Some(event) => event,
                None => {
                    self.stream = None;
                    RecognitionEvent::Ended
                }
            },
            None => std::future::pending().await,
        }
    }

    /// Apply one stream event, routing final text to the active slot
    pub async fn handle(&mut self, event: RecognitionEvent, activation: &mut QuestionActivation) {
        match event {
            RecognitionEvent::Results(segments) => {
                if !self.open || activation.active().is_none() {
                    debug!("Dropping {} recognition segments, no active question", segments.len());
                    self.interim.clear();
                    return;
                }

                let mut final_text = String::new();
                let mut interim = String::new();
                for segment in segments {
                    if segment.is_final {
                        final_text.push_str(&segment.text);
                    } else {
                        interim.push_str(&segment.text);
                    }
                }
                self.interim = interim;

                if !final_text.is_empty() {
                    activation.capture(&final_text);
                }
            }
            RecognitionEvent::Error(message) => {
                warn!("{}", SessionError::RecognitionEngine(message));
            }
            RecognitionEvent::Ended => {
                self.stream = None;
                self.interim.clear();

                if !self.open {
                    debug!("Recognition stream ended after close");
                    return;
                }
                match activation.active() {
                    Some(slot) => {
                        self.restarts += 1;
                        info!(
                            "Recognition stream ended while {} is active, restarting (#{})",
                            slot, self.restarts
                        );
                        self.start_stream().await;
                    }
                    None => debug!("Recognition stream ended with no active question"),
                }
            }
        }
    }

    /// Start the engine stream; failures are logged and capture pauses
    async fn start_stream(&mut self) -> bool {
        match self.engine.start().await {
            Ok(stream) => {
                self.stream = Some(stream);
                true
            }
            Err(e) => {
                warn!("Failed to start recognition ({}): {}", self.engine.name(), e);
                self.stream = None;
                false
            }
        }
    }
}
