use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use super::activation::{LockOutcome, QuestionActivation};
use super::config::SessionConfig;
use super::stats::{SessionStatus, SessionSummary, VisibleQuestion};
use super::timer::{format_clock, PhaseTimer, TimerEvent};
use crate::api::InterviewApi;
use crate::error::SessionError;
use crate::models::{Phase, QuestionSet, SessionLog, SlotId};
use crate::speech::{
    PromptSpeaker, RecognitionEngine, RecognitionEvent, SpeechCaptureChannel, SpeechSynthesizer,
};

/// States of an interview session.
///
/// ```text
/// Idle ──start──▶ Planning ──finish planning / timer expiry──▶ PlanningInterview
///      PlanningInterview ──lock plan_2──▶ ImmediateGate
///      ImmediateGate ──start immediate──▶ Prompting(imm_0)
///      Prompting(imm_i) ──prompt finished──▶ ImmediateInterview
///      ImmediateInterview ──lock imm_0──▶ Prompting(imm_1)
///      ImmediateInterview ──lock imm_1──▶ ReadyToFinish ──finish──▶ Finished
/// any state ──leave──▶ Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Silent preparation, countdown running
    Planning,
    /// Answering the planning questions in order
    PlanningInterview,
    /// Planning answers locked; immediate phase can be entered
    ImmediateGate,
    /// Speaking the prompt for an immediate question
    Prompting { slot: SlotId },
    /// Answering a revealed immediate question
    ImmediateInterview,
    /// All answers locked
    ReadyToFinish,
    Finished,
    Cancelled,
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Planning => "planning",
            SessionState::PlanningInterview => "planning_interview",
            SessionState::ImmediateGate => "immediate_gate",
            SessionState::Prompting { .. } => "prompting",
            SessionState::ImmediateInterview => "immediate_interview",
            SessionState::ReadyToFinish => "ready_to_finish",
            SessionState::Finished => "finished",
            SessionState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Finished | SessionState::Cancelled)
    }
}

/// User-triggered actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// End the planning phase before the timer runs out
    FinishPlanning,
    /// Mark a slot's answer as done
    Lock(SlotId),
    /// Leave the gate and speak the first immediate question
    StartImmediate,
    /// Submit the completed session
    Finish,
    /// Abandon the session; nothing is persisted
    Leave,
}

/// Every input the session reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Command(SessionCommand),
    Timer(TimerEvent),
    Recognition(RecognitionEvent),
    PromptFinished,
}

/// Outcome of one event; `Some` only when the session finished
pub type SessionReply = Result<Option<SessionSummary>, SessionError>;

/// Command sent to a running session, with an optional reply slot
#[derive(Debug)]
pub struct SessionRequest {
    pub command: SessionCommand,
    pub reply: Option<oneshot::Sender<SessionReply>>,
}

/// An interview session that sequences the phases, captures answers, and
/// submits the finished log
pub struct InterviewSession {
    /// Session configuration
    config: SessionConfig,

    /// Question bank and history backend
    api: Arc<dyn InterviewApi>,

    state: SessionState,

    /// Questions drawn at start, fixed for the session
    questions: QuestionSet,

    activation: QuestionActivation,

    /// Answers locked so far
    log: SessionLog,

    timer: PhaseTimer,

    capture: SpeechCaptureChannel,

    speaker: PromptSpeaker,

    /// When the question set was fetched
    started_at: Option<DateTime<Utc>>,

    /// Cleared when the platform has no recognition capability
    speech_available: bool,

    status_tx: watch::Sender<SessionStatus>,
}

impl InterviewSession {
    pub fn new(
        config: SessionConfig,
        api: Arc<dyn InterviewApi>,
        recognizer: Box<dyn RecognitionEngine>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let activation = QuestionActivation::new(config.answer_placeholder.clone());
        let speaker = PromptSpeaker::new(synthesizer, config.locale.clone());
        let (status_tx, _) = watch::channel(SessionStatus::default());

        let session = Self {
            config,
            api,
            state: SessionState::Idle,
            questions: QuestionSet::default(),
            activation,
            log: SessionLog::default(),
            timer: PhaseTimer::new(),
            capture: SpeechCaptureChannel::new(recognizer),
            speaker,
            started_at: None,
            speech_available: true,
            status_tx,
        };
        session.publish_status();
        session
    }

    pub fn id(&self) -> &str {
        &self.config.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn activation(&self) -> &QuestionActivation {
        &self.activation
    }

    pub fn capture(&self) -> &SpeechCaptureChannel {
        &self.capture
    }

    pub fn timer(&self) -> &PhaseTimer {
        &self.timer
    }

    pub fn is_speaking(&self) -> bool {
        self.speaker.is_speaking()
    }

    pub fn speech_available(&self) -> bool {
        self.speech_available
    }

    /// Answers locked so far in the current session
    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Receive a status snapshot after every handled event
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Fetch a question set and start the planning countdown
    pub async fn start(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(self.invalid("start"));
        }

        info!("Starting interview session: {}", self.config.session_id);

        let questions = self.api.fetch_random_question_set().await?;
        questions.validate()?;

        self.questions = questions;
        self.activation.reset();
        self.log = SessionLog::default();
        self.started_at = Some(Utc::now());
        self.timer.start(self.config.planning_seconds());
        self.set_state(SessionState::Planning);
        Ok(())
    }

    /// Leave the planning phase and start answering.
    ///
    /// Timer expiry and the manual action share this path; whichever comes
    /// second is a no-op.
    pub async fn finish_planning(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Planning => {}
            SessionState::Idle => return Err(self.invalid("finish planning")),
            state if state.is_terminal() => return Err(self.invalid("finish planning")),
            _ => {
                debug!("Planning already finished");
                return Ok(());
            }
        }

        self.timer.stop();

        match self.capture.open().await {
            Ok(()) => self.speech_available = true,
            Err(e) => {
                error!("{}; answers will not be captured", e);
                self.speech_available = false;
            }
        }

        self.activate(SlotId::new(Phase::Plan, 0)).await?;
        self.set_state(SessionState::PlanningInterview);
        Ok(())
    }

    /// Freeze the answer for `slot` and advance
    pub async fn lock(&mut self, slot: SlotId) -> Result<LockOutcome, SessionError> {
        if self.activation.is_locked(slot)? {
            debug!("Ignoring repeated lock of {}", slot);
            return Ok(LockOutcome::AlreadyLocked);
        }

        let expected = match slot.phase {
            Phase::Plan => SessionState::PlanningInterview,
            Phase::Imm => SessionState::ImmediateInterview,
        };
        if self.state != expected {
            return Err(self.invalid("lock"));
        }

        let outcome = self.activation.lock(slot, &mut self.log)?;
        match outcome {
            LockOutcome::Advanced(_) => self.resume_capture().await,
            LockOutcome::PlanningComplete => self.set_state(SessionState::ImmediateGate),
            LockOutcome::RevealNext(next) => self.speak_prompt(next)?,
            LockOutcome::ImmediateComplete => self.set_state(SessionState::ReadyToFinish),
            LockOutcome::AlreadyLocked => {}
        }
        Ok(outcome)
    }

    /// Speak the first immediate question
    pub fn start_immediate(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::ImmediateGate {
            return Err(self.invalid("start immediate phase"));
        }
        self.speak_prompt(SlotId::new(Phase::Imm, 0))
    }

    /// Reveal and activate the slot whose prompt just finished playing
    pub async fn prompt_finished(&mut self) -> Result<(), SessionError> {
        let SessionState::Prompting { slot } = self.state else {
            debug!("Ignoring prompt completion while {}", self.state.label());
            return Ok(());
        };

        self.speaker.acknowledge();
        self.activate(slot).await?;
        self.set_state(SessionState::ImmediateInterview);
        Ok(())
    }

    /// Stop capture and submit the session log.
    ///
    /// The in-memory log is cleared even when submission fails.
    pub async fn finish(&mut self) -> Result<SessionSummary, SessionError> {
        if self.state != SessionState::ReadyToFinish {
            return Err(self.invalid("finish"));
        }

        self.capture.close().await;

        let started_at = self.started_at.unwrap_or_else(Utc::now);
        let duration_seconds = Utc::now()
            .signed_duration_since(started_at)
            .num_seconds()
            .max(0);

        let mut details = std::mem::take(&mut self.log);
        details.planning = self.questions.planning.clone();
        details.immediate = self.questions.immediate.clone();
        self.set_state(SessionState::Finished);

        let summary = SessionSummary {
            session_id: self.config.session_id.clone(),
            duration_seconds,
            details,
        };

        match self
            .api
            .submit_session_log(duration_seconds, &summary.details)
            .await
        {
            Ok(_) => {
                info!(
                    "Session {} saved ({} answers, {}s)",
                    summary.session_id,
                    summary.details.answers.len(),
                    duration_seconds
                );
                Ok(summary)
            }
            Err(e) => {
                // TODO: keep the log for a retry instead of dropping it here
                error!("Failed to submit session log, local log discarded: {}", e);
                Err(e.into())
            }
        }
    }

    /// Abandon the session: stop the timer, close capture, persist nothing
    pub async fn leave(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        self.timer.stop();
        self.capture.close().await;
        self.speaker.cancel();
        self.activation.deactivate();
        self.log = SessionLog::default();
        self.set_state(SessionState::Cancelled);
    }

    /// Apply one event
    pub async fn handle(&mut self, event: SessionEvent) -> SessionReply {
        match event {
            SessionEvent::Command(command) => match command {
                SessionCommand::FinishPlanning => self.finish_planning().await.map(|_| None),
                SessionCommand::Lock(slot) => self.lock(slot).await.map(|_| None),
                SessionCommand::StartImmediate => self.start_immediate().map(|_| None),
                SessionCommand::Finish => self.finish().await.map(Some),
                SessionCommand::Leave => {
                    self.leave().await;
                    Ok(None)
                }
            },
            SessionEvent::Timer(TimerEvent::Tick(remaining)) => {
                debug!("Planning time left: {}", format_clock(remaining));
                Ok(None)
            }
            SessionEvent::Timer(TimerEvent::Expired) => {
                if self.state != SessionState::Planning {
                    return Ok(None);
                }
                info!("Planning time is up");
                self.finish_planning().await.map(|_| None)
            }
            SessionEvent::Recognition(event) => {
                self.capture.handle(event, &mut self.activation).await;
                Ok(None)
            }
            SessionEvent::PromptFinished => self.prompt_finished().await.map(|_| None),
        }
    }

    /// Drive the session from `requests`, the timer, the recognition stream
    /// and prompt playback until it finishes or is cancelled.
    ///
    /// Closing `requests` leaves the session.
    pub async fn run(&mut self, mut requests: mpsc::Receiver<SessionRequest>) {
        self.publish_status();

        while !self.state.is_terminal() {
            let (event, reply) = tokio::select! {
                request = requests.recv() => match request {
                    Some(request) => (SessionEvent::Command(request.command), request.reply),
                    None => {
                        info!("Session control closed, leaving");
                        (SessionEvent::Command(SessionCommand::Leave), None)
                    }
                },
                event = self.timer.next_event() => (SessionEvent::Timer(event), None),
                event = self.capture.next_event() => (SessionEvent::Recognition(event), None),
                () = self.speaker.finished() => (SessionEvent::PromptFinished, None),
            };

            let result = self.handle(event).await;
            // Publish before replying so callers observe the new state
            self.publish_status();

            match reply {
                Some(reply) => {
                    let _ = reply.send(result);
                }
                None => {
                    if let Err(e) = result {
                        warn!("Session event failed: {}", e);
                    }
                }
            }
        }

        info!(
            "Session {} ended ({})",
            self.config.session_id,
            self.state.label()
        );
    }

    /// Run the session on its own task
    pub fn spawn(mut self) -> SessionHandle {
        let (requests_tx, requests_rx) = mpsc::channel(32);
        let handle = SessionHandle {
            session_id: self.config.session_id.clone(),
            requests: requests_tx,
            status: self.subscribe(),
        };

        tokio::spawn(async move {
            self.run(requests_rx).await;
        });

        handle
    }

    /// Current snapshot for display
    pub fn status(&self) -> SessionStatus {
        let mut questions = Vec::new();
        if self.state != SessionState::Idle {
            for (idx, question) in self.questions.planning.iter().enumerate() {
                let slot = SlotId::new(Phase::Plan, idx);
                questions.push(VisibleQuestion {
                    slot,
                    content: question.content.clone(),
                    locked: self.activation.is_locked(slot).unwrap_or(false),
                });
            }
            for slot in self.activation.touched_slots() {
                if slot.phase != Phase::Imm {
                    continue;
                }
                if let Some(question) = self.questions.question(slot) {
                    questions.push(VisibleQuestion {
                        slot,
                        content: question.content.clone(),
                        locked: self.activation.is_locked(slot).unwrap_or(false),
                    });
                }
            }
        }

        let live_text = self
            .activation
            .active()
            .and_then(|slot| self.activation.buffer(slot))
            .map(|buffer| buffer.text().to_string());

        SessionStatus {
            session_id: self.config.session_id.clone(),
            state: self.state.label().to_string(),
            started_at: self.started_at,
            remaining_seconds: self.timer.remaining(),
            remaining_display: format_clock(self.timer.remaining()),
            active_slot: self.activation.active(),
            speech_available: self.speech_available,
            capture_restarts: self.capture.restart_count(),
            questions,
            live_text,
            interim_text: self.capture.interim().to_string(),
            answers: self.log.answers.clone(),
        }
    }

    async fn activate(&mut self, slot: SlotId) -> Result<(), SessionError> {
        self.activation.activate(slot)?;
        self.resume_capture().await;
        Ok(())
    }

    async fn resume_capture(&mut self) {
        if self.speech_available {
            self.capture.ensure_streaming().await;
        }
    }

    fn speak_prompt(&mut self, slot: SlotId) -> Result<(), SessionError> {
        let question = self
            .questions
            .question(slot)
            .ok_or(SessionError::InvalidIndex {
                phase: slot.phase,
                index: slot.index,
            })?;
        self.speaker.speak(&question.content);
        self.set_state(SessionState::Prompting { slot });
        Ok(())
    }

    fn set_state(&mut self, state: SessionState) {
        info!(
            "Session {}: {} -> {}",
            self.config.session_id,
            self.state.label(),
            state.label()
        );
        self.state = state;
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            state: self.state.label(),
        }
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(self.status());
    }
}

/// Handle to a session running on its own task
#[derive(Clone)]
pub struct SessionHandle {
    session_id: String,
    requests: mpsc::Sender<SessionRequest>,
    status: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.session_id
    }

    /// Latest published status
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Send a command and wait for the session to apply it
    pub async fn send(&self, command: SessionCommand) -> SessionReply {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.requests
            .send(SessionRequest {
                command,
                reply: Some(reply_tx),
            })
            .await
            .map_err(|_| SessionError::SessionClosed)?;
        reply_rx.await.map_err(|_| SessionError::SessionClosed)?
    }

    pub fn is_closed(&self) -> bool {
        self.requests.is_closed()
    }
}
