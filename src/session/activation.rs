//! Per-question activation and locking.
//!
//! Exactly one slot (or none) is active at a time, and only the active slot
//! receives transcript text. Locking freezes a slot's buffer into the session
//! log once; later locks of the same slot are no-ops.

use tracing::{debug, info};

use crate::error::SessionError;
use crate::models::{Phase, SessionLog, SlotId};

/// Answer text for one slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerBuffer {
    text: String,
    holds_placeholder: bool,
    locked: bool,
}

impl AnswerBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn holds_placeholder(&self) -> bool {
        self.holds_placeholder
    }

    /// Captured text without placeholder or trailing separator
    pub fn answer(&self) -> &str {
        if self.holds_placeholder {
            ""
        } else {
            self.text.trim_end()
        }
    }

    fn show_placeholder(&mut self, placeholder: &str) {
        if self.text.is_empty() || self.holds_placeholder {
            self.text = placeholder.to_string();
            self.holds_placeholder = true;
        }
    }

    fn append_final(&mut self, segment: &str) {
        if self.holds_placeholder {
            self.text.clear();
            self.holds_placeholder = false;
        }
        self.text.push_str(segment);
        if !self.text.ends_with(char::is_whitespace) {
            self.text.push(' ');
        }
    }
}

/// What happened after a slot was locked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    /// Next planning slot is now active
    Advanced(SlotId),
    /// Last planning slot locked; immediate phase can be unlocked
    PlanningComplete,
    /// Immediate slot locked; the next one must be prompted before activation
    RevealNext(SlotId),
    /// Last immediate slot locked; session can be finished
    ImmediateComplete,
    /// Slot was already locked; nothing changed
    AlreadyLocked,
}

/// Tracks which single question slot is live for capture
#[derive(Debug, Clone)]
pub struct QuestionActivation {
    planning: Vec<AnswerBuffer>,
    immediate: Vec<AnswerBuffer>,
    active: Option<SlotId>,
    placeholder: String,
}

impl QuestionActivation {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            planning: vec![AnswerBuffer::default(); Phase::Plan.slot_count()],
            immediate: vec![AnswerBuffer::default(); Phase::Imm.slot_count()],
            active: None,
            placeholder: placeholder.into(),
        }
    }

    /// Currently active slot, which is also the capture target
    pub fn active(&self) -> Option<SlotId> {
        self.active
    }

    pub fn buffer(&self, slot: SlotId) -> Option<&AnswerBuffer> {
        self.buffers(slot.phase).get(slot.index)
    }

    pub fn is_locked(&self, slot: SlotId) -> Result<bool, SessionError> {
        self.checked(slot).map(|buffer| buffer.locked)
    }

    /// Make `slot` the sole active slot and point capture at its buffer
    pub fn activate(&mut self, slot: SlotId) -> Result<(), SessionError> {
        let placeholder = self.placeholder.clone();
        let buffer = self.checked_mut(slot)?;
        if buffer.locked {
            return Err(SessionError::InvalidTransition {
                action: "activate",
                state: "locked",
            });
        }
        buffer.show_placeholder(&placeholder);

        if let Some(previous) = self.active.replace(slot) {
            debug!("Deactivated slot {}", previous);
        }
        info!("Activated slot {}", slot);
        Ok(())
    }

    /// Clear the active slot; subsequent transcript text is dropped
    pub fn deactivate(&mut self) {
        if let Some(previous) = self.active.take() {
            debug!("Deactivated slot {}", previous);
        }
    }

    /// Append final transcript text to the active buffer.
    ///
    /// Returns `false` (and drops the text) when no slot is active.
    pub fn capture(&mut self, segment: &str) -> bool {
        let Some(slot) = self.active else {
            return false;
        };
        match self.checked_mut(slot) {
            Ok(buffer) if !buffer.locked => {
                buffer.append_final(segment);
                true
            }
            _ => false,
        }
    }

    /// Freeze `slot` into `log` under `<phase>_<index>` and advance.
    ///
    /// Planning slots auto-activate their successor; immediate slots only
    /// report which slot must be revealed next.
    pub fn lock(&mut self, slot: SlotId, log: &mut SessionLog) -> Result<LockOutcome, SessionError> {
        let active = self.active;
        let buffer = self.checked_mut(slot)?;
        if buffer.locked {
            debug!("Slot {} already locked", slot);
            return Ok(LockOutcome::AlreadyLocked);
        }
        if active != Some(slot) {
            return Err(SessionError::SlotNotActive {
                phase: slot.phase,
                index: slot.index,
            });
        }

        buffer.locked = true;
        log.answers.insert(slot.answer_key(), buffer.answer().to_string());
        self.active = None;
        info!("Locked slot {}", slot);

        let next = slot.index + 1;
        let outcome = match slot.phase {
            Phase::Plan if next < Phase::Plan.slot_count() => {
                let next = SlotId::new(Phase::Plan, next);
                self.activate(next)?;
                LockOutcome::Advanced(next)
            }
            Phase::Plan => LockOutcome::PlanningComplete,
            Phase::Imm if next < Phase::Imm.slot_count() => {
                LockOutcome::RevealNext(SlotId::new(Phase::Imm, next))
            }
            Phase::Imm => LockOutcome::ImmediateComplete,
        };
        Ok(outcome)
    }

    /// Slots that are active or locked, in phase order
    pub fn touched_slots(&self) -> Vec<SlotId> {
        [Phase::Plan, Phase::Imm]
            .into_iter()
            .flat_map(|phase| {
                self.buffers(phase)
                    .iter()
                    .enumerate()
                    .map(move |(idx, buffer)| (SlotId::new(phase, idx), buffer.locked))
            })
            .filter(|(slot, locked)| *locked || self.active == Some(*slot))
            .map(|(slot, _)| slot)
            .collect()
    }

    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.placeholder));
    }

    fn buffers(&self, phase: Phase) -> &[AnswerBuffer] {
        match phase {
            Phase::Plan => &self.planning,
            Phase::Imm => &self.immediate,
        }
    }

    fn checked(&self, slot: SlotId) -> Result<&AnswerBuffer, SessionError> {
        self.buffers(slot.phase)
            .get(slot.index)
            .ok_or(SessionError::InvalidIndex {
                phase: slot.phase,
                index: slot.index,
            })
    }

    fn checked_mut(&mut self, slot: SlotId) -> Result<&mut AnswerBuffer, SessionError> {
        let buffers = match slot.phase {
            Phase::Plan => &mut self.planning,
            Phase::Imm => &mut self.immediate,
        };
        buffers.get_mut(slot.index).ok_or(SessionError::InvalidIndex {
            phase: slot.phase,
            index: slot.index,
        })
    }
}
