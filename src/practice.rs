//! Terminal front end for a single practice session
//!
//! Reads one line per action from stdin and prints the session's progress as
//! it is published. An empty line locks the answer being spoken.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::error::SessionError;
use crate::models::{Phase, SlotId};
use crate::session::{SessionCommand, SessionHandle, SessionStatus, SessionSummary};

const HELP: &str = "Enter: lock the current answer | start: next phase | finish: save | quit: leave";

/// Map one line of input to a command for the session in `status`
pub fn command_for_input(status: &SessionStatus, input: &str) -> Option<SessionCommand> {
    match input.trim().to_lowercase().as_str() {
        "" => match status.state.as_str() {
            "planning_interview" | "immediate_interview" => {
                status.active_slot.map(SessionCommand::Lock)
            }
            _ => None,
        },
        "start" => match status.state.as_str() {
            "planning" => Some(SessionCommand::FinishPlanning),
            "immediate_gate" => Some(SessionCommand::StartImmediate),
            _ => None,
        },
        "finish" => Some(SessionCommand::Finish),
        "quit" | "leave" | "q" => Some(SessionCommand::Leave),
        other => parse_lock(other).map(SessionCommand::Lock),
    }
}

/// `lock plan 1` / `lock imm 0`
fn parse_lock(input: &str) -> Option<SlotId> {
    let mut parts = input.split_whitespace();
    if parts.next()? != "lock" {
        return None;
    }
    let phase: Phase = parts.next()?.parse().ok()?;
    let index = parts.next()?.parse().ok()?;
    Some(SlotId::new(phase, index))
}

/// One line describing what changed between two snapshots
fn describe_change(prev: &SessionStatus, next: &SessionStatus) -> Option<String> {
    if prev.state != next.state {
        let mut line = format!("[{}]", next.state);
        if let Some(slot) = next.active_slot {
            if let Some(q) = next.questions.iter().find(|q| q.slot == slot) {
                line.push_str(&format!(" {}: {}", slot, q.content));
            }
        }
        if next.state == "planning" {
            for q in &next.questions {
                line.push_str(&format!("\n  {}: {}", q.slot, q.content));
            }
        }
        return Some(line);
    }
    if prev.live_text != next.live_text {
        return next.live_text.as_ref().map(|text| format!("  > {}", text));
    }
    if next.state == "planning"
        && prev.remaining_seconds != next.remaining_seconds
        && next.remaining_seconds % 60 == 0
    {
        return Some(format!("  {} left", next.remaining_display));
    }
    None
}

/// Drive `handle` from stdin until the session finishes or is left.
///
/// Returns the summary when the session was saved.
pub async fn run_practice(handle: SessionHandle) -> Result<Option<SessionSummary>> {
    let mut status_rx = handle.watch();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = status_rx.borrow_and_update().clone();

    println!("{}", HELP);
    if let Some(line) = describe_change(&SessionStatus::default(), &last) {
        println!("{}", line);
    }

    loop {
        tokio::select! {
            changed = status_rx.changed() => {
                if changed.is_err() {
                    return Ok(None);
                }
                let next = status_rx.borrow_and_update().clone();
                if let Some(line) = describe_change(&last, &next) {
                    println!("{}", line);
                }
                last = next;
                if last.state == "cancelled" {
                    return Ok(None);
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    handle.send(SessionCommand::Leave).await.ok();
                    return Ok(None);
                };
                let Some(command) = command_for_input(&last, &line) else {
                    println!("{}", HELP);
                    continue;
                };
                match handle.send(command).await {
                    Ok(Some(summary)) => return Ok(Some(summary)),
                    Ok(None) if command == SessionCommand::Leave => return Ok(None),
                    Ok(None) => {}
                    Err(SessionError::SessionClosed) => return Ok(None),
                    Err(e) => {
                        warn!("{}", e);
                        println!("! {}", e);
                    }
                }
            }
        }
    }
}
