mod common;

use common::{finals, started_session, FakeApi, FakeSynthesizer, Harness};
use mock_interview::error::SessionError;
use mock_interview::models::{Phase, SlotId};
use mock_interview::session::{
    InterviewSession, LockOutcome, SessionCommand, SessionEvent, SessionState, TimerEvent,
};
use mock_interview::speech::{RecognitionEvent, RecognitionSegment, UnsupportedRecognizer};
use std::sync::Arc;
use std::time::Duration;

fn plan(index: usize) -> SlotId {
    SlotId::new(Phase::Plan, index)
}

fn imm(index: usize) -> SlotId {
    SlotId::new(Phase::Imm, index)
}

async fn say(h: &mut Harness, text: &str) {
    h.session
        .handle(SessionEvent::Recognition(finals(text)))
        .await
        .unwrap();
}

/// Planning answers locked, session waiting at the immediate gate
async fn through_planning(h: &mut Harness) {
    h.session.finish_planning().await.unwrap();
    for (idx, text) in ["A", "B", "C"].into_iter().enumerate() {
        say(h, text).await;
        h.session.lock(plan(idx)).await.unwrap();
    }
}

#[tokio::test]
async fn test_full_session_submits_every_answer() {
    let mut h = started_session(FakeApi::new(), 900).await;
    assert_eq!(h.session.state(), SessionState::Planning);
    assert!(h.session.timer().is_running());

    through_planning(&mut h).await;
    assert_eq!(h.session.state(), SessionState::ImmediateGate);
    assert_eq!(h.probe.starts(), 1);

    h.session.start_immediate().unwrap();
    assert_eq!(
        h.session.state(),
        SessionState::Prompting { slot: imm(0) }
    );
    h.session.prompt_finished().await.unwrap();
    assert_eq!(h.session.state(), SessionState::ImmediateInterview);
    say(&mut h, "D").await;
    assert_eq!(
        h.session.lock(imm(0)).await.unwrap(),
        LockOutcome::RevealNext(imm(1))
    );

    assert_eq!(
        h.session.state(),
        SessionState::Prompting { slot: imm(1) }
    );
    h.session.prompt_finished().await.unwrap();
    say(&mut h, "E").await;
    assert_eq!(
        h.session.lock(imm(1)).await.unwrap(),
        LockOutcome::ImmediateComplete
    );
    assert_eq!(h.session.state(), SessionState::ReadyToFinish);

    let summary = h.session.finish().await.unwrap();
    assert_eq!(h.session.state(), SessionState::Finished);

    let answers: Vec<_> = summary.details.answers.values().cloned().collect();
    assert_eq!(answers, vec!["D", "E", "A", "B", "C"]);
    assert_eq!(summary.details.answers["plan_0"], "A");
    assert_eq!(summary.details.answers["imm_1"], "E");
    assert_eq!(summary.details.planning.len(), 3);
    assert_eq!(summary.details.immediate.len(), 2);

    let submissions = h.api.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].1, summary.details);

    // Capture is closed once the session is submitted
    assert!(!h.session.capture().is_open());
    assert!(h.probe.stops() >= 1);
    assert!(h.session.log().is_empty());
}

#[tokio::test]
async fn test_duration_is_measured_from_start() {
    let mut h = started_session(FakeApi::new(), 900).await;
    tokio::time::sleep(Duration::from_millis(1100)).await;

    through_planning(&mut h).await;
    h.session.start_immediate().unwrap();
    for idx in 0..2 {
        h.session.prompt_finished().await.unwrap();
        h.session.lock(imm(idx)).await.unwrap();
    }

    let summary = h.session.finish().await.unwrap();
    assert!(
        (1..=3).contains(&summary.duration_seconds),
        "unexpected duration {}",
        summary.duration_seconds
    );
    assert_eq!(h.api.submissions()[0].0, summary.duration_seconds);
}

#[tokio::test(start_paused = true)]
async fn test_timer_expiry_then_manual_finish_is_noop() {
    let mut h = started_session(FakeApi::new(), 2).await;

    h.session
        .handle(SessionEvent::Timer(TimerEvent::Expired))
        .await
        .unwrap();
    assert_eq!(h.session.state(), SessionState::PlanningInterview);
    assert_eq!(h.session.activation().active(), Some(plan(0)));

    h.session
        .handle(SessionEvent::Command(SessionCommand::FinishPlanning))
        .await
        .unwrap();
    assert_eq!(h.session.state(), SessionState::PlanningInterview);
    assert_eq!(h.probe.starts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_manual_finish_stops_timer() {
    let mut h = started_session(FakeApi::new(), 2).await;

    h.session.finish_planning().await.unwrap();
    assert!(!h.session.timer().is_running());

    // A late expiry does not re-run the transition
    h.session
        .handle(SessionEvent::Timer(TimerEvent::Expired))
        .await
        .unwrap();
    assert_eq!(h.session.state(), SessionState::PlanningInterview);
    assert_eq!(h.probe.starts(), 1);
}

#[tokio::test]
async fn test_finish_planning_before_start_is_rejected() {
    let (recognizer, _probe) = common::FakeRecognizer::new();
    let mut session = InterviewSession::new(
        common::test_config(900),
        FakeApi::new(),
        recognizer,
        Arc::new(FakeSynthesizer::default()),
    );

    let err = session.finish_planning().await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidTransition { .. }));
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_lock_rules() {
    let mut h = started_session(FakeApi::new(), 900).await;

    // Nothing to lock while planning
    assert!(matches!(
        h.session.lock(plan(0)).await,
        Err(SessionError::InvalidTransition { .. })
    ));

    h.session.finish_planning().await.unwrap();

    assert!(matches!(
        h.session.lock(plan(1)).await,
        Err(SessionError::SlotNotActive { .. })
    ));
    assert!(matches!(
        h.session.lock(plan(7)).await,
        Err(SessionError::InvalidIndex { .. })
    ));

    say(&mut h, "first").await;
    h.session.lock(plan(0)).await.unwrap();

    // Locked text is frozen
    say(&mut h, "second").await;
    assert_eq!(
        h.session.lock(plan(0)).await.unwrap(),
        LockOutcome::AlreadyLocked
    );
    assert_eq!(h.session.log().answer(plan(0)), Some("first"));
    assert_eq!(h.session.activation().active(), Some(plan(1)));
}

#[tokio::test]
async fn test_only_final_segments_reach_answers() {
    let mut h = started_session(FakeApi::new(), 900).await;
    h.session.finish_planning().await.unwrap();

    h.session
        .handle(SessionEvent::Recognition(RecognitionEvent::Results(vec![
            RecognitionSegment::final_text("hello"),
            RecognitionSegment::interim("wor"),
        ])))
        .await
        .unwrap();

    assert_eq!(h.session.capture().interim(), "wor");
    let status = h.session.status();
    assert_eq!(status.live_text.as_deref(), Some("hello "));
    assert_eq!(status.interim_text, "wor");
}

#[tokio::test]
async fn test_results_while_prompting_are_dropped() {
    let mut h = started_session(FakeApi::new(), 900).await;
    through_planning(&mut h).await;
    h.session.start_immediate().unwrap();

    say(&mut h, "spoken over the prompt").await;
    h.session.prompt_finished().await.unwrap();
    h.session.lock(imm(0)).await.unwrap();

    assert_eq!(h.session.log().answer(imm(0)), Some(""));
}

#[tokio::test]
async fn test_stream_end_restarts_while_answering() {
    let mut h = started_session(FakeApi::new(), 900).await;
    h.session.finish_planning().await.unwrap();

    for _ in 0..2 {
        h.session
            .handle(SessionEvent::Recognition(RecognitionEvent::Ended))
            .await
            .unwrap();
    }

    assert_eq!(h.probe.starts(), 3);
    assert_eq!(h.session.status().capture_restarts, 2);
}

#[tokio::test]
async fn test_leave_persists_nothing() {
    let mut h = started_session(FakeApi::new(), 900).await;
    h.session.finish_planning().await.unwrap();
    say(&mut h, "A").await;
    h.session.lock(plan(0)).await.unwrap();

    h.session
        .handle(SessionEvent::Command(SessionCommand::Leave))
        .await
        .unwrap();

    assert_eq!(h.session.state(), SessionState::Cancelled);
    assert!(h.api.submissions().is_empty());
    assert!(h.session.log().is_empty());
    assert!(!h.session.capture().is_open());
    assert_eq!(h.probe.stops(), 1);

    // Leaving twice is harmless
    h.session.leave().await;
    assert_eq!(h.probe.stops(), 1);
}

#[tokio::test]
async fn test_unsupported_environment_still_runs() {
    let mut session = InterviewSession::new(
        common::test_config(900),
        FakeApi::new(),
        Box::new(UnsupportedRecognizer),
        Arc::new(FakeSynthesizer::default()),
    );
    session.start().await.unwrap();
    session.finish_planning().await.unwrap();

    assert!(!session.speech_available());
    assert_eq!(session.state(), SessionState::PlanningInterview);
    assert!(!session.status().speech_available);

    session.lock(plan(0)).await.unwrap();
    assert_eq!(session.log().answer(plan(0)), Some(""));
}

#[tokio::test]
async fn test_failed_submit_discards_log() {
    let mut h = started_session(FakeApi::failing_submit(), 900).await;
    through_planning(&mut h).await;
    h.session.start_immediate().unwrap();
    for idx in 0..2 {
        h.session.prompt_finished().await.unwrap();
        h.session.lock(imm(idx)).await.unwrap();
    }

    let err = h.session.finish().await.unwrap_err();
    assert!(matches!(err, SessionError::Api(_)));
    assert_eq!(h.session.state(), SessionState::Finished);
    assert!(h.session.log().is_empty());
    assert!(h.api.submissions().is_empty());
}

#[tokio::test]
async fn test_finish_requires_all_answers() {
    let mut h = started_session(FakeApi::new(), 900).await;
    through_planning(&mut h).await;

    assert!(matches!(
        h.session.finish().await,
        Err(SessionError::InvalidTransition { .. })
    ));
    assert!(h.api.submissions().is_empty());
}

#[tokio::test]
async fn test_incomplete_question_set_fails_start() {
    let mut set = common::sample_set();
    set.immediate.pop();
    let api = Arc::new(FakeApi {
        set,
        ..Default::default()
    });
    let (recognizer, _probe) = common::FakeRecognizer::new();
    let mut session = InterviewSession::new(
        common::test_config(900),
        api,
        recognizer,
        Arc::new(FakeSynthesizer::default()),
    );

    let err = session.start().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::IncompleteQuestionSet {
            phase: Phase::Imm,
            expected: 2,
            actual: 1
        }
    ));
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_spawned_session_runs_to_completion() {
    let h = started_session(FakeApi::new(), 2).await;
    let probe = h.probe.clone();
    let api = h.api.clone();
    let synthesizer = h.synthesizer.clone();
    let handle = h.session.spawn();
    let mut status = handle.watch();

    // Planning time runs out on its own
    status
        .wait_for(|s| s.state == "planning_interview")
        .await
        .unwrap();
    assert_eq!(handle.status().remaining_seconds, 0);

    for (idx, text) in ["A", "B", "C"].into_iter().enumerate() {
        assert!(probe.push(finals(text)).await);
        status
            .wait_for(|s| s.live_text.as_deref().map(str::trim_end) == Some(text))
            .await
            .unwrap();
        handle.send(SessionCommand::Lock(plan(idx))).await.unwrap();
    }
    assert_eq!(handle.status().state, "immediate_gate");

    // Silence ends the stream; it comes back while a slot is active
    handle.send(SessionCommand::StartImmediate).await.unwrap();
    status
        .wait_for(|s| s.state == "immediate_interview")
        .await
        .unwrap();
    probe.end_stream();
    status.wait_for(|s| s.capture_restarts == 1).await.unwrap();

    for (idx, text) in ["D", "E"].into_iter().enumerate() {
        status
            .wait_for(|s| s.active_slot == Some(imm(idx)))
            .await
            .unwrap();
        assert!(probe.push(finals(text)).await);
        status
            .wait_for(|s| s.live_text.as_deref().map(str::trim_end) == Some(text))
            .await
            .unwrap();
        handle.send(SessionCommand::Lock(imm(idx))).await.unwrap();
    }

    let summary = handle
        .send(SessionCommand::Finish)
        .await
        .unwrap()
        .expect("finish returns a summary");
    assert_eq!(summary.details.answers.len(), 5);
    assert_eq!(summary.details.answers["imm_0"], "D");
    assert_eq!(api.submissions().len(), 1);
    assert_eq!(synthesizer.spoken(), vec!["I1", "I2"]);

    // The task is gone once the session is terminal
    assert!(matches!(
        handle.send(SessionCommand::Leave).await,
        Err(SessionError::SessionClosed)
    ));
}
