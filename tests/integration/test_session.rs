//! End-to-end session tests against the in-process mock backend.
//!
//! These exercise the full stack: session engine driving the real HTTP
//! client against an axum server speaking the platform's wire contracts.

mod support;

use courseflow_client::ApiClient;
use courseflow_session::{
    AttemptPhase, CompletionState, LearningSession, SessionError,
};
use support::{sample_course, spawn_backend, test_config, ServerState};

async fn session_for(
    state: &support::SharedState,
) -> LearningSession<ApiClient> {
    let base_url = spawn_backend(state.clone()).await;
    let config = test_config(&base_url);
    let client = ApiClient::new(&config).expect("Failed to build client");
    LearningSession::new(client, config, "user-1", "course-1")
}

#[tokio::test]
async fn test_load_and_navigate() {
    let state = ServerState::with_course(sample_course());
    state
        .lock()
        .expect("state lock")
        .lessons
        .insert("lesson-1".to_string(), courseflow_session::LessonProgress {
            last_watched_position: 120,
            ..courseflow_session::LessonProgress::default()
        });

    let mut session = session_for(&state).await;
    session.load().await.expect("Failed to load session");

    let curriculum = session.curriculum().expect("curriculum loaded");
    assert_eq!(curriculum.course_title, "Intro to Testing");
    assert_eq!(session.navigator().current_lesson(), Some("lesson-1"));
    assert_eq!(session.tracker().resume_position("lesson-1"), 120);

    // Walk forward through the whole course.
    assert!(session.advance().await.expect("advance"));
    assert_eq!(session.navigator().current_lesson(), Some("lesson-2"));
    assert!(session.advance().await.expect("advance"));
    assert_eq!(session.navigator().current_lesson(), Some("lesson-3"));
    assert!(!session.advance().await.expect("advance"));
}

#[tokio::test]
async fn test_unknown_course_fails_to_load() {
    let state = ServerState::with_course(sample_course());
    let base_url = spawn_backend(state).await;
    let config = test_config(&base_url);
    let client = ApiClient::new(&config).expect("Failed to build client");

    let mut session = LearningSession::new(client, config, "user-1", "course-missing");
    let err = session.load().await.expect_err("load should fail");
    assert!(matches!(err, SessionError::CurriculumLoad { .. }));
    assert!(session.curriculum().is_none());
}

#[tokio::test]
async fn test_empty_curriculum_is_rejected() {
    let mut course = sample_course();
    course.modules.clear();
    let state = ServerState::with_course(course);

    let mut session = session_for(&state).await;
    let err = session.load().await.expect_err("load should fail");
    assert!(matches!(err, SessionError::EmptyCurriculum { .. }));
}

#[tokio::test]
async fn test_quiz_attempt_passes_and_completes_lesson() {
    let state = ServerState::with_course(sample_course());
    let mut session = session_for(&state).await;
    session.load().await.expect("Failed to load session");

    session.start_assessment("quiz-1").expect("start");
    assert_eq!(session.controller().phase(), AttemptPhase::Confirming);

    session.confirm_start().await.expect("confirm");
    assert_eq!(session.controller().phase(), AttemptPhase::InProgress);

    session.set_answer("q1", "4").expect("answer q1");
    session.set_answer("q2", "false").expect("answer q2");

    let summary = session
        .submit()
        .await
        .expect("submit")
        .expect("first submission returns a summary");
    assert!((summary.percentage - 50.0).abs() < f64::EPSILON);
    assert!(summary.passed);
    assert_eq!(session.controller().phase(), AttemptPhase::Reviewing);

    // Server state: attempt finalized with the client-computed score, and
    // the originating lesson auto-completed.
    let server = state.lock().expect("state lock");
    assert_eq!(server.attempts.len(), 1);
    let attempt = &server.attempts[0];
    assert_eq!(attempt.score, Some(1.0));
    assert_eq!(attempt.percentage, Some(50.0));
    assert_eq!(attempt.passed, Some(true));
    assert_eq!(attempt.answers.get("q1").map(String::as_str), Some("4"));
    assert!(server.lesson_completed("lesson-2"));
    drop(server);

    assert!(session.tracker().is_completed("lesson-2"));
}

#[tokio::test]
async fn test_in_progress_attempt_is_resumed() {
    let state = ServerState::with_course(sample_course());
    let mut session = session_for(&state).await;
    session.load().await.expect("Failed to load session");

    // First confirm creates a server-side attempt; abandon the local view
    // without submitting, as a page reload would.
    session.start_assessment("quiz-1").expect("start");
    session.confirm_start().await.expect("confirm");
    session.set_answer("q1", "4").expect("answer q1");
    let first_id = state.lock().expect("state lock").attempts[0].id.clone();

    // The local answer never reached the server in this flow, so seed it
    // there the way an autosaving backend would hold it.
    state.lock().expect("state lock").attempts[0]
        .answers
        .insert("q1".to_string(), "4".to_string());

    session.load().await.expect("reload");
    session.start_assessment("quiz-1").expect("restart");
    session.confirm_start().await.expect("reconfirm");

    // Same server-side attempt, answers pre-populated.
    let server = state.lock().expect("state lock");
    assert_eq!(server.attempts.len(), 1);
    assert_eq!(server.attempts[0].id, first_id);
    drop(server);

    assert_eq!(
        session.controller().answers().get("q1").map(String::as_str),
        Some("4")
    );
    assert_eq!(session.controller().unanswered(), 1);
}

#[tokio::test]
async fn test_mark_complete_confirms_optimistic_patch() {
    let state = ServerState::with_course(sample_course());
    let mut session = session_for(&state).await;
    session.load().await.expect("Failed to load session");

    session
        .mark_lesson_complete("lesson-1")
        .await
        .expect("mark complete");

    // The POST landed and the follow-up fetch confirmed the local patch.
    assert!(state.lock().expect("state lock").lesson_completed("lesson-1"));
    assert!(session.tracker().is_completed("lesson-1"));
    assert_eq!(
        session.tracker().completion_state("lesson-1"),
        Some(CompletionState::Confirmed)
    );
}

#[tokio::test]
async fn test_confirm_without_enrollment_is_rejected() {
    let state = ServerState::with_course(sample_course());
    state.lock().expect("state lock").enrollment_id = None;

    let mut session = session_for(&state).await;
    session.load().await.expect("Failed to load session");

    session.start_assessment("quiz-1").expect("start");
    let err = session
        .confirm_start()
        .await
        .expect_err("confirm should fail");
    assert!(matches!(err, SessionError::MissingEnrollment));

    // Rejected before any attempt was created server-side.
    assert!(state.lock().expect("state lock").attempts.is_empty());
}

#[tokio::test]
async fn test_attempt_number_increments_per_retake() {
    let state = ServerState::with_course(sample_course());
    let mut session = session_for(&state).await;
    session.load().await.expect("Failed to load session");

    // First attempt: fail it (both answers wrong).
    session.start_assessment("quiz-1").expect("start");
    session.confirm_start().await.expect("confirm");
    session.set_answer("q1", "3").expect("answer");
    session.set_answer("q2", "false").expect("answer");
    let summary = session
        .submit()
        .await
        .expect("submit")
        .expect("summary");
    assert!(!summary.passed);

    // Retake re-enters the dialog; the second attempt gets number 2.
    assert!(session.can_retake());
    session.retake().expect("retake");
    session.confirm_start().await.expect("reconfirm");

    let server = state.lock().expect("state lock");
    assert_eq!(server.attempts.len(), 2);
    assert_eq!(server.attempts[1].attempt_number, 2);
}
