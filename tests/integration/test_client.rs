//! Wire-level tests for the HTTP client and the debounced reporter.

mod support;

use std::time::Duration;

use courseflow_client::{ApiClient, PositionReporter};
use courseflow_session::{AttemptStatus, BackendError, LearnBackend, StartAttemptRequest};
use support::{sample_course, spawn_backend, test_config, ServerState};

async fn client_for(state: &support::SharedState) -> ApiClient {
    let base_url = spawn_backend(state.clone()).await;
    ApiClient::new(&test_config(&base_url)).expect("Failed to build client")
}

#[tokio::test]
async fn test_fetch_curriculum_unwraps_envelope() {
    let state = ServerState::with_course(sample_course());
    let client = client_for(&state).await;

    let curriculum = client
        .fetch_curriculum("course-1")
        .await
        .expect("fetch curriculum");
    assert_eq!(curriculum.course_id, "course-1");
    assert_eq!(curriculum.total_lessons(), 3);
}

#[tokio::test]
async fn test_curriculum_without_course_id_is_backfilled() {
    let state = ServerState::with_course(sample_course());
    state.lock().expect("state lock").omit_course_id = true;
    let client = client_for(&state).await;

    let curriculum = client
        .fetch_curriculum("course-1")
        .await
        .expect("fetch curriculum");
    assert_eq!(curriculum.course_id, "course-1");
}

#[tokio::test]
async fn test_unknown_course_maps_to_status_error() {
    let state = ServerState::with_course(sample_course());
    let client = client_for(&state).await;

    let err = client
        .fetch_curriculum("course-missing")
        .await
        .expect_err("fetch should fail");
    match err {
        BackendError::Status { status, .. } => assert_eq!(status, 404),
        other => panic!("expected status error, got: {other}"),
    }
}

#[tokio::test]
async fn test_unreachable_backend_maps_to_network_error() {
    let config = test_config("http://127.0.0.1:1");
    let client = ApiClient::new(&config).expect("Failed to build client");

    let err = client
        .fetch_curriculum("course-1")
        .await
        .expect_err("fetch should fail");
    assert!(matches!(err, BackendError::Network { .. }));
}

#[tokio::test]
async fn test_watch_position_put_updates_server() {
    let state = ServerState::with_course(sample_course());
    let client = client_for(&state).await;

    client
        .put_watch_position("user-1", "lesson-1", 240)
        .await
        .expect("put position");

    let server = state.lock().expect("state lock");
    assert_eq!(server.position_puts, vec![("lesson-1".to_string(), 240)]);
    assert_eq!(
        server.lessons.get("lesson-1").map(|p| p.last_watched_position),
        Some(240)
    );
}

#[tokio::test]
async fn test_debounced_reporter_sends_one_put_with_last_position() {
    let state = ServerState::with_course(sample_course());
    let client = client_for(&state).await;

    let sink = client.position_sink("user-1");
    let mut reporter = PositionReporter::new(sink, Duration::from_millis(100));

    // A burst of ticks well inside the window.
    for position in [10, 11, 12, 13, 14] {
        reporter.record("lesson-1", position);
    }
    assert!(reporter.wait_and_send().await);

    let server = state.lock().expect("state lock");
    assert_eq!(server.position_puts, vec![("lesson-1".to_string(), 14)]);
}

#[tokio::test]
async fn test_mark_lesson_complete_roundtrip() {
    let state = ServerState::with_course(sample_course());
    let client = client_for(&state).await;

    client
        .mark_lesson_complete("user-1", "lesson-3")
        .await
        .expect("mark complete");
    assert!(state.lock().expect("state lock").lesson_completed("lesson-3"));

    let snapshot = client
        .fetch_progress("user-1", "course-1")
        .await
        .expect("fetch progress");
    assert!(snapshot.lessons["lesson-3"].completed);
    assert_eq!(snapshot.overall.completed_lessons, 1);
}

#[tokio::test]
async fn test_attempt_create_then_finalize() {
    let state = ServerState::with_course(sample_course());
    let client = client_for(&state).await;

    let created = client
        .start_attempt(&StartAttemptRequest {
            assessment_id: "quiz-1".to_string(),
            user_id: "user-1".to_string(),
            enrollment_id: "enr-1".to_string(),
            status: AttemptStatus::InProgress,
            started_at: chrono::Utc::now(),
        })
        .await
        .expect("create attempt");
    assert_eq!(created.status, AttemptStatus::InProgress);
    assert_eq!(created.attempt_number, 1);

    let mut answers = std::collections::HashMap::new();
    answers.insert("q1".to_string(), "4".to_string());
    let finalized = client
        .submit_attempt(&courseflow_session::SubmitAttemptRequest {
            submit: true,
            id: created.id.clone(),
            answers,
            score: 1.0,
            percentage: 50.0,
            passed: true,
            status: AttemptStatus::Completed,
            completed_at: chrono::Utc::now(),
            time_spent: 42,
        })
        .await
        .expect("finalize attempt");

    assert_eq!(finalized.id, created.id);
    assert_eq!(finalized.status, AttemptStatus::Completed);
    assert_eq!(finalized.score, Some(1.0));
    assert_eq!(finalized.passed, Some(true));
    assert_eq!(finalized.time_spent, Some(42));
}
