//! Shared test support: an in-process mock of the learning platform API.
//!
//! Serves the same six endpoint contracts the real backend exposes, backed
//! by in-memory state the tests can seed and inspect.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use courseflow_session::{
    AssessmentAttempt, AssessmentLevel, Assessment, AttemptStatus, ContentType, CourseProgress,
    Curriculum, Lesson, LessonProgress, Module, ProgressSnapshot, Question, QuestionType,
    SessionConfig,
};

pub type SharedState = Arc<Mutex<ServerState>>;

/// In-memory backend state.
#[derive(Debug, Default)]
pub struct ServerState {
    pub curriculum: Option<Curriculum>,
    pub enrollment_id: Option<String>,
    pub lessons: HashMap<String, LessonProgress>,
    pub attempts: Vec<AssessmentAttempt>,
    /// Every PUT received, as (lesson id, position).
    pub position_puts: Vec<(String, u32)>,
    /// Serve curriculum payloads without the `courseId` field, as some
    /// backend versions do.
    pub omit_course_id: bool,
    next_attempt: u32,
}

impl ServerState {
    pub fn with_course(curriculum: Curriculum) -> SharedState {
        Arc::new(Mutex::new(Self {
            curriculum: Some(curriculum),
            enrollment_id: Some("enr-1".to_string()),
            ..Self::default()
        }))
    }

    pub fn lesson_completed(&self, lesson_id: &str) -> bool {
        self.lessons.get(lesson_id).is_some_and(|p| p.completed)
    }

    fn snapshot(&self) -> ProgressSnapshot {
        let total_lessons = self
            .curriculum
            .as_ref()
            .map_or(0, |c| u32::try_from(c.total_lessons()).unwrap_or(0));
        let completed_lessons =
            u32::try_from(self.lessons.values().filter(|p| p.completed).count()).unwrap_or(0);
        let overall_percentage = if total_lessons == 0 {
            0.0
        } else {
            f64::from(completed_lessons) / f64::from(total_lessons) * 100.0
        };

        let mut attempts: HashMap<String, Vec<AssessmentAttempt>> = HashMap::new();
        for attempt in &self.attempts {
            attempts
                .entry(attempt.assessment_id.clone())
                .or_default()
                .push(attempt.clone());
        }

        ProgressSnapshot {
            enrollment_id: self.enrollment_id.clone(),
            overall: CourseProgress {
                overall_percentage,
                completed_lessons,
                total_lessons,
                ..CourseProgress::default()
            },
            lessons: self.lessons.clone(),
            attempts: Some(attempts),
            module_assessments: HashMap::new(),
            final_assessment: None,
        }
    }
}

/// Starts the mock backend on an ephemeral port and returns its base URL.
pub async fn spawn_backend(state: SharedState) -> String {
    let app = Router::new()
        .route("/api/courses", get(get_courses))
        .route(
            "/api/progress",
            get(get_progress).post(post_progress).put(put_progress),
        )
        .route("/api/assessment-attempts", post(post_attempt))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock backend");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock backend died");
    });

    format!("http://{addr}")
}

/// Session config pointing at the mock, with a short debounce window.
pub fn test_config(base_url: &str) -> SessionConfig {
    SessionConfig {
        api_base_url: base_url.to_string(),
        debounce_millis: 100,
        optimistic_window_secs: 10,
        request_timeout_secs: 5,
    }
}

async fn get_courses(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let state = state.lock().expect("state lock");
    let requested = params.get("id").cloned().unwrap_or_default();
    match state.curriculum.as_ref().filter(|c| c.course_id == requested) {
        Some(curriculum) => {
            let mut payload = serde_json::to_value(curriculum).expect("serialize curriculum");
            if state.omit_course_id {
                if let Some(obj) = payload.as_object_mut() {
                    obj.remove("courseId");
                }
            }
            (StatusCode::OK, Json(json!({ "data": payload })))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("course not found: {requested}") })),
        ),
    }
}

async fn get_progress(State(state): State<SharedState>) -> Json<ProgressSnapshot> {
    let state = state.lock().expect("state lock");
    Json(state.snapshot())
}

async fn post_progress(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let Some(lesson_id) = params.get("lessonId") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "lessonId required" })),
        );
    };
    let mut state = state.lock().expect("state lock");
    let entry = state.lessons.entry(lesson_id.clone()).or_default();
    entry.completed = true;
    entry.completed_at = Some(Utc::now());
    (StatusCode::OK, Json(json!({ "completed": true })))
}

async fn put_progress(
    State(state): State<SharedState>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let Some(lesson_id) = params.get("lessonId") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "lessonId required" })),
        );
    };
    let position = body
        .get("lastWatchedPosition")
        .and_then(Value::as_u64)
        .and_then(|p| u32::try_from(p).ok())
        .unwrap_or(0);

    let mut state = state.lock().expect("state lock");
    state.position_puts.push((lesson_id.clone(), position));
    let entry = state.lessons.entry(lesson_id.clone()).or_default();
    entry.last_watched_position = position;
    (StatusCode::OK, Json(json!({ "lastWatchedPosition": position })))
}

async fn post_attempt(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().expect("state lock");

    if body.get("submit").and_then(Value::as_bool) == Some(true) {
        // Finalize form.
        let id = body.get("id").and_then(Value::as_str).unwrap_or_default();
        let Some(attempt) = state.attempts.iter_mut().find(|a| a.id == id) else {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("attempt not found: {id}") })),
            );
        };
        attempt.status = AttemptStatus::Completed;
        attempt.score = body.get("score").and_then(Value::as_f64);
        attempt.percentage = body.get("percentage").and_then(Value::as_f64);
        attempt.passed = body.get("passed").and_then(Value::as_bool);
        attempt.time_spent = body.get("timeSpent").and_then(Value::as_i64);
        attempt.completed_at = Some(Utc::now());
        if let Some(answers) = body.get("answers") {
            attempt.answers =
                serde_json::from_value(answers.clone()).unwrap_or_default();
        }
        let response = serde_json::to_value(&*attempt).expect("serialize attempt");
        return (StatusCode::OK, Json(response));
    }

    // Create form; an existing in-progress attempt is resumed instead.
    let assessment_id = body
        .get("assessmentId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let user_id = body
        .get("userId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if let Some(existing) = state
        .attempts
        .iter()
        .find(|a| a.assessment_id == assessment_id && a.status == AttemptStatus::InProgress)
    {
        let response = serde_json::to_value(existing).expect("serialize attempt");
        return (StatusCode::OK, Json(response));
    }

    state.next_attempt += 1;
    let attempt_number = u32::try_from(
        state
            .attempts
            .iter()
            .filter(|a| a.assessment_id == assessment_id)
            .count(),
    )
    .unwrap_or(0)
        + 1;
    let attempt = AssessmentAttempt {
        id: format!("attempt-{}", state.next_attempt),
        user_id,
        assessment_id,
        attempt_number,
        status: AttemptStatus::InProgress,
        answers: HashMap::new(),
        score: None,
        percentage: None,
        passed: None,
        started_at: Utc::now(),
        completed_at: None,
        time_spent: None,
    };
    state.attempts.push(attempt.clone());
    let response = serde_json::to_value(&attempt).expect("serialize attempt");
    (StatusCode::CREATED, Json(response))
}

// ============================================================================
// Fixture course
// ============================================================================

/// Two modules, three lessons, a lesson quiz with two questions.
pub fn sample_course() -> Curriculum {
    Curriculum {
        course_id: "course-1".to_string(),
        course_title: "Intro to Testing".to_string(),
        modules: vec![
            Module {
                id: "mod-1".to_string(),
                title: "Basics".to_string(),
                lessons: vec![
                    video_lesson("lesson-1", "Welcome", 300),
                    Lesson {
                        id: "lesson-2".to_string(),
                        title: "Reading".to_string(),
                        content_type: ContentType::Article,
                        video_url: None,
                        video_duration: None,
                        article_body: Some("<p>Read me</p>".to_string()),
                        free_preview: false,
                        quiz: Some(lesson_quiz()),
                    },
                ],
                assessment: None,
            },
            Module {
                id: "mod-2".to_string(),
                title: "Advanced".to_string(),
                lessons: vec![video_lesson("lesson-3", "Deep dive", 900)],
                assessment: None,
            },
        ],
        final_assessment: None,
    }
}

fn video_lesson(id: &str, title: &str, duration: u32) -> Lesson {
    Lesson {
        id: id.to_string(),
        title: title.to_string(),
        content_type: ContentType::Video,
        video_url: Some(format!("https://cdn.example.edu/{id}.mp4")),
        video_duration: Some(duration),
        article_body: None,
        free_preview: false,
        quiz: None,
    }
}

fn lesson_quiz() -> Assessment {
    Assessment {
        id: "quiz-1".to_string(),
        title: "Checkpoint".to_string(),
        level: AssessmentLevel::LessonQuiz,
        questions: vec![
            Question {
                id: "q1".to_string(),
                text: "2 + 2 = ?".to_string(),
                question_type: QuestionType::MultipleChoice,
                options: vec!["3".to_string(), "4".to_string()],
                correct_answer: "4".to_string(),
                points: 1.0,
                negative_points: None,
                explanation: None,
                difficulty: None,
            },
            Question {
                id: "q2".to_string(),
                text: "The sky is blue.".to_string(),
                question_type: QuestionType::TrueFalse,
                options: Vec::new(),
                correct_answer: "true".to_string(),
                points: 1.0,
                negative_points: None,
                explanation: None,
                difficulty: None,
            },
        ],
        passing_score: 50.0,
        max_attempts: Some(2),
        time_limit: Some(5),
        required: true,
        show_correct_answers: true,
        allow_retake: true,
        randomize_questions: false,
    }
}
