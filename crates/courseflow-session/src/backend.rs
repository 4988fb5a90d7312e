//! The seam between the session engine and the REST backend.
//!
//! The backend is an opaque collaborator: the engine depends only on the
//! request/response shapes of its `/api/*` endpoints, expressed here as the
//! [`LearnBackend`] trait. The reqwest implementation lives in the client
//! crate; tests substitute in-memory fakes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attempt::{AssessmentAttempt, AttemptStatus};
use crate::curriculum::Curriculum;
use crate::progress::ProgressSnapshot;

/// Errors crossing the backend boundary.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The request never produced a response.
    #[error("network error: {message}")]
    Network {
        /// Description of the transport failure.
        message: String,
    },

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}: {message}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// Response body or reason text.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("malformed response: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },
}

impl BackendError {
    /// Creates a new `Network` error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a new `Status` error.
    #[must_use]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Body for `POST /api/assessment-attempts` creating an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAttemptRequest {
    /// The assessment being attempted.
    pub assessment_id: String,

    /// The attempting learner.
    pub user_id: String,

    /// The enrollment binding learner to course.
    pub enrollment_id: String,

    /// Always `IN_PROGRESS` on creation.
    pub status: AttemptStatus,

    /// Attempt start time.
    pub started_at: DateTime<Utc>,
}

/// Body for `POST /api/assessment-attempts` finalizing an attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    /// Discriminates the finalize form from the create form.
    pub submit: bool,

    /// The attempt being finalized.
    pub id: String,

    /// The answers as submitted.
    pub answers: HashMap<String, String>,

    /// Client-computed raw score.
    pub score: f64,

    /// Client-computed rounded percentage.
    pub percentage: f64,

    /// Client-computed pass flag.
    pub passed: bool,

    /// Always `COMPLETED` on finalize.
    pub status: AttemptStatus,

    /// Submission time.
    pub completed_at: DateTime<Utc>,

    /// Seconds between start and submission.
    pub time_spent: i64,
}

/// The backend operations the session engine depends on.
///
/// One method per endpoint contract; implementations decide transport,
/// auth, and retries (the engine itself never retries).
#[allow(async_fn_in_trait)]
pub trait LearnBackend {
    /// `GET /api/courses?id={course_id}&curriculum=true`
    async fn fetch_curriculum(&self, course_id: &str) -> Result<Curriculum, BackendError>;

    /// `GET /api/progress?userId={user_id}&courseId={course_id}`
    async fn fetch_progress(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<ProgressSnapshot, BackendError>;

    /// `POST /api/progress?userId={user_id}&lessonId={lesson_id}&complete=true`
    async fn mark_lesson_complete(
        &self,
        user_id: &str,
        lesson_id: &str,
    ) -> Result<(), BackendError>;

    /// `PUT /api/progress?userId={user_id}&lessonId={lesson_id}`
    async fn put_watch_position(
        &self,
        user_id: &str,
        lesson_id: &str,
        position: u32,
    ) -> Result<(), BackendError>;

    /// `POST /api/assessment-attempts` (create form)
    async fn start_attempt(
        &self,
        request: &StartAttemptRequest,
    ) -> Result<AssessmentAttempt, BackendError>;

    /// `POST /api/assessment-attempts` (finalize form)
    async fn submit_attempt(
        &self,
        request: &SubmitAttemptRequest,
    ) -> Result<AssessmentAttempt, BackendError>;
}
