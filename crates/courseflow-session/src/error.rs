//! Error types for the learner session engine.
//!
//! This module defines the error hierarchy for all session operations,
//! split along the taxonomy the engine exposes to callers: load failures
//! (blocking, nothing applied), mutation failures (inline, prior state
//! preserved), and validation failures (rejected before any network call).

/// A specialized `Result` type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while driving a learning session.
///
/// Variants carry actionable suggestion text where a user can reasonably
/// recover on their own.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    // ========================================================================
    // Load failures (blocking; no partial state is applied)
    // ========================================================================
    /// The curriculum fetch failed or returned a malformed body.
    #[error("Failed to load curriculum for course '{course_id}': {message}\n\nSuggestion: Check the API URL and that the course exists, then retry")]
    CurriculumLoad {
        /// The course being loaded.
        course_id: String,
        /// Description of the failure.
        message: String,
    },

    /// The curriculum loaded but contains no modules.
    #[error("Course '{course_id}' has an empty curriculum (zero modules)\n\nSuggestion: The course has no published content yet; pick another course")]
    EmptyCurriculum {
        /// The course with no modules.
        course_id: String,
    },

    /// The progress fetch failed or returned a malformed body.
    #[error("Failed to load progress for user '{user_id}': {message}\n\nSuggestion: Retry; if the error persists check the enrollment")]
    ProgressLoad {
        /// The learner whose progress was requested.
        user_id: String,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Mutation failures (inline; prior state preserved)
    // ========================================================================
    /// Creating a server-side attempt failed.
    #[error("Failed to start attempt for assessment '{assessment_id}': {message}\n\nSuggestion: Retry from the start dialog")]
    AttemptStart {
        /// The assessment whose attempt could not be created.
        assessment_id: String,
        /// Description of the failure.
        message: String,
    },

    /// Finalizing an attempt failed after scoring.
    #[error("Failed to submit attempt '{attempt_id}': {message}\n\nSuggestion: Retry the submission; your answers are still held locally")]
    AttemptSubmit {
        /// The attempt that could not be finalized.
        attempt_id: String,
        /// Description of the failure.
        message: String,
    },

    /// A progress mutation (mark-complete or position update) failed.
    #[error("Failed to update progress for lesson '{lesson_id}': {message}\n\nSuggestion: Retry; the local view will reconcile on the next refresh")]
    ProgressUpdate {
        /// The lesson whose progress could not be written.
        lesson_id: String,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Validation failures (rejected before any network call)
    // ========================================================================
    /// An attempt was confirmed without a known enrollment.
    #[error("No enrollment found for this course\n\nSuggestion: Enroll in the course before starting an assessment")]
    MissingEnrollment,

    /// A manual submission was requested with unanswered questions.
    #[error("{remaining} question(s) are still unanswered\n\nSuggestion: Answer every question before submitting")]
    Unanswered {
        /// Number of questions without an answer.
        remaining: usize,
    },

    /// A retake was requested but the assessment does not allow retakes.
    #[error("Retakes are not allowed for assessment '{assessment_id}'")]
    RetakeDisabled {
        /// The assessment that forbids retakes.
        assessment_id: String,
    },

    /// A retake was requested past the attempt limit.
    #[error("Attempt limit reached for assessment '{assessment_id}' ({attempts} of {max_attempts})")]
    AttemptLimitReached {
        /// The assessment at its limit.
        assessment_id: String,
        /// Attempts already made.
        attempts: u32,
        /// The configured maximum.
        max_attempts: u32,
    },

    /// An operation was invoked in the wrong attempt phase.
    #[error("Invalid attempt transition: cannot go from {from} to {to}")]
    InvalidPhaseTransition {
        /// The current phase.
        from: String,
        /// The attempted target phase.
        to: String,
    },

    /// A lesson id was not found in the loaded curriculum.
    #[error("Unknown lesson '{lesson_id}' in the current curriculum")]
    UnknownLesson {
        /// The missing lesson id.
        lesson_id: String,
    },

    /// An assessment id was not found in the loaded curriculum.
    #[error("Unknown assessment '{assessment_id}' in the current curriculum")]
    UnknownAssessment {
        /// The missing assessment id.
        assessment_id: String,
    },

    /// No curriculum has been loaded yet.
    #[error("No curriculum loaded\n\nSuggestion: Call load() before navigating or starting assessments")]
    NotLoaded,

    // ========================================================================
    // Configuration errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your courseflow.json with a JSON linter")]
    ConfigParse {
        /// Path to the configuration file.
        path: std::path::PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // General errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    /// Creates a new `CurriculumLoad` error.
    #[must_use]
    pub fn curriculum_load(course_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CurriculumLoad {
            course_id: course_id.into(),
            message: message.into(),
        }
    }

    /// Creates a new `EmptyCurriculum` error.
    #[must_use]
    pub fn empty_curriculum(course_id: impl Into<String>) -> Self {
        Self::EmptyCurriculum {
            course_id: course_id.into(),
        }
    }

    /// Creates a new `ProgressLoad` error.
    #[must_use]
    pub fn progress_load(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProgressLoad {
            user_id: user_id.into(),
            message: message.into(),
        }
    }

    /// Creates a new `AttemptStart` error.
    #[must_use]
    pub fn attempt_start(assessment_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AttemptStart {
            assessment_id: assessment_id.into(),
            message: message.into(),
        }
    }

    /// Creates a new `AttemptSubmit` error.
    #[must_use]
    pub fn attempt_submit(attempt_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AttemptSubmit {
            attempt_id: attempt_id.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ProgressUpdate` error.
    #[must_use]
    pub fn progress_update(lesson_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProgressUpdate {
            lesson_id: lesson_id.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidPhaseTransition` error.
    #[must_use]
    pub fn invalid_transition(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Self::InvalidPhaseTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Creates a new `UnknownLesson` error.
    #[must_use]
    pub fn unknown_lesson(lesson_id: impl Into<String>) -> Self {
        Self::UnknownLesson {
            lesson_id: lesson_id.into(),
        }
    }

    /// Creates a new `UnknownAssessment` error.
    #[must_use]
    pub fn unknown_assessment(assessment_id: impl Into<String>) -> Self {
        Self::UnknownAssessment {
            assessment_id: assessment_id.into(),
        }
    }

    /// Creates a new `ConfigParse` error.
    #[must_use]
    pub fn config_parse(path: impl Into<std::path::PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidation` error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Returns `true` if this error is a blocking load failure.
    ///
    /// Load failures abort the whole page interaction; nothing partial is
    /// rendered and the caller should offer a retry/back action.
    #[must_use]
    pub const fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::CurriculumLoad { .. } | Self::EmptyCurriculum { .. } | Self::ProgressLoad { .. }
        )
    }

    /// Returns `true` if this error is an inline mutation failure.
    ///
    /// Mutation failures leave the prior state intact; the user re-triggers
    /// the action manually.
    #[must_use]
    pub const fn is_mutation_failure(&self) -> bool {
        matches!(
            self,
            Self::AttemptStart { .. } | Self::AttemptSubmit { .. } | Self::ProgressUpdate { .. }
        )
    }

    /// Returns `true` if this error is a validation failure caught before
    /// any network call.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingEnrollment
                | Self::Unanswered { .. }
                | Self::RetakeDisabled { .. }
                | Self::AttemptLimitReached { .. }
                | Self::InvalidPhaseTransition { .. }
                | Self::UnknownLesson { .. }
                | Self::UnknownAssessment { .. }
                | Self::NotLoaded
        )
    }
}
