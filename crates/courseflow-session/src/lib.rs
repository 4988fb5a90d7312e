//! Courseflow Session Engine
//!
//! Headless learner-session state machine: curriculum, progress tracking
//! with optimistic completion, assessment attempts with client-side
//! scoring, debounced watch-position reporting, and lesson navigation.

pub mod attempt;
pub mod backend;
pub mod config;
pub mod curriculum;
pub mod debounce;
pub mod error;
pub mod navigation;
pub mod player;
pub mod progress;
pub mod scoring;
pub mod session;

pub use attempt::{
    retake_allowed, AssessmentAttempt, AttemptController, AttemptOrigin, AttemptPhase,
    AttemptStatus, ScoredSubmission,
};
pub use backend::{BackendError, LearnBackend, StartAttemptRequest, SubmitAttemptRequest};
pub use config::SessionConfig;
pub use curriculum::{
    Assessment, AssessmentLevel, ContentType, Curriculum, Lesson, Module, Question, QuestionType,
};
pub use debounce::PositionCoalescer;
pub use error::{Result, SessionError};
pub use navigation::Navigator;
pub use player::{PlayerAction, PlayerEvent, PlayerView};
pub use progress::{
    AssessmentStatusSummary, CompletionState, CourseProgress, LessonProgress, ProgressSnapshot,
    ProgressTracker,
};
pub use scoring::{score_assessment, score_question, ScoreSummary};
pub use session::{LearningSession, LoadTicket};
