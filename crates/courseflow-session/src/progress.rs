//! Learner progress: per-lesson completion/watch state and course
//! aggregates.
//!
//! The tracker holds the latest authoritative snapshot from the backend plus
//! a local overlay of optimistic lesson completions. An optimistic entry is
//! applied immediately so the UI never waits on the round trip; it is
//! confirmed by the next authoritative re-fetch, or reverted once it has
//! gone unconfirmed for longer than the configured window.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::attempt::{AssessmentAttempt, AttemptStatus};

// ============================================================================
// Snapshot types (wire shapes)
// ============================================================================

/// Per (user, lesson) completion and watch state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonProgress {
    /// Whether the lesson has been completed.
    #[serde(default)]
    pub completed: bool,

    /// When it was completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Last watched playback position, in seconds.
    #[serde(default)]
    pub last_watched_position: u32,

    /// Total seconds of playback watched.
    #[serde(default)]
    pub watch_duration: u32,

    /// Percent of the video watched.
    #[serde(default)]
    pub percentage_watched: f64,
}

/// Aggregate module/final assessment status, used when the backend has no
/// dedicated attempts map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentStatusSummary {
    /// The assessment this summarizes.
    pub assessment_id: String,

    /// Whether the learner has attempted it at all.
    #[serde(default)]
    pub attempted: bool,

    /// Best/latest score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Best/latest percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,

    /// Whether the learner has passed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,

    /// When the latest attempt completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Aggregate progress over a user+course enrollment.
///
/// Derived server-side from lesson progress and attempt records; the client
/// keeps an optimistic copy and reconciles on the next full fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    /// Overall completion percentage.
    #[serde(default)]
    pub overall_percentage: f64,

    /// Completed lessons.
    #[serde(default)]
    pub completed_lessons: u32,

    /// Total lessons.
    #[serde(default)]
    pub total_lessons: u32,

    /// Completed assessments.
    #[serde(default)]
    pub completed_assessments: u32,

    /// Total assessments.
    #[serde(default)]
    pub total_assessments: u32,

    /// Whether the learner qualifies for a certificate.
    #[serde(default)]
    pub certificate_eligible: bool,
}

/// The learner's full progress for one course, as fetched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    /// The enrollment binding learner to course; required to start attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_id: Option<String>,

    /// Course-level aggregate.
    #[serde(default)]
    pub overall: CourseProgress,

    /// Per-lesson progress keyed by lesson id.
    #[serde(default)]
    pub lessons: HashMap<String, LessonProgress>,

    /// Attempt history keyed by assessment id. Absent on backends that only
    /// report aggregate status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<HashMap<String, Vec<AssessmentAttempt>>>,

    /// Aggregate module assessment status keyed by assessment id.
    #[serde(default)]
    pub module_assessments: HashMap<String, AssessmentStatusSummary>,

    /// Aggregate final assessment status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_assessment: Option<AssessmentStatusSummary>,
}

// ============================================================================
// Optimistic overlay
// ============================================================================

/// Lifecycle of one optimistic lesson completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    /// Applied locally, awaiting authoritative confirmation.
    Optimistic {
        /// When the local patch was applied.
        applied_at: DateTime<Utc>,
    },
    /// Confirmed by an authoritative re-fetch.
    Confirmed,
    /// Unconfirmed past the window; the snapshot value is authoritative
    /// again.
    Reverted,
}

// ============================================================================
// ProgressTracker
// ============================================================================

/// Holds the authoritative snapshot plus the optimistic overlay and answers
/// all progress lookups for the session.
#[derive(Debug)]
pub struct ProgressTracker {
    snapshot: Option<ProgressSnapshot>,
    overlay: HashMap<String, CompletionState>,
    window: Duration,
}

impl ProgressTracker {
    /// Creates a tracker whose optimistic entries revert after `window`.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            snapshot: None,
            overlay: HashMap::new(),
            window,
        }
    }

    /// Whether a snapshot has been applied yet.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }

    /// The enrollment id, when the backend reported one.
    #[must_use]
    pub fn enrollment_id(&self) -> Option<&str> {
        self.snapshot
            .as_ref()
            .and_then(|s| s.enrollment_id.as_deref())
    }

    /// The course-level aggregate from the latest snapshot.
    #[must_use]
    pub fn course_progress(&self) -> Option<&CourseProgress> {
        self.snapshot.as_ref().map(|s| &s.overall)
    }

    /// Replaces the snapshot wholesale with a fresh authoritative fetch.
    ///
    /// Optimistic overlay entries the snapshot now agrees with become
    /// `Confirmed`; entries the snapshot still disagrees with stay
    /// optimistic until the window expires.
    pub fn apply_snapshot(&mut self, snapshot: ProgressSnapshot) {
        for (lesson_id, state) in &mut self.overlay {
            if matches!(state, CompletionState::Optimistic { .. })
                && snapshot
                    .lessons
                    .get(lesson_id)
                    .is_some_and(|p| p.completed)
            {
                *state = CompletionState::Confirmed;
            }
        }
        self.snapshot = Some(snapshot);
    }

    /// The merged per-lesson view used for checkmarks and resume: snapshot
    /// state with the optimistic overlay applied on top.
    #[must_use]
    pub fn progress_for(&self, lesson_id: &str) -> Option<LessonProgress> {
        let base = self
            .snapshot
            .as_ref()
            .and_then(|s| s.lessons.get(lesson_id))
            .cloned();

        match self.overlay.get(lesson_id) {
            Some(CompletionState::Optimistic { applied_at }) => {
                let mut progress = base.unwrap_or_default();
                progress.completed = true;
                progress.completed_at.get_or_insert(*applied_at);
                Some(progress)
            }
            _ => base,
        }
    }

    /// Whether the lesson counts as completed in the merged view.
    #[must_use]
    pub fn is_completed(&self, lesson_id: &str) -> bool {
        self.progress_for(lesson_id).is_some_and(|p| p.completed)
    }

    /// The overlay state for a lesson, when one exists.
    #[must_use]
    pub fn completion_state(&self, lesson_id: &str) -> Option<CompletionState> {
        self.overlay.get(lesson_id).copied()
    }

    /// The playback position to resume a lesson's video from.
    #[must_use]
    pub fn resume_position(&self, lesson_id: &str) -> u32 {
        self.snapshot
            .as_ref()
            .and_then(|s| s.lessons.get(lesson_id))
            .map_or(0, |p| p.last_watched_position)
    }

    /// Applies an optimistic completion patch for a lesson.
    ///
    /// Idempotent: re-marking an already-completed or already-optimistic
    /// lesson changes nothing.
    pub fn mark_optimistic(&mut self, lesson_id: &str, now: DateTime<Utc>) {
        if self.is_completed(lesson_id) {
            return;
        }
        self.overlay
            .insert(lesson_id.to_string(), CompletionState::Optimistic { applied_at: now });
    }

    /// Reverts optimistic entries older than the window, returning the
    /// affected lesson ids.
    ///
    /// A reverted entry stops overriding the snapshot, so the lesson shows
    /// uncompleted again unless the backend eventually says otherwise.
    pub fn revert_stale(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let window = self.window;
        let mut reverted = Vec::new();
        for (lesson_id, state) in &mut self.overlay {
            if let CompletionState::Optimistic { applied_at } = state {
                if now - *applied_at > window {
                    *state = CompletionState::Reverted;
                    reverted.push(lesson_id.clone());
                }
            }
        }
        reverted
    }

    /// Previous attempts for an assessment.
    ///
    /// Prefers the backend's dedicated attempts map. When the backend has
    /// not provided one, falls back to synthesizing a single pseudo-attempt
    /// from the aggregate module/final status fields — a legacy view behind
    /// the same interface, selected by capability detection.
    #[must_use]
    pub fn previous_attempts_for(&self, assessment_id: &str) -> Vec<AssessmentAttempt> {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return Vec::new();
        };

        if let Some(attempts) = snapshot.attempts.as_ref() {
            return attempts.get(assessment_id).cloned().unwrap_or_default();
        }

        // Legacy fallback: reconstruct from aggregate status.
        snapshot
            .module_assessments
            .get(assessment_id)
            .or_else(|| {
                snapshot
                    .final_assessment
                    .as_ref()
                    .filter(|s| s.assessment_id == assessment_id)
            })
            .filter(|status| status.attempted)
            .map(|status| vec![synthesize_attempt(status)])
            .unwrap_or_default()
    }
}

/// Builds the single pseudo-attempt the legacy fallback reports.
fn synthesize_attempt(status: &AssessmentStatusSummary) -> AssessmentAttempt {
    let completed_at = status.completed_at.unwrap_or_else(Utc::now);
    AssessmentAttempt {
        id: format!("status-{}", status.assessment_id),
        user_id: String::new(),
        assessment_id: status.assessment_id.clone(),
        attempt_number: 1,
        status: AttemptStatus::Completed,
        answers: HashMap::new(),
        score: status.score,
        percentage: status.percentage,
        passed: status.passed,
        started_at: completed_at,
        completed_at: Some(completed_at),
        time_spent: None,
    }
}
