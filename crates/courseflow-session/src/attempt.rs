//! Assessment attempt lifecycle.
//!
//! The attempt controller is a four-phase state machine:
//!
//! - `Idle` — no assessment selected.
//! - `Confirming` — start dialog shown; prior attempts and the attempt-limit
//!   policy are displayed. No server-side attempt exists yet.
//! - `InProgress` — attempt created server-side, answers being collected,
//!   optional countdown running.
//! - `Reviewing` — attempt scored and submitted; may re-enter `Confirming`
//!   via retake when eligible, or fall back to `Idle`.
//!
//! Manual submission and the countdown's time-up both funnel through
//! [`AttemptController::take_submission`]; only the first caller wins the
//! `InProgress` → `Reviewing` transition, the second gets `None`. That single
//! guarded transition is what makes submission idempotent.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::curriculum::{Assessment, AssessmentLevel};
use crate::error::{Result, SessionError};
use crate::scoring::{score_assessment, ScoreSummary};

// ============================================================================
// Attempt records
// ============================================================================

/// Server-side status of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    /// Created but not yet submitted.
    InProgress,
    /// Finalized by submission; never mutated again.
    Completed,
}

/// One learner's pass through an assessment, as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentAttempt {
    /// Unique attempt id.
    pub id: String,

    /// The owning learner.
    pub user_id: String,

    /// The owning assessment.
    pub assessment_id: String,

    /// 1-based, monotonic per user+assessment.
    #[serde(default)]
    pub attempt_number: u32,

    /// Current status.
    pub status: AttemptStatus,

    /// Submitted answers keyed by question id. Pre-filled when the backend
    /// returns a resumable in-progress attempt.
    #[serde(default)]
    pub answers: HashMap<String, String>,

    /// Raw score, present once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Rounded percentage, present once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,

    /// Pass flag, present once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed: Option<bool>,

    /// When the attempt was started.
    pub started_at: DateTime<Utc>,

    /// When the attempt was submitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Seconds between start and submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<i64>,
}

/// Where an attempt was launched from.
///
/// A passed lesson quiz marks its originating lesson complete, so the origin
/// travels with the attempt through to submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptOrigin {
    /// Quiz attached to a lesson.
    Lesson {
        /// The originating lesson.
        lesson_id: String,
    },
    /// Module-closing assessment.
    Module {
        /// The owning module.
        module_id: String,
    },
    /// The course final.
    Final,
}

/// Everything the session needs to finalize an attempt after the guarded
/// submission transition: the scored answers plus bookkeeping.
#[derive(Debug, Clone)]
pub struct ScoredSubmission {
    /// The server-side attempt id.
    pub attempt_id: String,

    /// The owning assessment.
    pub assessment_id: String,

    /// Level of the assessment.
    pub level: AssessmentLevel,

    /// Where the attempt was launched from.
    pub origin: AttemptOrigin,

    /// The answers as submitted.
    pub answers: HashMap<String, String>,

    /// The computed score.
    pub summary: ScoreSummary,

    /// When the attempt started.
    pub started_at: DateTime<Utc>,

    /// When the submission was taken.
    pub completed_at: DateTime<Utc>,

    /// Seconds between start and submission.
    pub time_spent: i64,
}

// ============================================================================
// Retake gating
// ============================================================================

/// Whether another attempt may be started.
///
/// Retakes require `allow_retake` and, when `max_attempts` is set, fewer
/// completed attempts than the limit.
#[must_use]
pub const fn retake_allowed(assessment: &Assessment, completed_attempts: u32) -> bool {
    if !assessment.allow_retake {
        return false;
    }
    match assessment.max_attempts {
        Some(max) => completed_attempts < max,
        None => true,
    }
}

// ============================================================================
// AttemptController
// ============================================================================

/// Current phase of the attempt state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptPhase {
    /// No assessment selected.
    #[default]
    Idle,
    /// Start dialog shown; no server-side attempt yet.
    Confirming,
    /// Server-side attempt exists; answers being collected.
    InProgress,
    /// Submitted; results on display.
    Reviewing,
}

impl std::fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Confirming => write!(f, "confirming"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Reviewing => write!(f, "reviewing"),
        }
    }
}

/// Owns the lifecycle of a single assessment attempt.
#[derive(Debug, Default)]
pub struct AttemptController {
    phase: AttemptPhase,
    assessment: Option<Assessment>,
    origin: Option<AttemptOrigin>,
    prior_attempts: u32,
    attempt: Option<AssessmentAttempt>,
    answers: HashMap<String, String>,
    last_result: Option<ScoreSummary>,
}

impl AttemptController {
    /// Creates a controller in `Idle`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current phase.
    #[must_use]
    pub const fn phase(&self) -> AttemptPhase {
        self.phase
    }

    /// The selected assessment, when not `Idle`.
    #[must_use]
    pub const fn assessment(&self) -> Option<&Assessment> {
        self.assessment.as_ref()
    }

    /// Attempts completed before this one was selected.
    #[must_use]
    pub const fn prior_attempts(&self) -> u32 {
        self.prior_attempts
    }

    /// The answers collected so far.
    #[must_use]
    pub const fn answers(&self) -> &HashMap<String, String> {
        &self.answers
    }

    /// The score of the last submission, while `Reviewing`.
    #[must_use]
    pub const fn last_result(&self) -> Option<&ScoreSummary> {
        self.last_result.as_ref()
    }

    /// Selects an assessment: `Idle` → `Confirming`.
    ///
    /// No server-side attempt is created yet; `prior_attempts` is what the
    /// start dialog displays alongside the attempt-limit policy.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPhaseTransition` unless the controller is `Idle`.
    pub fn start(
        &mut self,
        assessment: Assessment,
        origin: AttemptOrigin,
        prior_attempts: u32,
    ) -> Result<()> {
        if self.phase != AttemptPhase::Idle {
            return Err(SessionError::invalid_transition(
                self.phase,
                AttemptPhase::Confirming,
            ));
        }
        self.assessment = Some(assessment);
        self.origin = Some(origin);
        self.prior_attempts = prior_attempts;
        self.phase = AttemptPhase::Confirming;
        Ok(())
    }

    /// Enters `InProgress` with the server-created attempt.
    ///
    /// Answers are pre-populated from the attempt when the backend returned
    /// a resumable in-progress record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPhaseTransition` unless the controller is
    /// `Confirming`.
    pub fn begin(&mut self, attempt: AssessmentAttempt) -> Result<()> {
        if self.phase != AttemptPhase::Confirming {
            return Err(SessionError::invalid_transition(
                self.phase,
                AttemptPhase::InProgress,
            ));
        }
        self.answers = attempt.answers.clone();
        self.attempt = Some(attempt);
        self.phase = AttemptPhase::InProgress;
        Ok(())
    }

    /// Returns to `Idle` after a failed or abandoned start.
    pub fn abandon(&mut self) {
        self.reset();
    }

    /// Resets the controller to `Idle`, clearing all attempt state.
    ///
    /// Selecting a different lesson resets any in-flight assessment view
    /// through this.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Records an answer: pure local state, `InProgress` only.
    ///
    /// Choice questions store the selected option string; short-answer and
    /// essay store free text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPhaseTransition` outside `InProgress`.
    pub fn set_answer(&mut self, question_id: impl Into<String>, value: impl Into<String>) -> Result<()> {
        if self.phase != AttemptPhase::InProgress {
            return Err(SessionError::invalid_transition(
                self.phase,
                AttemptPhase::InProgress,
            ));
        }
        self.answers.insert(question_id.into(), value.into());
        Ok(())
    }

    /// Number of questions without a stored answer.
    #[must_use]
    pub fn unanswered(&self) -> usize {
        self.assessment.as_ref().map_or(0, |a| {
            a.questions
                .iter()
                .filter(|q| !self.answers.contains_key(&q.id))
                .count()
        })
    }

    /// Validation gate for manual submission: every question answered.
    ///
    /// The countdown's time-up path skips this and submits whatever is
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unanswered` when questions remain.
    pub fn ensure_all_answered(&self) -> Result<()> {
        let remaining = self.unanswered();
        if remaining > 0 {
            return Err(SessionError::Unanswered { remaining });
        }
        Ok(())
    }

    /// The countdown deadline, for timed assessments in `InProgress`.
    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        if self.phase != AttemptPhase::InProgress {
            return None;
        }
        let attempt = self.attempt.as_ref()?;
        let minutes = self.assessment.as_ref()?.time_limit?;
        Some(attempt.started_at + Duration::minutes(i64::from(minutes)))
    }

    /// Seconds until the deadline, clamped at 0. `None` when untimed or not
    /// `InProgress`.
    #[must_use]
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        self.deadline().map(|d| (d - now).num_seconds().max(0))
    }

    /// The single guarded submission transition: `InProgress` → `Reviewing`.
    ///
    /// Scores the stored answers and returns the submission the first time
    /// it is called; any later call (a timer firing after a manual submit,
    /// or vice versa) gets `None` and changes nothing.
    pub fn take_submission(&mut self, now: DateTime<Utc>) -> Option<ScoredSubmission> {
        if self.phase != AttemptPhase::InProgress {
            return None;
        }
        let assessment = self.assessment.as_ref()?;
        let attempt = self.attempt.as_ref()?;
        let origin = self.origin.clone()?;

        let summary = score_assessment(assessment, &self.answers);
        let time_spent = (now - attempt.started_at).num_seconds().max(0);

        self.phase = AttemptPhase::Reviewing;
        self.last_result = Some(summary);

        Some(ScoredSubmission {
            attempt_id: attempt.id.clone(),
            assessment_id: assessment.id.clone(),
            level: assessment.level,
            origin,
            answers: self.answers.clone(),
            summary,
            started_at: attempt.started_at,
            completed_at: now,
            time_spent,
        })
    }

    /// Whether `Reviewing` should offer a retake.
    ///
    /// Counts the attempt just completed on top of the prior ones.
    #[must_use]
    pub fn can_retake(&self) -> bool {
        if self.phase != AttemptPhase::Reviewing {
            return false;
        }
        self.assessment
            .as_ref()
            .is_some_and(|a| retake_allowed(a, self.prior_attempts + 1))
    }

    /// Re-enters `Confirming` for the same assessment: `Reviewing` →
    /// `Confirming`.
    ///
    /// # Errors
    ///
    /// Returns `RetakeDisabled` or `AttemptLimitReached` when ineligible,
    /// `InvalidPhaseTransition` outside `Reviewing`.
    pub fn retake(&mut self) -> Result<()> {
        if self.phase != AttemptPhase::Reviewing {
            return Err(SessionError::invalid_transition(
                self.phase,
                AttemptPhase::Confirming,
            ));
        }
        let assessment = self.assessment.as_ref().ok_or(SessionError::NotLoaded)?;
        let completed = self.prior_attempts + 1;
        if !assessment.allow_retake {
            return Err(SessionError::RetakeDisabled {
                assessment_id: assessment.id.clone(),
            });
        }
        if let Some(max) = assessment.max_attempts {
            if completed >= max {
                return Err(SessionError::AttemptLimitReached {
                    assessment_id: assessment.id.clone(),
                    attempts: completed,
                    max_attempts: max,
                });
            }
        }

        self.prior_attempts = completed;
        self.attempt = None;
        self.answers.clear();
        self.last_result = None;
        self.phase = AttemptPhase::Confirming;
        Ok(())
    }
}
