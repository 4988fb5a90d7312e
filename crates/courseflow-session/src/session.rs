//! The learning session driver.
//!
//! `LearningSession` wires the curriculum, progress tracker, navigator,
//! player shell, and attempt controller to a [`LearnBackend`]
//! implementation. It owns the ordering rules the UI relies on:
//!
//! - curriculum and progress are fetched concurrently on load and each
//!   applied when they arrive (their state is disjoint);
//! - an attempt must be confirmed (server id obtained) before answers or
//!   submission mean anything — the controller's phases enforce that;
//! - selecting a lesson resets the attempt view and flushes any pending
//!   watch-position update before the selection changes.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::attempt::{
    AttemptController, AttemptOrigin, AttemptPhase, AttemptStatus, ScoredSubmission,
};
use crate::backend::{LearnBackend, StartAttemptRequest, SubmitAttemptRequest};
use crate::config::SessionConfig;
use crate::curriculum::{AssessmentLevel, Curriculum, Lesson};
use crate::debounce::PositionCoalescer;
use crate::error::{Result, SessionError};
use crate::navigation::Navigator;
use crate::player::{self, PlayerAction, PlayerEvent, PlayerView};
use crate::progress::{CourseProgress, ProgressSnapshot, ProgressTracker};
use crate::scoring::ScoreSummary;

/// Converts a non-negative `u64` config value to a `chrono` duration unit.
fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Tags one load so results of a superseded load are discarded instead of
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// A learner's session over one course.
#[derive(Debug)]
pub struct LearningSession<B> {
    backend: B,
    config: SessionConfig,
    user_id: String,
    course_id: String,
    curriculum: Option<Curriculum>,
    tracker: ProgressTracker,
    navigator: Navigator,
    controller: AttemptController,
    coalescer: PositionCoalescer,
    pending_submission: Option<ScoredSubmission>,
    load_epoch: u64,
}

impl<B: LearnBackend> LearningSession<B> {
    /// Creates a session for one user and course. Nothing is fetched until
    /// [`LearningSession::load`].
    #[must_use]
    pub fn new(
        backend: B,
        config: SessionConfig,
        user_id: impl Into<String>,
        course_id: impl Into<String>,
    ) -> Self {
        let window = Duration::seconds(to_i64(config.optimistic_window_secs));
        let debounce = Duration::milliseconds(to_i64(config.debounce_millis));
        Self {
            backend,
            config,
            user_id: user_id.into(),
            course_id: course_id.into(),
            curriculum: None,
            tracker: ProgressTracker::new(window),
            navigator: Navigator::default(),
            controller: AttemptController::new(),
            coalescer: PositionCoalescer::new(debounce),
            pending_submission: None,
            load_epoch: 0,
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Fetches curriculum and progress concurrently and applies both,
    /// replacing any prior state wholesale.
    ///
    /// # Errors
    ///
    /// `CurriculumLoad`/`ProgressLoad` on fetch failure, `EmptyCurriculum`
    /// when the course has zero modules. Nothing partial is applied on
    /// error.
    pub async fn load(&mut self) -> Result<()> {
        self.flush_position().await;

        let ticket = self.begin_load();
        debug!(course_id = %self.course_id, "loading curriculum and progress");

        let (curriculum, snapshot) = tokio::join!(
            self.backend.fetch_curriculum(&self.course_id),
            self.backend.fetch_progress(&self.user_id, &self.course_id),
        );

        let curriculum = curriculum
            .map_err(|e| SessionError::curriculum_load(&self.course_id, e.to_string()))?;
        let snapshot =
            snapshot.map_err(|e| SessionError::progress_load(&self.user_id, e.to_string()))?;

        self.apply_load(ticket, curriculum, snapshot)
    }

    /// Starts a new load epoch, invalidating results of earlier loads.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_epoch += 1;
        LoadTicket(self.load_epoch)
    }

    /// Applies a completed load, unless a newer load has started since the
    /// ticket was issued — superseded results are dropped, matching the
    /// unmount guard of the original page.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCurriculum` for a curriculum with zero modules.
    pub fn apply_load(
        &mut self,
        ticket: LoadTicket,
        curriculum: Curriculum,
        snapshot: ProgressSnapshot,
    ) -> Result<()> {
        if ticket.0 != self.load_epoch {
            debug!(
                ticket = ticket.0,
                epoch = self.load_epoch,
                "discarding superseded load result"
            );
            return Ok(());
        }

        if curriculum.modules.is_empty() {
            return Err(SessionError::empty_curriculum(&self.course_id));
        }

        self.navigator = Navigator::from_curriculum(&curriculum);
        self.tracker = ProgressTracker::new(Duration::seconds(to_i64(
            self.config.optimistic_window_secs,
        )));
        self.tracker.apply_snapshot(snapshot);
        self.controller.reset();
        self.pending_submission = None;

        info!(
            course_id = %curriculum.course_id,
            modules = curriculum.modules.len(),
            lessons = curriculum.total_lessons(),
            initial_lesson = ?self.navigator.current_lesson(),
            "session loaded"
        );
        self.curriculum = Some(curriculum);
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The loaded curriculum.
    #[must_use]
    pub const fn curriculum(&self) -> Option<&Curriculum> {
        self.curriculum.as_ref()
    }

    /// The progress tracker (merged authoritative + optimistic view).
    #[must_use]
    pub const fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// The navigator over the flattened lesson ordering.
    #[must_use]
    pub const fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// The attempt controller.
    #[must_use]
    pub const fn controller(&self) -> &AttemptController {
        &self.controller
    }

    /// The course-level aggregate, when progress has loaded.
    #[must_use]
    pub fn course_progress(&self) -> Option<&CourseProgress> {
        self.tracker.course_progress()
    }

    /// The active lesson.
    #[must_use]
    pub fn current_lesson(&self) -> Option<&Lesson> {
        let lesson_id = self.navigator.current_lesson()?;
        self.curriculum.as_ref()?.find_lesson(lesson_id)
    }

    /// What the player shell should render for the active lesson.
    #[must_use]
    pub fn player_view(&self) -> Option<PlayerView> {
        self.current_lesson()
            .map(|lesson| player::view_for(lesson, &self.tracker))
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Selects a lesson: flushes the pending watch position, resets any
    /// in-flight assessment view to idle, then moves the selection.
    ///
    /// # Errors
    ///
    /// Returns `UnknownLesson` for an id outside the curriculum; the
    /// selection is unchanged in that case.
    pub async fn select_lesson(&mut self, lesson_id: &str) -> Result<()> {
        // Flush before moving so the pending position is attributed to the
        // lesson that produced it.
        self.flush_position().await;
        self.navigator.select(lesson_id)?;
        self.controller.reset();
        debug!(lesson_id, "lesson selected");
        Ok(())
    }

    /// Moves to the next lesson, if one exists.
    ///
    /// # Errors
    ///
    /// Propagates `select_lesson` errors.
    pub async fn advance(&mut self) -> Result<bool> {
        match self.navigator.next_lesson().map(str::to_string) {
            Some(next) => {
                self.select_lesson(&next).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ========================================================================
    // Player events and watch position
    // ========================================================================

    /// Feeds a raw player event through the shell and performs the
    /// resulting action.
    ///
    /// # Errors
    ///
    /// Propagates mutation errors from auto-completion.
    pub async fn handle_player_event(&mut self, event: PlayerEvent) -> Result<()> {
        let Some(lesson) = self.current_lesson() else {
            return Ok(());
        };
        let lesson_id = lesson.id.clone();
        match player::handle_event(lesson, event, &self.tracker) {
            PlayerAction::ReportPosition(position) => {
                self.record_position(position);
                Ok(())
            }
            PlayerAction::MarkComplete => self.mark_lesson_complete(&lesson_id).await,
            PlayerAction::None => Ok(()),
        }
    }

    /// Records a playback position tick for the active lesson; the PUT is
    /// coalesced behind the debounce window.
    pub fn record_position(&mut self, position: u32) {
        self.coalescer.record(position, Utc::now());
    }

    /// Sends the pending position if its debounce window has elapsed.
    ///
    /// Drivers call this on their own tick; failures are logged and the
    /// position is dropped (the next tick supersedes it anyway).
    pub async fn pump_position(&mut self, now: DateTime<Utc>) {
        if let Some(position) = self.coalescer.poll(now) {
            self.send_position(position).await;
        }
    }

    /// Sends the pending position immediately, regardless of the window.
    pub async fn flush_position(&mut self) {
        if let Some(position) = self.coalescer.flush() {
            self.send_position(position).await;
        }
    }

    async fn send_position(&mut self, position: u32) {
        let Some(lesson_id) = self.navigator.current_lesson().map(str::to_string) else {
            return;
        };
        if let Err(e) = self
            .backend
            .put_watch_position(&self.user_id, &lesson_id, position)
            .await
        {
            warn!(lesson_id, position, error = %e, "watch-position update failed");
        }
    }

    // ========================================================================
    // Lesson completion
    // ========================================================================

    /// Marks a lesson complete: optimistic local patch, fire-and-forget
    /// POST, then an authoritative re-fetch to confirm. Idempotent once the
    /// lesson is already complete.
    ///
    /// # Errors
    ///
    /// Returns `ProgressUpdate` when the POST fails; the optimistic patch
    /// stays applied and reverts on its own if never confirmed.
    pub async fn mark_lesson_complete(&mut self, lesson_id: &str) -> Result<()> {
        if self.tracker.is_completed(lesson_id) {
            return Ok(());
        }

        self.tracker.mark_optimistic(lesson_id, Utc::now());

        if let Err(e) = self
            .backend
            .mark_lesson_complete(&self.user_id, lesson_id)
            .await
        {
            return Err(SessionError::progress_update(lesson_id, e.to_string()));
        }

        // Authoritative re-fetch confirms the optimistic patch; a failure
        // here is not fatal, the overlay reverts on its own if unconfirmed.
        if let Err(e) = self.refresh_progress().await {
            warn!(lesson_id, error = %e, "progress re-fetch after completion failed");
        }
        Ok(())
    }

    /// Re-fetches aggregate progress and applies it.
    ///
    /// # Errors
    ///
    /// Returns `ProgressLoad` on failure; the prior snapshot stays.
    pub async fn refresh_progress(&mut self) -> Result<()> {
        let snapshot = self
            .backend
            .fetch_progress(&self.user_id, &self.course_id)
            .await
            .map_err(|e| SessionError::progress_load(&self.user_id, e.to_string()))?;
        self.tracker.apply_snapshot(snapshot);
        Ok(())
    }

    /// Reverts optimistic completions that outlived the confirmation
    /// window, returning the affected lesson ids.
    pub fn revert_stale_completions(&mut self) -> Vec<String> {
        self.tracker.revert_stale(Utc::now())
    }

    // ========================================================================
    // Assessment attempts
    // ========================================================================

    /// Opens the start dialog for an assessment (Idle → Confirming).
    ///
    /// # Errors
    ///
    /// `NotLoaded` before `load`, `UnknownAssessment` for a foreign id,
    /// plus controller transition errors.
    pub fn start_assessment(&mut self, assessment_id: &str) -> Result<()> {
        let curriculum = self.curriculum.as_ref().ok_or(SessionError::NotLoaded)?;
        let assessment = curriculum
            .find_assessment(assessment_id)
            .ok_or_else(|| SessionError::unknown_assessment(assessment_id))?
            .clone();

        let origin = match assessment.level {
            AssessmentLevel::LessonQuiz => {
                let lesson = curriculum
                    .lesson_for_quiz(assessment_id)
                    .ok_or_else(|| SessionError::unknown_assessment(assessment_id))?;
                AttemptOrigin::Lesson {
                    lesson_id: lesson.id.clone(),
                }
            }
            AssessmentLevel::ModuleAssessment => {
                let module = curriculum
                    .modules
                    .iter()
                    .find(|m| m.assessment.as_ref().is_some_and(|a| a.id == assessment_id))
                    .ok_or_else(|| SessionError::unknown_assessment(assessment_id))?;
                AttemptOrigin::Module {
                    module_id: module.id.clone(),
                }
            }
            AssessmentLevel::CourseFinal => AttemptOrigin::Final,
        };

        let prior = u32::try_from(self.tracker.previous_attempts_for(assessment_id).len())
            .unwrap_or(u32::MAX);
        self.controller.start(assessment, origin, prior)
    }

    /// Confirms the start dialog: creates the server-side attempt and moves
    /// to InProgress (possibly resuming a returned in-progress attempt).
    ///
    /// # Errors
    ///
    /// `MissingEnrollment` before any network call when no enrollment is
    /// known; `AttemptStart` when the POST fails (the view returns to
    /// Idle).
    pub async fn confirm_start(&mut self) -> Result<()> {
        if self.controller.phase() != AttemptPhase::Confirming {
            return Err(SessionError::invalid_transition(
                self.controller.phase(),
                AttemptPhase::InProgress,
            ));
        }
        let assessment_id = self
            .controller
            .assessment()
            .map(|a| a.id.clone())
            .ok_or(SessionError::NotLoaded)?;
        let enrollment_id = self
            .tracker
            .enrollment_id()
            .ok_or(SessionError::MissingEnrollment)?
            .to_string();

        let request = StartAttemptRequest {
            assessment_id: assessment_id.clone(),
            user_id: self.user_id.clone(),
            enrollment_id,
            status: AttemptStatus::InProgress,
            started_at: Utc::now(),
        };

        match self.backend.start_attempt(&request).await {
            Ok(attempt) => {
                info!(
                    assessment_id,
                    attempt_id = %attempt.id,
                    resumed_answers = attempt.answers.len(),
                    "attempt started"
                );
                self.controller.begin(attempt)
            }
            Err(e) => {
                self.controller.abandon();
                Err(SessionError::attempt_start(assessment_id, e.to_string()))
            }
        }
    }

    /// Records an answer for a question of the in-progress attempt.
    ///
    /// # Errors
    ///
    /// Propagates the controller's phase check.
    pub fn set_answer(&mut self, question_id: &str, value: &str) -> Result<()> {
        self.controller.set_answer(question_id, value)
    }

    /// Manual submission: requires every question answered, then runs the
    /// guarded submission path.
    ///
    /// # Errors
    ///
    /// `Unanswered` before any network call; otherwise as
    /// [`LearningSession::time_up`].
    pub async fn submit(&mut self) -> Result<Option<ScoreSummary>> {
        self.controller.ensure_all_answered()?;
        self.finish_attempt().await
    }

    /// Countdown expiry: submits whatever answers are stored. Safe to call
    /// concurrently with a manual submit — the second caller is a no-op.
    ///
    /// # Errors
    ///
    /// As [`LearningSession::submit`], minus the all-answered gate.
    pub async fn time_up(&mut self) -> Result<Option<ScoreSummary>> {
        self.finish_attempt().await
    }

    /// Retries a submission whose POST failed.
    ///
    /// # Errors
    ///
    /// `AttemptSubmit` when the POST fails again.
    pub async fn retry_submit(&mut self) -> Result<Option<ScoreSummary>> {
        match self.pending_submission.take() {
            Some(submission) => self.post_submission(submission).await.map(Some),
            None => Ok(None),
        }
    }

    async fn finish_attempt(&mut self) -> Result<Option<ScoreSummary>> {
        // Only the first caller gets the submission; a timer firing right
        // after a manual submit lands here and leaves quietly.
        let Some(submission) = self.controller.take_submission(Utc::now()) else {
            return Ok(None);
        };
        self.post_submission(submission).await.map(Some)
    }

    async fn post_submission(&mut self, submission: ScoredSubmission) -> Result<ScoreSummary> {
        let summary = submission.summary;
        info!(
            assessment_id = %submission.assessment_id,
            attempt_id = %submission.attempt_id,
            score = summary.score,
            percentage = summary.percentage,
            passed = summary.passed,
            time_spent = submission.time_spent,
            "submitting scored attempt"
        );

        let request = SubmitAttemptRequest {
            submit: true,
            id: submission.attempt_id.clone(),
            answers: submission.answers.clone(),
            score: summary.score,
            percentage: summary.percentage,
            passed: summary.passed,
            status: AttemptStatus::Completed,
            completed_at: submission.completed_at,
            time_spent: submission.time_spent,
        };

        if let Err(e) = self.backend.submit_attempt(&request).await {
            let attempt_id = submission.attempt_id.clone();
            // Keep the scored submission so the user can retry without
            // re-entering the attempt.
            self.pending_submission = Some(submission);
            return Err(SessionError::attempt_submit(attempt_id, e.to_string()));
        }

        if let Err(e) = self.refresh_progress().await {
            warn!(error = %e, "progress re-fetch after submission failed");
        }

        // A passed lesson quiz completes its originating lesson.
        if summary.passed && submission.level == AssessmentLevel::LessonQuiz {
            if let AttemptOrigin::Lesson { lesson_id } = &submission.origin {
                let lesson_id = lesson_id.clone();
                if let Err(e) = self.mark_lesson_complete(&lesson_id).await {
                    warn!(lesson_id, error = %e, "auto-completion after passed quiz failed");
                }
            }
        }

        Ok(summary)
    }

    /// Whether the review screen should offer a retake.
    #[must_use]
    pub fn can_retake(&self) -> bool {
        self.controller.can_retake()
    }

    /// Re-enters the start dialog for the same assessment.
    ///
    /// # Errors
    ///
    /// Propagates the controller's retake gating.
    pub fn retake(&mut self) -> Result<()> {
        self.controller.retake()
    }
}
