//! Headless lesson player shell.
//!
//! Resolves what the active lesson should render (video with a resume
//! position, article body, or a quiz affordance) and turns raw playback
//! events into the actions the session should take: report a position tick
//! or auto-mark the lesson complete at end-of-stream.

use crate::curriculum::{ContentType, Lesson};
use crate::progress::ProgressTracker;

/// What the shell renders for the active lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerView {
    /// Embedded video player.
    Video {
        /// Stream URL.
        url: String,
        /// Position to resume from, in seconds.
        resume_at: u32,
        /// Known duration in seconds, when available.
        duration: Option<u32>,
    },
    /// Rendered article.
    Article {
        /// Stored HTML or plain description.
        body: String,
    },
    /// "Start quiz" affordance delegating to the attempt controller.
    Quiz {
        /// The attached assessment.
        assessment_id: String,
    },
    /// Lesson content is missing or inconsistent with its declared type.
    Unavailable,
}

/// A raw event from the embedded player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Periodic playback-position report, in seconds.
    PositionTick(u32),
    /// Playback reached end-of-stream.
    Ended,
}

/// The action the session should take for a player event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    /// Feed the position into the debounced reporter.
    ReportPosition(u32),
    /// Auto-mark the lesson complete.
    MarkComplete,
    /// Nothing to do.
    None,
}

/// Resolves the view for a lesson given the learner's progress.
#[must_use]
pub fn view_for(lesson: &Lesson, tracker: &ProgressTracker) -> PlayerView {
    match lesson.content_type {
        ContentType::Video => lesson.video_url.as_ref().map_or(PlayerView::Unavailable, |url| {
            PlayerView::Video {
                url: url.clone(),
                resume_at: tracker.resume_position(&lesson.id),
                duration: lesson.video_duration,
            }
        }),
        ContentType::Article => PlayerView::Article {
            body: lesson.article_body.clone().unwrap_or_default(),
        },
        ContentType::Quiz => lesson
            .quiz
            .as_ref()
            .map_or(PlayerView::Unavailable, |quiz| PlayerView::Quiz {
                assessment_id: quiz.id.clone(),
            }),
    }
}

/// Maps a player event to the session action it warrants.
///
/// End-of-stream only completes the lesson once: for an already-completed
/// lesson it is a no-op, which also makes the mark-complete affordance
/// idempotent.
#[must_use]
pub fn handle_event(lesson: &Lesson, event: PlayerEvent, tracker: &ProgressTracker) -> PlayerAction {
    match event {
        PlayerEvent::PositionTick(position) => PlayerAction::ReportPosition(position),
        PlayerEvent::Ended => {
            if tracker.is_completed(&lesson.id) {
                PlayerAction::None
            } else {
                PlayerAction::MarkComplete
            }
        }
    }
}
