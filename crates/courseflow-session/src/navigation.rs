//! Lesson navigation over the flattened curriculum.
//!
//! Modules flatten into a single ordered lesson sequence; next and previous
//! are purely the neighbors of the active lesson's index. Selection is
//! session-scoped and never persisted.

use crate::curriculum::Curriculum;
use crate::error::{Result, SessionError};

/// Tracks which lesson is active and derives next/previous ordering.
#[derive(Debug, Default)]
pub struct Navigator {
    order: Vec<String>,
    current: Option<usize>,
}

impl Navigator {
    /// Builds the flattened ordering from a curriculum and selects its
    /// first lesson, if any lessons exist.
    #[must_use]
    pub fn from_curriculum(curriculum: &Curriculum) -> Self {
        let order = curriculum.lesson_order();
        let current = if order.is_empty() { None } else { Some(0) };
        Self { order, current }
    }

    /// The active lesson id.
    #[must_use]
    pub fn current_lesson(&self) -> Option<&str> {
        self.current.map(|i| self.order[i].as_str())
    }

    /// The lesson after the active one, if any.
    #[must_use]
    pub fn next_lesson(&self) -> Option<&str> {
        let i = self.current?;
        self.order.get(i + 1).map(String::as_str)
    }

    /// The lesson before the active one, if any.
    #[must_use]
    pub fn previous_lesson(&self) -> Option<&str> {
        let i = self.current?;
        i.checked_sub(1).map(|p| self.order[p].as_str())
    }

    /// 1-based position of the active lesson and the total count, for
    /// "lesson 2 of 7" displays.
    #[must_use]
    pub fn position(&self) -> Option<(usize, usize)> {
        self.current.map(|i| (i + 1, self.order.len()))
    }

    /// Selects a lesson by id.
    ///
    /// The session layer resets the attempt view and flushes the pending
    /// position update around this call.
    ///
    /// # Errors
    ///
    /// Returns `UnknownLesson` when the id is not in the ordering.
    pub fn select(&mut self, lesson_id: &str) -> Result<()> {
        let index = self
            .order
            .iter()
            .position(|id| id == lesson_id)
            .ok_or_else(|| SessionError::unknown_lesson(lesson_id))?;
        self.current = Some(index);
        Ok(())
    }
}
