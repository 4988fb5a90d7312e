//! Coalescing of watch-position updates.
//!
//! Playback ticks arrive far faster than they are worth persisting. The
//! coalescer holds only the latest position and releases it once the
//! debounce window has passed without a newer tick, so an idle period
//! produces at most one PUT. Switching lessons or tearing the player down
//! flushes whatever is pending so the last known position is never lost.
//!
//! This type is pure state over injected clocks; the async driver that
//! actually performs the PUT lives in the client crate.

use chrono::{DateTime, Duration, Utc};

/// Holds the newest pending position and the moment it becomes due.
#[derive(Debug)]
pub struct PositionCoalescer {
    window: Duration,
    pending: Option<u32>,
    due_at: Option<DateTime<Utc>>,
}

impl PositionCoalescer {
    /// Creates a coalescer with the given debounce window.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            due_at: None,
        }
    }

    /// Records a position tick, replacing any pending value and restarting
    /// the window.
    pub fn record(&mut self, position: u32, now: DateTime<Utc>) {
        self.pending = Some(position);
        self.due_at = Some(now + self.window);
    }

    /// Whether a position is waiting to be sent.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending position becomes due, if any.
    #[must_use]
    pub const fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_at
    }

    /// Releases the pending position when the window has elapsed.
    ///
    /// Returns `None` while within the window or when nothing is pending.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<u32> {
        let due_at = self.due_at?;
        if now < due_at {
            return None;
        }
        self.take()
    }

    /// Releases the pending position immediately, regardless of the window.
    ///
    /// Used on lesson change and teardown.
    pub fn flush(&mut self) -> Option<u32> {
        self.take()
    }

    fn take(&mut self) -> Option<u32> {
        self.due_at = None;
        self.pending.take()
    }
}
