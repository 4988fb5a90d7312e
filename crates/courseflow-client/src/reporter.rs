//! Async driver for debounced watch-position reporting.
//!
//! The session's coalescer is pure state over injected clocks; this reporter
//! is its tokio counterpart for drivers that want real timers. It holds the
//! newest (lesson, position) pair, waits out the debounce window, and sends
//! at most one PUT per idle period through a [`PositionSink`]. Lesson change
//! and teardown flush the pending pair immediately so the last known
//! position survives.

use tokio::time::{sleep_until, Duration, Instant};
use tracing::warn;

use courseflow_session::BackendError;

/// Destination for coalesced position updates.
///
/// Implemented by the API client; tests substitute a recording sink.
#[allow(async_fn_in_trait)]
pub trait PositionSink {
    /// Persists one position for one lesson.
    async fn put_position(&self, lesson_id: &str, position: u32) -> Result<(), BackendError>;
}

#[derive(Debug)]
struct Pending {
    lesson_id: String,
    position: u32,
    due_at: Instant,
}

/// Debounces position ticks in front of a [`PositionSink`].
#[derive(Debug)]
pub struct PositionReporter<S> {
    sink: S,
    window: Duration,
    pending: Option<Pending>,
}

impl<S: PositionSink> PositionReporter<S> {
    /// Creates a reporter with the given debounce window.
    pub const fn new(sink: S, window: Duration) -> Self {
        Self {
            sink,
            window,
            pending: None,
        }
    }

    /// Records a position tick, replacing any pending pair and restarting
    /// the window.
    pub fn record(&mut self, lesson_id: impl Into<String>, position: u32) {
        self.pending = Some(Pending {
            lesson_id: lesson_id.into(),
            position,
            due_at: Instant::now() + self.window,
        });
    }

    /// Whether a position is waiting to be sent.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Waits out the debounce window and sends the pending pair.
    ///
    /// Returns `false` immediately when nothing is pending. Holding
    /// `&mut self` across the wait means no tick can sneak in between the
    /// deadline passing and the send.
    pub async fn wait_and_send(&mut self) -> bool {
        let Some(due_at) = self.pending.as_ref().map(|p| p.due_at) else {
            return false;
        };
        sleep_until(due_at).await;
        self.send().await
    }

    /// Sends the pending pair immediately, regardless of the window.
    ///
    /// Called on lesson change and teardown.
    pub async fn flush(&mut self) -> bool {
        self.send().await
    }

    async fn send(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        if let Err(e) = self
            .sink
            .put_position(&pending.lesson_id, pending.position)
            .await
        {
            // The next tick supersedes this position anyway.
            warn!(
                lesson_id = %pending.lesson_id,
                position = pending.position,
                error = %e,
                "watch-position update failed"
            );
        }
        true
    }
}
