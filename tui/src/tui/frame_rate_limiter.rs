//! Caps how often the scheduler may notify the draw loop.
//!
//! Holding `j` in the history pane produces a scroll request per key repeat; there is no point
//! redrawing faster than 120 times a second.

use std::time::Duration;
use std::time::Instant;

/// Minimum spacing between two draw notifications (120 FPS).
pub(super) const MIN_FRAME_INTERVAL: Duration = Duration::from_nanos(8_333_334);

#[derive(Debug, Default)]
pub(super) struct FrameRateLimiter {
    last_emitted_at: Option<Instant>,
}

impl FrameRateLimiter {
    /// Push `requested` forward if it falls inside the minimum interval after the last draw.
    pub(super) fn clamp_deadline(&self, requested: Instant) -> Instant {
        match self.last_emitted_at {
            None => requested,
            Some(last) => requested.max(last.checked_add(MIN_FRAME_INTERVAL).unwrap_or(last)),
        }
    }

    pub(super) fn mark_emitted(&mut self, emitted_at: Instant) {
        self.last_emitted_at = Some(emitted_at);
    }
}
