//! Redraw scheduling for the overlay.
//!
//! Panes hold a cloned [`FrameRequester`] and call [`FrameRequester::schedule_frame`] whenever
//! their visible state changes (scrolling, focus). A background [`FrameScheduler`] task folds
//! bursts of requests into one notification on the broadcast channel the host loop listens to.

use std::time::Duration;
use std::time::Instant;

use tokio::sync::broadcast;
use tokio::sync::mpsc;

use super::frame_rate_limiter::FrameRateLimiter;

/// Cheap, cloneable handle for asking the host loop to redraw.
#[derive(Clone, Debug)]
pub struct FrameRequester {
    frame_schedule_tx: mpsc::UnboundedSender<Instant>,
}

impl FrameRequester {
    /// Spawn the scheduler task; draws are announced on `draw_tx`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(draw_tx: broadcast::Sender<()>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(FrameScheduler::new(rx, draw_tx).run());
        Self {
            frame_schedule_tx: tx,
        }
    }

    pub fn schedule_frame(&self) {
        let _ = self.frame_schedule_tx.send(Instant::now());
    }
}

#[cfg(test)]
impl FrameRequester {
    /// A requester whose requests go nowhere.
    pub(crate) fn test_dummy() -> Self {
        let (tx, _rx) = mpsc::unbounded_channel();
        FrameRequester {
            frame_schedule_tx: tx,
        }
    }

    /// A requester whose raw requests can be counted by the test.
    pub(crate) fn test_with_receiver() -> (Self, mpsc::UnboundedReceiver<Instant>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            FrameRequester {
                frame_schedule_tx: tx,
            },
            rx,
        )
    }
}

struct FrameScheduler {
    receiver: mpsc::UnboundedReceiver<Instant>,
    draw_tx: broadcast::Sender<()>,
    rate_limiter: FrameRateLimiter,
}

impl FrameScheduler {
    fn new(receiver: mpsc::UnboundedReceiver<Instant>, draw_tx: broadcast::Sender<()>) -> Self {
        Self {
            receiver,
            draw_tx,
            rate_limiter: FrameRateLimiter::default(),
        }
    }

    /// Runs until every requester has been dropped.
    async fn run(mut self) {
        const IDLE: Duration = Duration::from_secs(60 * 60 * 24);
        let mut next_deadline: Option<Instant> = None;
        loop {
            let target = next_deadline.unwrap_or_else(|| Instant::now() + IDLE);
            let deadline = tokio::time::sleep_until(target.into());
            tokio::pin!(deadline);

            tokio::select! {
                requested = self.receiver.recv() => {
                    let Some(requested) = requested else {
                        break;
                    };
                    let draw_at = self.rate_limiter.clamp_deadline(requested);
                    next_deadline = Some(next_deadline.map_or(draw_at, |cur| cur.min(draw_at)));
                }
                _ = &mut deadline => {
                    if next_deadline.take().is_some() {
                        self.rate_limiter.mark_emitted(target);
                        let _ = self.draw_tx.send(());
                    }
                }
            }
        }
    }
}
