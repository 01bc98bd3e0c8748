//! Frame-by-frame interpolation between two price series.
//!
//! [`blend`] is the pure interpolation step. [`TransitionFrames`] walks
//! the progress ladder lazily, and [`TransitionAnimator`] drives it on a
//! timer from a spawned task that can be cancelled mid-flight.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Duration;

use trendcast_core::{PricePoint, PriceSeries};

/// Progress advance per frame. 20 frames take a transition from start
/// to finish.
pub const PROGRESS_STEP: f64 = 0.05;

/// Interpolates between `old` and `new` at `progress` in [0, 1].
///
/// The output always has the shape of `new`: its length and timestamps
/// come from the new series, and only prices are blended. When the old
/// series is shorter than the new one, its last point stands in for the
/// missing tail; when it is empty, the new point stands in for itself
/// and the frame is already final at that index.
#[must_use]
pub fn blend(old: &PriceSeries, new: &PriceSeries, progress: f64) -> PriceSeries {
    let progress = progress.clamp(0.0, 1.0);
    let old_points = old.points();

    let blended: Vec<PricePoint> = new
        .points()
        .iter()
        .enumerate()
        .map(|(i, target)| {
            let from = old_points
                .get(i)
                .or_else(|| old_points.last())
                .map_or(target.price, |p| p.price);
            PricePoint::new(
                target.timestamp_ms,
                from + (target.price - from) * progress,
            )
        })
        .collect();

    blended.into()
}

/// Lazy iterator over the frames of one transition.
///
/// Progress starts at [`PROGRESS_STEP`] and the final frame is emitted
/// at exactly 1.0, so the last yielded series equals the new series.
pub struct TransitionFrames {
    old: PriceSeries,
    new: PriceSeries,
    progress: f64,
    done: bool,
}

impl TransitionFrames {
    #[must_use]
    pub fn new(old: PriceSeries, new: PriceSeries) -> Self {
        Self {
            old,
            new,
            progress: 0.0,
            done: false,
        }
    }
}

impl Iterator for TransitionFrames {
    type Item = PriceSeries;

    fn next(&mut self) -> Option<PriceSeries> {
        if self.done {
            return None;
        }
        self.progress += PROGRESS_STEP;
        if self.progress >= 1.0 {
            self.progress = 1.0;
            self.done = true;
        }
        Some(blend(&self.old, &self.new, self.progress))
    }
}

/// Drives a [`TransitionFrames`] walk on a fixed frame interval from a
/// spawned task, delivering each frame over a channel.
///
/// Dropping the animator (or calling [`cancel`](Self::cancel)) stops the
/// task; the receiver then sees the channel close without a final frame
/// being forced out.
pub struct TransitionAnimator {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl TransitionAnimator {
    /// Spawns the animation task. Frames arrive on the returned receiver
    /// every `frame_interval` until progress reaches 1.0 or the animator
    /// is cancelled.
    #[must_use]
    pub fn start(
        old: PriceSeries,
        new: PriceSeries,
        frame_interval: Duration,
    ) -> (Self, mpsc::Receiver<PriceSeries>) {
        let (frame_tx, frame_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(frame_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut frames = TransitionFrames::new(old, new);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(frame) = frames.next() else {
                            tracing::debug!("transition complete");
                            break;
                        };
                        if frame_tx.send(frame).await.is_err() {
                            tracing::debug!("frame receiver dropped, stopping transition");
                            break;
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("transition cancelled");
                            break;
                        }
                    }
                }
            }
        });

        (
            Self {
                shutdown_tx,
                handle: Some(handle),
            },
            frame_rx,
        )
    }

    /// Stops the animation task. Idempotent.
    pub fn cancel(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TransitionAnimator {
    fn drop(&mut self) {
        self.cancel();
    }
}
