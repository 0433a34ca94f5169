//! Log playback
//!
//! Replays a recorded log with its original timing. The first
//! `preload_count` samples are emitted at once, the rest are paced by the
//! gaps between their timestamps divided by the playback speed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{SampleRecord, SlidingWindow, TimeScale, Timeline, WindowSnapshot};
use crate::config::ReplayConfig;

/// Lower bound applied to the playback speed before dividing by it
pub const MIN_SPEED: f64 = 1e-6;

/// Longest single sleep of [`SystemClock`] between cancellation checks
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Shared flag raised to stop a running replay or logger
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a lowered flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the flag has been raised
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Source of the blocking waits used for pacing
pub trait Clock {
    /// Block for `duration`
    fn sleep(&mut self, duration: Duration);
}

/// Wall clock that wakes early when its cancel flag is raised
#[derive(Debug, Clone)]
pub struct SystemClock {
    cancel: CancelFlag,
}

impl SystemClock {
    /// Create a clock tied to `cancel`
    pub fn new(cancel: CancelFlag) -> Self {
        Self { cancel }
    }
}

impl Clock for SystemClock {
    fn sleep(&mut self, duration: Duration) {
        let mut remaining = duration;
        while !remaining.is_zero() && !self.cancel.is_cancelled() {
            let slice = remaining.min(SLEEP_SLICE);
            std::thread::sleep(slice);
            remaining -= slice;
        }
    }
}

/// Simulated clock that records sleeps instead of blocking
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    sleeps: Vec<Duration>,
    cancel_after: Option<(usize, CancelFlag)>,
}

impl ManualClock {
    /// Create a clock with no recorded sleeps
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise `cancel` during the `n`th sleep (1-based), as an interrupt
    /// arriving while waiting would
    pub fn cancel_during_sleep(mut self, n: usize, cancel: CancelFlag) -> Self {
        self.cancel_after = Some((n, cancel));
        self
    }

    /// Sleeps requested so far
    pub fn sleeps(&self) -> &[Duration] {
        &self.sleeps
    }

    /// Sum of all requested sleeps
    pub fn elapsed(&self) -> Duration {
        self.sleeps.iter().sum()
    }
}

impl Clock for ManualClock {
    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
        if let Some((n, cancel)) = &self.cancel_after {
            if self.sleeps.len() >= *n {
                cancel.cancel();
            }
        }
    }
}

/// Consumer of window snapshots
///
/// Called synchronously after each step; the snapshot must not be kept past
/// the call.
pub trait RenderSink {
    /// Redraw from the current window contents
    fn render(&mut self, snapshot: &WindowSnapshot<'_>);
}

impl<F> RenderSink for F
where
    F: FnMut(&WindowSnapshot<'_>),
{
    fn render(&mut self, snapshot: &WindowSnapshot<'_>) {
        self(snapshot)
    }
}

/// Outcome of a replay run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplaySummary {
    /// Records in the timeline
    pub total_rows: usize,
    /// Records consumed by the preload phase
    pub preloaded: usize,
    /// Records that reached the window
    pub emitted: usize,
    /// Records dropped for a missing temperature, humidity or AQI
    pub skipped: usize,
    /// Number of sink hand-offs
    pub hand_offs: usize,
    /// Time unit applied to the run
    pub scale: TimeScale,
    /// Whether the run was stopped by the cancel flag
    pub cancelled: bool,
}

/// Replays a [`Timeline`] into a [`RenderSink`]
pub struct ReplayDriver<C: Clock> {
    speed: f64,
    max_window_size: usize,
    preload_count: usize,
    clock: C,
    cancel: CancelFlag,
}

impl<C: Clock> ReplayDriver<C> {
    /// Create a driver from the replay settings
    pub fn new(config: &ReplayConfig, clock: C, cancel: CancelFlag) -> Self {
        Self {
            speed: config.speed,
            max_window_size: config.max_window_size,
            preload_count: config.preload_count,
            clock,
            cancel,
        }
    }

    /// Get the clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Convert a raw time step into the wall-clock wait before the next sample
    pub fn pacing_delay(&self, dt_raw: f64, scale: TimeScale) -> f64 {
        (dt_raw * scale.factor()) / self.speed.max(MIN_SPEED)
    }

    /// Run the replay to completion or cancellation
    ///
    /// The sink receives one snapshot after the preload phase, one per
    /// accepted paced sample and a final one when the run ends.
    pub fn run<S: RenderSink + ?Sized>(&mut self, timeline: &Timeline, sink: &mut S) -> ReplaySummary {
        let records = timeline.records();
        let scale = timeline.scale();
        let mut window = SlidingWindow::new(self.max_window_size);
        let mut summary = ReplaySummary {
            total_rows: records.len(),
            preloaded: 0,
            emitted: 0,
            skipped: 0,
            hand_offs: 0,
            scale,
            cancelled: false,
        };

        let preload_n = self.preload_count.min(records.len());
        tracing::info!("Total samples: {}", records.len());
        tracing::info!("Preloading first {} samples (no delay)...", preload_n);

        for record in &records[..preload_n] {
            accept(timeline, record, &mut window, &mut summary);
        }
        summary.preloaded = preload_n;

        sink.render(&window.snapshot());
        summary.hand_offs += 1;

        tracing::info!(
            "Starting timed replay from sample {} to {} at {}x speed.",
            preload_n,
            records.len().saturating_sub(1),
            self.speed
        );

        let mut prev_raw = match preload_n {
            0 => timeline.first_raw_time().unwrap_or_default(),
            n => records[n - 1].raw_time,
        };

        for record in &records[preload_n..] {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let dt = self.pacing_delay(record.raw_time - prev_raw, scale);
            if dt > 0.0 {
                self.clock
                    .sleep(Duration::try_from_secs_f64(dt).unwrap_or(Duration::MAX));
                if self.cancel.is_cancelled() {
                    summary.cancelled = true;
                    break;
                }
            }
            prev_raw = record.raw_time;

            if accept(timeline, record, &mut window, &mut summary) {
                sink.render(&window.snapshot());
                summary.hand_offs += 1;
            }
        }

        if summary.cancelled {
            tracing::info!("Replay interrupted by user.");
        }

        sink.render(&window.snapshot());
        summary.hand_offs += 1;

        tracing::debug!(?summary, "Replay finished");
        summary
    }
}

fn accept(
    timeline: &Timeline,
    record: &SampleRecord,
    window: &mut SlidingWindow,
    summary: &mut ReplaySummary,
) -> bool {
    match record.to_point(timeline.relative_time(record.raw_time)) {
        Some(point) => {
            window.push(point);
            summary.emitted += 1;
            true
        }
        None => {
            tracing::debug!(raw_time = record.raw_time, "Skipping row with missing fields");
            summary.skipped += 1;
            false
        }
    }
}
