//! # Canvas Loop
//!
//! Timer-driven frame pacing for the coordinator:
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ 1. ADVANCE   clock.now() feeds the fixed-timestep accumulator │
//! │ 2. TICK      one coordinator.tick() per due step (capped)     │
//! │ 3. RECORD    TickReport -> FrameStats -> accumulator          │
//! │ 4. SLEEP     until the next step is due, never busy-poll      │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use mosaic_rendering::{Clock, Priority, QualityChange, RenderCoordinator, TickReport};

/// Most ticks run for one `advance`. Anything beyond is dropped, so a stall
/// does not turn into a burst of catch-up frames.
pub const MAX_CATCH_UP_TICKS: u32 = 4;

/// Fixed-timestep accumulator.
#[derive(Clone, Debug)]
pub struct TickPacer {
    step: Duration,
    accumulator: Duration,
    last: Option<Duration>,
    skipped: u64,
}

impl TickPacer {
    /// Pacer emitting one tick per `step`.
    #[must_use]
    pub fn new(step: Duration) -> Self {
        Self {
            step: step.max(Duration::from_micros(1)),
            accumulator: Duration::ZERO,
            last: None,
            skipped: 0,
        }
    }

    /// Pacer for a target frame rate.
    #[must_use]
    pub fn from_fps(fps: u32) -> Self {
        Self::new(Duration::from_secs(1) / fps.max(1))
    }

    /// Feeds the current time, returns how many ticks are due.
    ///
    /// The first call always yields one tick.
    pub fn advance(&mut self, now: Duration) -> u32 {
        let Some(last) = self.last.replace(now) else {
            return 1;
        };
        self.accumulator += now.saturating_sub(last);

        let mut due = 0;
        while self.accumulator >= self.step && due < MAX_CATCH_UP_TICKS {
            self.accumulator -= self.step;
            due += 1;
        }
        if self.accumulator >= self.step {
            let backlog = self.accumulator.as_nanos() / self.step.as_nanos();
            self.skipped += u64::try_from(backlog).unwrap_or(u64::MAX);
            self.accumulator = Duration::ZERO;
            tracing::debug!(skipped = %backlog, "tick backlog dropped");
        }
        due
    }

    /// Time until the next tick is due.
    #[must_use]
    pub fn until_next(&self) -> Duration {
        self.step.saturating_sub(self.accumulator)
    }

    /// Tick length.
    #[must_use]
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Ticks dropped after stalls.
    #[must_use]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

/// Statistics for one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Frame index.
    pub frame: u64,
    /// Frame time in microseconds.
    pub frame_us: u64,
    /// Layers rendered.
    pub layers_rendered: u32,
    /// Requests left queued.
    pub pending: usize,
    /// Broadcasts delivered.
    pub messages: usize,
    /// Frame counted as dropped.
    pub dropped: bool,
}

impl From<&TickReport> for FrameStats {
    fn from(report: &TickReport) -> Self {
        Self {
            frame: report.frame_index,
            frame_us: u64::try_from(report.frame_time.as_micros()).unwrap_or(u64::MAX),
            layers_rendered: u32::try_from(report.rendered.len()).unwrap_or(u32::MAX),
            pending: report.pending,
            messages: report.messages_delivered,
            dropped: report.dropped,
        }
    }
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Frames that rendered nothing.
    pub idle_frames: u64,
    /// Sum of frame times.
    pub total_us_sum: u64,
    /// Min frame time of frames that rendered.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames counted as dropped.
    pub frames_dropped: u64,
    /// Sum of layers rendered.
    pub layers_rendered_sum: u64,
    /// Broadcasts delivered.
    pub messages_delivered: u64,
    /// Quality transitions in order.
    pub quality_changes: Vec<QualityChange>,
}

impl FrameStatsAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            idle_frames: 0,
            total_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_dropped: 0,
            layers_rendered_sum: 0,
            messages_delivered: 0,
            quality_changes: Vec::new(),
        }
    }

    /// Records one tick.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.frame_us;
        self.max_frame_us = self.max_frame_us.max(stats.frame_us);
        self.layers_rendered_sum += u64::from(stats.layers_rendered);
        self.messages_delivered += stats.messages as u64;
        if stats.layers_rendered == 0 {
            self.idle_frames += 1;
        } else {
            self.min_frame_us = self.min_frame_us.min(stats.frame_us);
        }
        if stats.dropped {
            self.frames_dropped += 1;
        }
    }

    /// Records a quality transition.
    pub fn record_quality_change(&mut self, change: QualityChange) {
        self.quality_changes.push(change);
    }

    /// Average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Frame rate the average frame time would sustain.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Share of frames counted as dropped.
    #[must_use]
    pub fn dropped_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_dropped as f64 / self.frames_recorded as f64
    }

    /// Prints a summary of the statistics.
    pub fn print_summary(&self) {
        let min_ms = if self.min_frame_us == u64::MAX {
            0.0
        } else {
            self.min_frame_us as f64 / 1000.0
        };
        println!("╔══════════════════════════════════════════════════════════════════╗");
        println!("║                    CANVAS SESSION SUMMARY                        ║");
        println!("╚══════════════════════════════════════════════════════════════════╝");
        println!();
        println!("┌─ TIMING ───────────────────────────────────────────────────────┐");
        println!("│ Frames Recorded:    {}", self.frames_recorded);
        println!("│ Idle Frames:        {}", self.idle_frames);
        println!("│ Average Frame:      {:.3} ms ({:.1} FPS)", self.avg_frame_ms(), self.avg_fps());
        println!("│ Min Frame:          {min_ms:.3} ms");
        println!("│ Max Frame:          {:.3} ms", self.max_frame_us as f64 / 1000.0);
        println!("│ Dropped:            {} frames ({:.1}%)", self.frames_dropped, self.dropped_ratio() * 100.0);
        println!("└──────────────────────────────────────────────────────────────────┘");
        println!();
        println!("┌─ WORK ─────────────────────────────────────────────────────────┐");
        println!("│ Layer Renders:      {}", self.layers_rendered_sum);
        println!("│ Broadcasts:         {}", self.messages_delivered);
        println!("└──────────────────────────────────────────────────────────────────┘");

        if !self.quality_changes.is_empty() {
            println!();
            println!("┌─ QUALITY ──────────────────────────────────────────────────────┐");
            for change in &self.quality_changes {
                println!("│ {:<8} -> {:<8} ({:?})", change.from.name(), change.to.name(), change.reason);
            }
            println!("└──────────────────────────────────────────────────────────────────┘");
        }
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives a [`RenderCoordinator`] from a clock.
///
/// Each tick first queues a normal-priority frame for layers still flagged
/// `needs_update` (animations), then runs the coordinator's tick.
pub struct CanvasLoop<C: Clock> {
    coordinator: RenderCoordinator,
    clock: C,
    pacer: TickPacer,
    stats: FrameStatsAccumulator,
}

impl<C: Clock> CanvasLoop<C> {
    /// Creates a loop. `clock` must be the coordinator's time source.
    #[must_use]
    pub fn new(coordinator: RenderCoordinator, clock: C, pacer: TickPacer) -> Self {
        Self {
            coordinator,
            clock,
            pacer,
            stats: FrameStatsAccumulator::new(),
        }
    }

    /// Runs every tick that is due. Returns the number run.
    pub fn pump(&mut self) -> u32 {
        let due = self.pacer.advance(self.clock.now());
        let mut ran = 0;
        for _ in 0..due {
            if self.coordinator.is_disposed() {
                break;
            }
            self.coordinator.schedule_updates(Priority::Normal);
            let Some(report) = self.coordinator.tick() else {
                break;
            };
            self.stats.record(FrameStats::from(&report));
            if let Some(change) = report.quality_change {
                self.stats.record_quality_change(change);
            }
            ran += 1;
        }
        ran
    }

    /// Pumps and sleeps until the clock reaches `deadline` or the coordinator
    /// is disposed. `sleep` is handed the wait until the next tick.
    pub fn run_until(&mut self, deadline: Duration, mut sleep: impl FnMut(Duration)) -> u64 {
        let mut ticks = 0;
        while self.clock.now() < deadline && !self.coordinator.is_disposed() {
            ticks += u64::from(self.pump());
            sleep(self.pacer.until_next());
        }
        ticks
    }

    /// Time until the next tick is due.
    #[must_use]
    pub fn until_next(&self) -> Duration {
        self.pacer.until_next()
    }

    /// The coordinator.
    #[must_use]
    pub fn coordinator(&self) -> &RenderCoordinator {
        &self.coordinator
    }

    /// The coordinator, mutably (input routing, config changes).
    pub fn coordinator_mut(&mut self) -> &mut RenderCoordinator {
        &mut self.coordinator
    }

    /// Accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }

    /// The pacer.
    #[must_use]
    pub fn pacer(&self) -> &TickPacer {
        &self.pacer
    }

    /// Disposes the coordinator; later pumps do nothing.
    pub fn shutdown(&mut self) {
        self.coordinator.dispose();
    }
}
