use std::time::{Duration, Instant};

/// Loop health over one reporting interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub fps: f32,
    pub tps: f32,
    pub frame_time_ms: f32,
    pub worst_frame_ms: f32,
    pub clamped_frames: u32,
}

#[derive(Debug, Default)]
struct IntervalCounters {
    frames: u32,
    ticks: u32,
    clamped_frames: u32,
    frame_time_total: Duration,
    worst_frame: Duration,
}

impl IntervalCounters {
    fn summarize(&self, elapsed: Duration) -> LoopMetricsSnapshot {
        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let mean_frame = match self.frames {
            0 => Duration::ZERO,
            frames => self.frame_time_total / frames,
        };
        LoopMetricsSnapshot {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            frame_time_ms: as_millis_f32(mean_frame),
            worst_frame_ms: as_millis_f32(self.worst_frame),
            clamped_frames: self.clamped_frames,
        }
    }
}

fn as_millis_f32(duration: Duration) -> f32 {
    duration.as_secs_f32() * 1000.0
}

/// Counts frames, ticks and clamps, and hands out a snapshot once per
/// interval.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval: Duration,
    opened_at: Instant,
    counters: IntervalCounters,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self::opened_at(Instant::now(), interval)
    }

    fn opened_at(opened_at: Instant, interval: Duration) -> Self {
        Self {
            interval,
            opened_at,
            counters: IntervalCounters::default(),
        }
    }

    pub(crate) fn record_frame(&mut self, frame_dt: Duration) {
        let counters = &mut self.counters;
        counters.frames = counters.frames.saturating_add(1);
        counters.frame_time_total = counters.frame_time_total.saturating_add(frame_dt);
        counters.worst_frame = counters.worst_frame.max(frame_dt);
    }

    pub(crate) fn record_tick(&mut self) {
        self.counters.ticks = self.counters.ticks.saturating_add(1);
    }

    pub(crate) fn record_clamp(&mut self) {
        self.counters.clamped_frames = self.counters.clamped_frames.saturating_add(1);
    }

    /// Closes the interval and starts a fresh one when `interval` has passed.
    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.opened_at);
        if elapsed < self.interval {
            return None;
        }
        let counters = std::mem::take(&mut self.counters);
        self.opened_at = now;
        Some(counters.summarize(elapsed))
    }
}
