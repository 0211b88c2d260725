use std::time::{Duration, Instant};

/// Frame-rate bookkeeping for the animation loop.
///
/// Unlike `FrameClock`, the delta is not clamped: the visualizer uses it to
/// decide whether the machine keeps up with the full effect set.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    last_report: Option<Instant>,
    prev: Option<Instant>,
    count: u32,
    delta: Duration,

    frame_start: Option<Instant>,
    total_frametime: Duration,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self {
            last_report: None,
            prev: None,
            count: 0,
            delta: Duration::ZERO,
            frame_start: None,
            total_frametime: Duration::ZERO,
        }
    }

    /// Marks the start of a frame at `now`.
    ///
    /// Logs frame rate and average CPU frame time once per second.
    pub fn frame(&mut self, now: Instant) {
        self.frame_start = Some(Instant::now());
        self.count += 1;
        if let Some(prev) = self.prev {
            self.delta = now.saturating_duration_since(prev);
        }
        self.prev = Some(now);

        let last = *self.last_report.get_or_insert(now);
        if now.saturating_duration_since(last) > Duration::from_secs(1) {
            let avg_ms = self.total_frametime.as_secs_f64() * 1000.0 / self.count as f64;
            log::debug!("{} fps, {avg_ms:.2}ms avg per frame", self.count);
            self.last_report = Some(now);
            self.count = 0;
            self.total_frametime = Duration::ZERO;
        }
    }

    /// Marks the end of the CPU work of the current frame.
    pub fn frame_end(&mut self) {
        if let Some(start) = self.frame_start.take() {
            self.total_frametime += start.elapsed();
        }
    }

    /// Time between the two most recent `frame` calls.
    pub fn delta(&self) -> Duration {
        self.delta
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
