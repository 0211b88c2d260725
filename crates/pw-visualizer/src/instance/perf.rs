use crate::config::PerfConfig;

/// Hysteresis counter that turns an expensive effect off for good once
/// frames keep missing their budget. Starts at the top of its range.
#[derive(Debug, Clone)]
pub struct PerfThrottle {
    config: PerfConfig,
    counter: i32,
    tripped: bool,
}

impl PerfThrottle {
    pub fn new(config: PerfConfig) -> Self {
        let counter = config.counter_limit;
        Self { config, counter, tripped: false }
    }

    /// Records one frame; returns true on the frame that trips the throttle.
    pub fn record(&mut self, frame_ms: f64) -> bool {
        let limit = self.config.counter_limit;
        self.counter = if frame_ms < self.config.frame_budget_ms {
            (self.counter + 1).min(limit)
        } else {
            (self.counter - 1).max(-limit)
        };

        if !self.tripped && self.counter < self.config.disable_below {
            self.tripped = true;
            return true;
        }
        false
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }
}
