use pw_engine::coords::ColorRgba;

/// Frame-time budget for the Voronoi background.
///
/// Every frame moves a counter toward `counter_limit` when the frame was
/// within budget and toward `-counter_limit` otherwise; once it drops below
/// `disable_below` the background is turned off for the rest of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfConfig {
    pub frame_budget_ms: f64,
    pub counter_limit: i32,
    pub disable_below: i32,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            frame_budget_ms: 30.0,
            counter_limit: 3,
            disable_below: -2,
        }
    }
}

/// Session settings.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizerConfig {
    /// Wall-clock duration of one turn.
    pub ms_per_turn: f64,
    /// Widen the viewbox so world units stay square on screen.
    pub keep_aspect_ratio: bool,
    pub clear_color: ColorRgba,
    pub perf: PerfConfig,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            ms_per_turn: 500.0,
            keep_aspect_ratio: true,
            clear_color: ColorRgba::black(),
            perf: PerfConfig::default(),
        }
    }
}
