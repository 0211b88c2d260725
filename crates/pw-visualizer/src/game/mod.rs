//! Match state: the query surface the renderer reads each turn, and the
//! match-log implementation of it.

mod arc;
mod match_log;
mod types;

pub use arc::ArcPath;
pub use match_log::{MatchLog, COLORS};
pub use types::{Expedition, Planet, State};

use crate::error::VisualizerResult;

/// Floats per ship transform pair (current 3x3 + next 3x3, column-major).
pub const TRANSFORM_PAIR: usize = 18;

/// Turn-indexed view of a match.
///
/// Per-turn arrays are refreshed by `update_turn`; until the first call they
/// are empty.
pub trait StateSource {
    /// `[x, y, w, h]` covering every planet with a margin.
    fn viewbox(&self) -> [f32; 4];

    /// Flat `[x, y, r]` per planet.
    fn planets(&self) -> &[f32];

    fn planet_name(&self, index: usize) -> Option<&str>;

    /// Six floats per planet: rgb now, rgb at the next turn.
    fn planet_colours(&self) -> &[f32];

    fn planet_ships(&self) -> &[u64];

    /// `TRANSFORM_PAIR` floats per ship.
    fn ship_locations(&self) -> &[f32];

    /// `TRANSFORM_PAIR` floats per ship label.
    fn ship_label_locations(&self) -> &[f32];

    /// Three floats per ship.
    fn ship_colours(&self) -> &[f32];

    fn ship_counts(&self) -> &[u64];

    fn turn_count(&self) -> usize;

    /// Selects a turn, clamped to the known range; returns the applied turn.
    fn update_turn(&mut self, turn: usize) -> usize;

    /// Appends one serialized state.
    fn push_state(&mut self, state: &str) -> VisualizerResult<()>;

    /// Largest number of ships in flight at any known turn.
    fn max_ships(&self) -> usize;
}
