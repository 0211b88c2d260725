//! Planet Wars match visualizer.
//!
//! Turns a sequence of match states into layered renderables: a rounded
//! Voronoi territory background, planet sprites, ships travelling along arcs
//! and text labels, animated between turns on a wall-clock cadence.

pub mod assets;
pub mod config;
pub mod error;
pub mod game;
pub mod instance;
pub mod resizer;
pub mod text;
pub mod util;
pub mod voronoi;

pub use config::{PerfConfig, VisualizerConfig};
pub use error::{VisualizerError, VisualizerResult};
pub use game::{MatchLog, StateSource};
pub use instance::GameInstance;
pub use resizer::Resizer;
