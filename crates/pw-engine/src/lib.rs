//! Planet Wars engine crate.
//!
//! Owns the platform + GPU runtime pieces used by the visualizer: window loop,
//! input translation, frame timing, and a small retained rendering layer
//! (buffers, vertex layouts, shaders with reflected uniforms, textures and a
//! layered renderer).

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod render;
pub mod text;
