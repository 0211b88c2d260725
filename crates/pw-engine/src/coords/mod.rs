//! Coordinate and geometry types shared by the renderer and the visualizer.
//!
//! World space:
//! - game units, +X right, +Y up
//! - the vertex shaders map a world rectangle (the viewbox) onto clip space
//!
//! Pixel space (pointer input, viewport) is logical pixels, origin top-left.

mod color;
mod rect;
mod vec2;
mod viewport;

pub use color::ColorRgba;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
