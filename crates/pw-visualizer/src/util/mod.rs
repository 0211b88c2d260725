//! Geometry helpers and hashing.

mod geom;
mod hash;

pub use geom::{BBox, Point, PointKey};
pub use hash::cyrb53;
