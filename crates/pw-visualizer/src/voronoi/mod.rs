//! Rounded Voronoi territory mesh.
//!
//! Each planet owns the part of the view closer to it than to any other
//! planet. Cells are computed by half-plane clipping, near-degenerate corners
//! are merged and every boundary point is pulled toward its site so the cells
//! render as soft blobs.

mod builder;
mod tessellate;

pub use builder::{build_mesh, VoronoiBuilder, VoronoiMesh, VORONOI_STRIDE};
pub use tessellate::{tessellate, Cell, Edge};
