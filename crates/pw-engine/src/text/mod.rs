//! Font rasterization into bitmap glyph atlases.

mod glyph_atlas;

pub use glyph_atlas::{FontLoadError, GlyphAtlas, GlyphCell};
