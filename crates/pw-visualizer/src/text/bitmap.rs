use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use pw_engine::render::{Renderable, Shader, Texture, Uniform, Uniforms};
use pw_engine::text::{GlyphAtlas, GlyphCell};

use super::{label_renderable, upload_mesh, Align, GlyphMesh, Label, LabelFactory, LayoutKey};

/// Characters of the built-in 8x8 grid font, in atlas order.
const GRID_CHARS: &str = "abcdefghijklmnopqrstuvwxyz0123456789-*!?";
const GRID_CELL: u32 = 8;
const GRID_COLUMNS: u32 = 8;

/// Fixed-height bitmap font: every glyph is `letter_height` pixels tall.
#[derive(Debug, Clone, PartialEq)]
pub struct BitmapFont {
    pub letter_height: u32,
    pub space_width: u32,
    /// Extra pixels between glyphs (may be negative).
    pub spacing: i32,
    pub texture_width: u32,
    pub texture_height: u32,
    pub glyphs: HashMap<char, GlyphCell>,
}

impl BitmapFont {
    /// The 8x8 grid layout: a-z, 0-9 and `-*!?`, eight cells per row.
    pub fn default_grid() -> Self {
        let glyphs = GRID_CHARS
            .chars()
            .enumerate()
            .map(|(i, ch)| {
                let i = i as u32;
                let cell = GlyphCell {
                    x: (i % GRID_COLUMNS) * GRID_CELL,
                    y: (i / GRID_COLUMNS) * GRID_CELL,
                    width: GRID_CELL,
                };
                (ch, cell)
            })
            .collect();

        Self {
            letter_height: GRID_CELL,
            space_width: GRID_CELL,
            spacing: -1,
            texture_width: GRID_CELL * GRID_COLUMNS,
            texture_height: GRID_CELL * 5,
            glyphs,
        }
    }

    /// Metrics of a rasterized atlas.
    pub fn from_atlas(atlas: &GlyphAtlas) -> Self {
        Self {
            letter_height: atlas.letter_height,
            space_width: atlas.space_width,
            spacing: 0,
            texture_width: atlas.width,
            texture_height: atlas.height,
            glyphs: atlas.cells.clone(),
        }
    }

    /// Lays out one line, one unit per letter height. Unknown characters
    /// advance by the space width.
    pub fn layout(&self, text: &str, h_align: Align, v_align: Align) -> GlyphMesh {
        let y_start = match v_align {
            Align::Begin => 0.0,
            Align::End => 1.0,
            Align::Middle => 0.5,
        };

        let lh = self.letter_height.max(1) as f32;
        let (tw, th) = (self.texture_width.max(1) as f32, self.texture_height.max(1) as f32);
        let spacing = self.spacing as f32 / lh;

        let mut mesh = GlyphMesh::default();
        let mut x = 0.0;

        for ch in text.chars() {
            let Some(cell) = self.glyphs.get(&ch) else {
                if ch != ' ' {
                    log::warn!("bitmap font has no glyph for {ch:?}");
                }
                x += self.space_width as f32 / lh;
                continue;
            };

            let dx = cell.width as f32 / lh;
            let (u0, v0) = (cell.x as f32 / tw, cell.y as f32 / th);
            mesh.push_quad(
                [x, y_start, x + dx, y_start - 1.0],
                [u0, v0, u0 + cell.width as f32 / tw, v0 + lh / th],
            );
            x += dx + spacing;
        }

        mesh.advance = x;
        mesh.align_horizontal(h_align);
        mesh
    }
}

/// Bitmap text label; the atlas is sampled with nearest filtering.
pub struct BitmapLabel {
    font: Rc<BitmapFont>,
    renderable: Rc<RefCell<Renderable>>,
    key: LayoutKey,
}

impl BitmapLabel {
    pub fn new(font: Rc<BitmapFont>, shader: Rc<Shader>, texture: Rc<Texture>, transform: Option<[f32; 9]>) -> Self {
        let mut uniforms = Uniforms::new();
        uniforms.insert("u_fg_color".to_owned(), Uniform::Vec4([1.0, 1.0, 1.0, 1.0]));

        let renderable = label_renderable(shader, texture, transform, uniforms);
        Self {
            font,
            renderable: Rc::new(RefCell::new(renderable)),
            key: LayoutKey::default(),
        }
    }
}

impl Label for BitmapLabel {
    fn set_text(&mut self, text: &str, h_align: Align, v_align: Align) {
        if !self.key.update(text, h_align, v_align) {
            return;
        }
        upload_mesh(&self.renderable, self.font.layout(text, h_align, v_align));
    }

    fn renderable(&self) -> Rc<RefCell<Renderable>> {
        Rc::clone(&self.renderable)
    }
}

pub struct BitmapLabelFactory {
    font: Rc<BitmapFont>,
    shader: Rc<Shader>,
    texture: Rc<Texture>,
}

impl BitmapLabelFactory {
    pub fn new(font: Rc<BitmapFont>, shader: Rc<Shader>, texture: Rc<Texture>) -> Self {
        Self { font, shader, texture }
    }
}

impl LabelFactory for BitmapLabelFactory {
    fn build(&self, transform: Option<[f32; 9]>) -> Box<dyn Label> {
        Box::new(BitmapLabel::new(
            Rc::clone(&self.font),
            Rc::clone(&self.shader),
            Rc::clone(&self.texture),
            transform,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_font() -> BitmapFont {
        let glyphs = [('a', 0), ('b', 10)]
            .into_iter()
            .map(|(ch, x)| (ch, GlyphCell { x, y: 0, width: 10 }))
            .collect();
        BitmapFont {
            letter_height: 10,
            space_width: 5,
            spacing: 0,
            texture_width: 20,
            texture_height: 10,
            glyphs,
        }
    }

    fn quad_left_edges(mesh: &GlyphMesh) -> Vec<f32> {
        mesh.positions.chunks_exact(8).map(|q| q[0]).collect()
    }

    // ── grid font ─────────────────────────────────────────────────────────

    #[test]
    fn grid_places_cells_row_major() {
        let font = BitmapFont::default_grid();
        assert_eq!(font.glyphs.len(), 40);
        assert_eq!(font.glyphs[&'a'], GlyphCell { x: 0, y: 0, width: 8 });
        assert_eq!(font.glyphs[&'i'], GlyphCell { x: 0, y: 8, width: 8 });
        assert_eq!(font.glyphs[&'0'], GlyphCell { x: 16, y: 24, width: 8 });
        assert_eq!(font.glyphs[&'?'], GlyphCell { x: 56, y: 32, width: 8 });
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn begin_aligned_quads_follow_advances() {
        let mesh = unit_font().layout("ab", Align::Begin, Align::Begin);
        assert_eq!(quad_left_edges(&mesh), vec![0.0, 1.0]);
        assert_eq!(mesh.advance, 2.0);
    }

    #[test]
    fn end_alignment_shifts_by_full_advance() {
        let mesh = unit_font().layout("ab", Align::End, Align::Begin);
        assert_eq!(quad_left_edges(&mesh), vec![-2.0, -1.0]);
    }

    #[test]
    fn vertical_alignment_picks_top_edge() {
        let top = |v| unit_font().layout("a", Align::Begin, v).positions[1];
        assert_eq!(top(Align::Begin), 0.0);
        assert_eq!(top(Align::Middle), 0.5);
        assert_eq!(top(Align::End), 1.0);
    }

    #[test]
    fn unknown_glyphs_advance_by_space() {
        let mesh = unit_font().layout("a?b", Align::Begin, Align::Begin);
        assert_eq!(quad_left_edges(&mesh), vec![0.0, 1.5]);
    }

    #[test]
    fn texcoords_cover_the_cell() {
        let mesh = unit_font().layout("b", Align::Begin, Align::Begin);
        assert_eq!(mesh.texcoords, vec![0.5, 0.0, 1.0, 0.0, 0.5, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn negative_spacing_tightens_grid_text() {
        let font = BitmapFont::default_grid();
        let mesh = font.layout("ab", Align::Begin, Align::Begin);
        assert_eq!(quad_left_edges(&mesh), vec![0.0, 0.875]);
    }
}
