//! Text labels.
//!
//! A label owns one renderable holding a quad per visible glyph. Two font
//! backends exist: multi-channel signed distance field atlases (crisp at any
//! zoom) and plain bitmap glyph grids.

mod bitmap;
mod msdf;

use std::cell::RefCell;
use std::rc::Rc;

use pw_engine::render::{IndexBuffer, Renderable, Shader, Texture, Uniform, Uniforms, VertexArray, VertexBuffer, VertexLayout};

pub use bitmap::{BitmapFont, BitmapLabel, BitmapLabelFactory};
pub use msdf::{MsdfAtlas, MsdfBounds, MsdfFont, MsdfGlyph, MsdfLabel, MsdfLabelFactory};

pub const IDENTITY: [f32; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// Anchor position along one axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Align {
    Begin,
    End,
    Middle,
}

/// A text object that can be re-laid out in place.
pub trait Label {
    fn set_text(&mut self, text: &str, h_align: Align, v_align: Align);

    fn renderable(&self) -> Rc<RefCell<Renderable>>;
}

/// Creates labels sharing a font, shader and atlas texture.
pub trait LabelFactory {
    /// `transform` seeds `u_trans` and `u_trans_next` (identity when `None`).
    fn build(&self, transform: Option<[f32; 9]>) -> Box<dyn Label>;
}

/// Glyph quads for one line of text, in font units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphMesh {
    pub positions: Vec<f32>,
    pub texcoords: Vec<f32>,
    pub indices: Vec<u32>,
    /// Total horizontal advance of the line.
    pub advance: f32,
}

impl GlyphMesh {
    /// Appends a quad given as top-left/bottom-right corners in position and
    /// texture space.
    pub(crate) fn push_quad(&mut self, pos: [f32; 4], tex: [f32; 4]) {
        let [x0, y0, x1, y1] = pos;
        let [u0, v0, u1, v1] = tex;
        let base = (self.positions.len() / 2) as u32;

        self.positions.extend_from_slice(&[x0, y0, x1, y0, x0, y1, x1, y1]);
        self.texcoords.extend_from_slice(&[u0, v0, u1, v0, u0, v1, u1, v1]);
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base + 1, base + 2, base + 3]);
    }

    /// Shifts the finished line so the anchor sits at its start, middle or end.
    pub(crate) fn align_horizontal(&mut self, h_align: Align) {
        let shift = match h_align {
            Align::Begin => 0.0,
            Align::Middle => self.advance / 2.0,
            Align::End => self.advance,
        };
        if shift != 0.0 {
            for x in self.positions.iter_mut().step_by(2) {
                *x -= shift;
            }
        }
    }

    pub fn quad_count(&self) -> usize {
        self.indices.len() / 6
    }
}

/// Renderable with the two-buffer glyph layout and the shared label uniforms.
pub(crate) fn label_renderable(
    shader: Rc<Shader>,
    texture: Rc<Texture>,
    transform: Option<[f32; 9]>,
    extra: Uniforms,
) -> Renderable {
    let mut pos_layout = VertexLayout::new();
    pos_layout.push_float(2, "a_position");
    let mut tex_layout = VertexLayout::new();
    tex_layout.push_float(2, "a_texcoord");

    let mut va = VertexArray::new();
    va.add_buffer(VertexBuffer::vertex(Vec::new()), pos_layout)
        .add_buffer(VertexBuffer::vertex(Vec::new()), tex_layout);

    let trans = transform.unwrap_or(IDENTITY);
    let mut uniforms = extra;
    uniforms.insert("u_trans".to_owned(), Uniform::Mat3(trans));
    uniforms.insert("u_trans_next".to_owned(), Uniform::Mat3(trans));

    Renderable::new(IndexBuffer::index(Vec::new()), va, shader, vec![texture], uniforms)
}

/// Writes a laid-out line into a label renderable.
pub(crate) fn upload_mesh(renderable: &RefCell<Renderable>, mesh: GlyphMesh) {
    let mut r = renderable.borrow_mut();
    r.update_vertex_buffer(0, mesh.positions);
    r.update_vertex_buffer(1, mesh.texcoords);
    r.update_index_buffer(mesh.indices);
}

/// Last laid-out text and alignment, to skip identical rebuilds.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct LayoutKey(Option<(String, Align, Align)>);

impl LayoutKey {
    /// Records the request; returns false when it matches the previous one.
    pub(crate) fn update(&mut self, text: &str, h: Align, v: Align) -> bool {
        if let Some((t, lh, lv)) = &self.0 {
            if t == text && *lh == h && *lv == v {
                return false;
            }
        }
        self.0 = Some((text.to_owned(), h, v));
        true
    }
}
