use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use pw_engine::render::{Renderable, Shader, Texture, Uniform, Uniforms};
use serde::Deserialize;

use super::{label_renderable, upload_mesh, Align, GlyphMesh, Label, LabelFactory, LayoutKey};
use crate::error::VisualizerResult;

/// `atlas` section of an msdf-atlas-gen layout file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsdfAtlas {
    #[serde(rename = "type")]
    pub kind: String,
    pub distance_range: f32,
    pub size: f32,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_y_origin")]
    pub y_origin: String,
}

fn default_y_origin() -> String {
    "bottom".to_owned()
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct MsdfBounds {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsdfGlyph {
    pub unicode: u32,
    pub advance: f32,
    pub plane_bounds: Option<MsdfBounds>,
    pub atlas_bounds: Option<MsdfBounds>,
}

#[derive(Deserialize)]
struct MsdfFile {
    atlas: MsdfAtlas,
    glyphs: Vec<MsdfGlyph>,
}

/// Glyph metrics of a distance field atlas, in em units.
#[derive(Debug, Clone)]
pub struct MsdfFont {
    pub atlas: MsdfAtlas,
    glyphs: HashMap<char, MsdfGlyph>,
}

impl MsdfFont {
    pub fn from_json(json: &str) -> VisualizerResult<Self> {
        let file: MsdfFile = serde_json::from_str(json)?;
        let glyphs = file
            .glyphs
            .into_iter()
            .filter_map(|g| char::from_u32(g.unicode).map(|c| (c, g)))
            .collect();
        Ok(Self { atlas: file.atlas, glyphs })
    }

    pub fn glyph(&self, ch: char) -> Option<&MsdfGlyph> {
        self.glyphs.get(&ch)
    }

    /// Lays out one line. The anchor sits at the origin before horizontal
    /// alignment; vertical alignment moves the baseline.
    pub fn layout(&self, text: &str, h_align: Align, v_align: Align) -> GlyphMesh {
        let y_pos = match v_align {
            Align::Begin => -1.0,
            Align::End => 0.0,
            Align::Middle => -0.5,
        };

        let (w, h) = (self.atlas.width as f32, self.atlas.height as f32);
        let flip = self.atlas.y_origin == "bottom";
        let v = |y: f32| if flip { 1.0 - y / h } else { y / h };

        let mut mesh = GlyphMesh::default();
        let mut x = 0.0;

        for ch in text.chars() {
            let Some(glyph) = self.glyph(ch) else {
                log::warn!("msdf font has no glyph for {ch:?}");
                x += self.glyph(' ').map_or(0.0, |g| g.advance);
                continue;
            };

            if let (Some(plane), Some(atlas)) = (glyph.plane_bounds, glyph.atlas_bounds) {
                mesh.push_quad(
                    [x + plane.left, y_pos + plane.top, x + plane.right, y_pos + plane.bottom],
                    [atlas.left / w, v(atlas.top), atlas.right / w, v(atlas.bottom)],
                );
            }

            x += glyph.advance;
        }

        mesh.advance = x;
        mesh.align_horizontal(h_align);
        mesh
    }
}

/// Distance-field text label.
pub struct MsdfLabel {
    font: Rc<MsdfFont>,
    renderable: Rc<RefCell<Renderable>>,
    key: LayoutKey,
}

impl MsdfLabel {
    pub fn new(font: Rc<MsdfFont>, shader: Rc<Shader>, texture: Rc<Texture>, transform: Option<[f32; 9]>) -> Self {
        let mut uniforms = Uniforms::new();
        uniforms.insert("u_fg_color".to_owned(), Uniform::Vec4([1.0, 1.0, 1.0, 1.0]));
        uniforms.insert("u_bg_color".to_owned(), Uniform::Vec4([0.0, 0.0, 0.0, 1.0]));
        uniforms.insert("u_distance_range".to_owned(), Uniform::Float(font.atlas.distance_range));
        uniforms.insert("u_glyph_size".to_owned(), Uniform::Float(font.atlas.size));

        let renderable = label_renderable(shader, texture, transform, uniforms);
        Self {
            font,
            renderable: Rc::new(RefCell::new(renderable)),
            key: LayoutKey::default(),
        }
    }
}

impl Label for MsdfLabel {
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

pub struct MsdfLabelFactory {
    font: Rc<MsdfFont>,
    shader: Rc<Shader>,
    texture: Rc<Texture>,
}

impl MsdfLabelFactory {
    pub fn new(font: Rc<MsdfFont>, shader: Rc<Shader>, texture: Rc<Texture>) -> Self {
        Self { font, shader, texture }
    }
}

impl LabelFactory for MsdfLabelFactory {
    fn build(&self, transform: Option<[f32; 9]>) -> Box<dyn Label> {
        Box::new(MsdfLabel::new(
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

    const FONT: &str = r#"{
        "atlas": { "type": "msdf", "distanceRange": 4, "size": 32, "width": 64, "height": 64, "yOrigin": "bottom" },
        "metrics": { "emSize": 1, "lineHeight": 1.2, "ascender": 0.9, "descender": -0.2 },
        "glyphs": [
            { "unicode": 32, "advance": 0.5 },
            { "unicode": 97, "advance": 1.0,
              "planeBounds": { "left": 0.0, "bottom": 0.0, "right": 1.0, "top": 1.0 },
              "atlasBounds": { "left": 0.0, "bottom": 0.0, "right": 32.0, "top": 32.0 } },
            { "unicode": 98, "advance": 1.0,
              "planeBounds": { "left": 0.0, "bottom": 0.0, "right": 1.0, "top": 1.0 },
              "atlasBounds": { "left": 32.0, "bottom": 0.0, "right": 64.0, "top": 32.0 } }
        ]
    }"#;

    fn font() -> MsdfFont {
        MsdfFont::from_json(FONT).expect("font parses")
    }

    fn quad_left_edges(mesh: &GlyphMesh) -> Vec<f32> {
        mesh.positions.chunks_exact(8).map(|q| q[0]).collect()
    }

    // ── parsing ───────────────────────────────────────────────────────────

    #[test]
    fn parses_atlas_header() {
        let font = font();
        assert_eq!(font.atlas.kind, "msdf");
        assert_eq!(font.atlas.distance_range, 4.0);
        assert!(font.glyph('a').is_some());
        assert!(font.glyph(' ').is_some_and(|g| g.plane_bounds.is_none()));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(MsdfFont::from_json("{ \"atlas\": 3 }").is_err());
    }

    // ── layout ────────────────────────────────────────────────────────────

    #[test]
    fn begin_aligned_quads_follow_advances() {
        let mesh = font().layout("ab", Align::Begin, Align::Begin);
        assert_eq!(mesh.quad_count(), 2);
        assert_eq!(quad_left_edges(&mesh), vec![0.0, 1.0]);
        assert_eq!(mesh.advance, 2.0);
    }

    #[test]
    fn end_alignment_shifts_by_full_advance() {
        let mesh = font().layout("ab", Align::End, Align::Begin);
        assert_eq!(quad_left_edges(&mesh), vec![-2.0, -1.0]);
    }

    #[test]
    fn vertical_alignment_moves_baseline() {
        let top_y = |v| font().layout("a", Align::Begin, v).positions[1];
        assert_eq!(top_y(Align::Begin), 0.0);
        assert_eq!(top_y(Align::Middle), 0.5);
        assert_eq!(top_y(Align::End), 1.0);
    }

    #[test]
    fn space_and_unknown_glyphs_only_advance() {
        let mesh = font().layout("a b\u{2603}a", Align::Begin, Align::Begin);
        assert_eq!(mesh.quad_count(), 3);
        assert_eq!(quad_left_edges(&mesh), vec![0.0, 1.5, 3.0]);
    }

    #[test]
    fn texcoords_flip_for_bottom_origin() {
        let mesh = font().layout("a", Align::Begin, Align::Begin);
        assert_eq!(&mesh.texcoords[..4], &[0.0, 0.5, 0.5, 0.5]);
        assert_eq!(&mesh.texcoords[4..], &[0.0, 1.0, 0.5, 1.0]);
    }

    // ── label ─────────────────────────────────────────────────────────────

    const SHADER: &str = r#"
@vertex
fn vs_main(@location(0) a_position: vec2<f32>, @location(1) a_texcoord: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(a_position + a_texcoord, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;

    #[test]
    fn label_carries_font_uniforms() {
        let shader = Rc::new(Shader::from_wgsl("msdf", SHADER.to_owned()).expect("compiles"));
        let factory = MsdfLabelFactory::new(Rc::new(font()), shader, Rc::new(Texture::placeholder("font")));
        let mut label = factory.build(None);
        label.set_text("ab", Align::Middle, Align::Middle);

        let r = label.renderable();
        let r = r.borrow();
        assert_eq!(r.uniforms().get("u_distance_range"), Some(&Uniform::Float(4.0)));
        assert_eq!(r.uniforms().get("u_glyph_size"), Some(&Uniform::Float(32.0)));
        assert_eq!(r.uniforms().get("u_trans"), Some(&Uniform::Mat3(super::super::IDENTITY)));
        assert_eq!(r.index_buffer().count(), 12);
        assert_eq!(r.vertex_array().buffers()[0].data()[0], -1.0);
    }
}
