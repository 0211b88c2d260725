//! Shader sources, sprites and fonts.
//!
//! Files are read once at start-up from an asset directory:
//!
//! | file                         | content                                   |
//! |------------------------------|-------------------------------------------|
//! | `planets.png`, `planets.json`| planet sprite atlas and its `{x,y,w,h}` list |
//! | `ship.png`                   | ship coverage mask, nose pointing up      |
//! | `font.json`, `font.png`      | msdf-atlas-gen layout and atlas           |
//! | `font.ttf` / `font.otf`      | outline font, rasterized into a bitmap atlas |
//! | `grid_font.png`              | 64x40 grid of 8x8 glyphs                  |
//!
//! Missing sprites are generated; a missing font is an error unless a
//! system font can be found.

use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::{Rgba, RgbaImage};
use pw_engine::render::{FilterMode, ShaderFactory, Texture};
use pw_engine::text::GlyphAtlas;
use serde::Deserialize;

use crate::error::{VisualizerError, VisualizerResult};
use crate::text::{BitmapFont, MsdfFont};
use crate::util::cyrb53;

const SPRITE_VERT: &str = include_str!("../shaders/sprite.vert.wgsl");
const MASKED_IMAGE_FRAG: &str = include_str!("../shaders/masked_image.frag.wgsl");
const MSDF_FRAG: &str = include_str!("../shaders/msdf.frag.wgsl");
const BITMAP_FRAG: &str = include_str!("../shaders/bitmap.frag.wgsl");
const VOR_VERT: &str = include_str!("../shaders/vor.vert.wgsl");
const VOR_FRAG: &str = include_str!("../shaders/vor.frag.wgsl");

/// Pixel size outline fonts are rasterized at.
const RASTER_PX: f32 = 48.0;

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Vertex + fragment pairs for every shader the visualizer compiles.
///
/// `vor` expects `$COLOUR_SLOTS` (two per planet).
#[derive(Debug, Clone)]
pub struct ShaderLibrary {
    pub masked_image: ShaderFactory,
    pub vor: ShaderFactory,
    pub msdf: ShaderFactory,
    pub bitmap: ShaderFactory,
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self {
            masked_image: ShaderFactory::new(SPRITE_VERT, MASKED_IMAGE_FRAG),
            vor: ShaderFactory::new(VOR_VERT, VOR_FRAG),
            msdf: ShaderFactory::new(SPRITE_VERT, MSDF_FRAG),
            bitmap: ShaderFactory::new(SPRITE_VERT, BITMAP_FRAG),
        }
    }
}

/// Pixel rectangle of one sprite inside an atlas.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct SpriteRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

pub struct PlanetAtlas {
    pub texture: Rc<Texture>,
    pub sprites: Vec<SpriteRect>,
}

impl PlanetAtlas {
    pub fn load(image: &Path, layout: &Path) -> VisualizerResult<Self> {
        let sprites: Vec<SpriteRect> = serde_json::from_str(&std::fs::read_to_string(layout)?)?;
        if sprites.is_empty() {
            return Err(VisualizerError::MissingAsset(format!("{}: no sprites", layout.display())));
        }
        let pixels = image::open(image)?.to_rgba8();
        Ok(Self { texture: Rc::new(Texture::from_image("planet_atlas", pixels)), sprites })
    }

    /// Four shaded discs with different banding, side by side.
    pub fn procedural() -> Self {
        const SIZE: u32 = 64;
        const VARIANTS: u32 = 4;

        let img = RgbaImage::from_fn(SIZE * VARIANTS, SIZE, |px, py| {
            let variant = (px / SIZE) as f32;
            let (x, y) = (
                ((px % SIZE) as f32 + 0.5) / SIZE as f32 * 2.0 - 1.0,
                (py as f32 + 0.5) / SIZE as f32 * 2.0 - 1.0,
            );
            let d = (x * x + y * y).sqrt();
            let edge = ((1.0 - d) * SIZE as f32 / 2.0).clamp(0.0, 1.0);
            if edge <= 0.0 {
                return Rgba([0, 0, 0, 0]);
            }

            let z = (1.0 - d * d).max(0.0).sqrt();
            let light = (0.5 - 0.4 * x - 0.5 * y + 0.8 * z).clamp(0.2, 1.0);
            let bands = 0.85 + 0.15 * (y * (3.0 + 2.0 * variant) * PI + variant).sin();
            let v = (255.0 * light * bands).clamp(0.0, 255.0) as u8;
            Rgba([v, v, v, (255.0 * edge) as u8])
        });

        let sprites = (0..VARIANTS)
            .map(|i| SpriteRect { x: (i * SIZE) as f32, y: 0.0, w: SIZE as f32, h: SIZE as f32 })
            .collect();

        Self { texture: Rc::new(Texture::from_image("planet_atlas", img)), sprites }
    }

    /// Sprite for a planet, stable per name.
    pub fn sprite_for(&self, name: &str) -> SpriteRect {
        self.sprites[(cyrb53(name, 0) % self.sprites.len() as u64) as usize]
    }

    /// Quad texcoords (top-left, top-right, bottom-left, bottom-right),
    /// inset half a texel so neighbouring sprites never bleed in.
    pub fn texcoords(&self, rect: SpriteRect) -> [f32; 8] {
        let (w, h) = (self.texture.width() as f32, self.texture.height() as f32);
        let x0 = (rect.x + 0.5) / w;
        let x1 = (rect.x + rect.w - 0.5) / w;
        let y0 = (rect.y + 0.5) / h;
        let y1 = (rect.y + rect.h - 0.5) / h;
        [x0, y0, x1, y0, x0, y1, x1, y1]
    }
}

/// Upward arrow mask used when no ship sprite is available.
pub fn procedural_ship() -> Texture {
    const SIZE: u32 = 32;

    let img = RgbaImage::from_fn(SIZE, SIZE, |px, py| {
        let x = (px as f32 + 0.5) / SIZE as f32 - 0.5;
        let y = (py as f32 + 0.5) / SIZE as f32;
        // Nose at the top, notched tail.
        let half_width = 0.45 * y;
        let inside = x.abs() <= half_width && y >= 0.05 && y <= 0.95 - 0.3 * (x.abs() / 0.45);
        Rgba([255, 255, 255, if inside { 255 } else { 0 }])
    });

    Texture::from_image("ship", img)
}

/// Label font plus its atlas texture.
pub enum FontAsset {
    Msdf { font: Rc<MsdfFont>, texture: Rc<Texture> },
    Bitmap { font: Rc<BitmapFont>, texture: Rc<Texture> },
}

impl FontAsset {
    /// Loads by extension: `.json` (msdf layout next to a same-named
    /// `.png`), `.png` (8x8 grid font) or an outline font.
    pub fn load(path: &Path) -> VisualizerResult<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => {
                let font = MsdfFont::from_json(&std::fs::read_to_string(path)?)?;
                let pixels = image::open(path.with_extension("png"))?.to_rgba8();
                let texture = Texture::from_image("msdf_font", pixels).linear();
                Ok(FontAsset::Msdf { font: Rc::new(font), texture: Rc::new(texture) })
            }
            Some("png") => {
                let pixels = image::open(path)?.to_rgba8();
                let texture = Texture::from_image("grid_font", pixels).with_filter(FilterMode::Nearest);
                Ok(FontAsset::Bitmap { font: Rc::new(BitmapFont::default_grid()), texture: Rc::new(texture) })
            }
            _ => {
                let bytes = std::fs::read(path)?;
                let charset: String = (' '..='~').collect();
                let atlas = GlyphAtlas::rasterize(&bytes, RASTER_PX, &charset)?;
                let texture = Texture::from_image("raster_font", atlas.to_rgba());
                Ok(FontAsset::Bitmap { font: Rc::new(BitmapFont::from_atlas(&atlas)), texture: Rc::new(texture) })
            }
        }
    }

    /// Grid metrics over a blank texture; text lays out but draws nothing.
    pub fn blank_grid() -> Self {
        let font = BitmapFont::default_grid();
        let img = RgbaImage::new(font.texture_width, font.texture_height);
        let texture = Texture::from_image("grid_font", img).with_filter(FilterMode::Nearest);
        FontAsset::Bitmap { font: Rc::new(font), texture: Rc::new(texture) }
    }

    fn search(dir: Option<&Path>) -> VisualizerResult<Self> {
        let local = dir
            .into_iter()
            .flat_map(|d| ["font.json", "font.ttf", "font.otf", "grid_font.png"].map(|f| d.join(f)));
        let system = SYSTEM_FONTS.iter().map(PathBuf::from);

        for path in local.chain(system) {
            if path.is_file() {
                log::info!("using font {}", path.display());
                return Self::load(&path);
            }
        }

        Err(VisualizerError::MissingAsset(
            "no font found; put font.json/font.ttf in the asset directory or pass --font".to_owned(),
        ))
    }
}

/// Everything a `GameInstance` needs besides the match itself.
pub struct GameAssets {
    pub shaders: ShaderLibrary,
    pub planets: PlanetAtlas,
    pub ship: Rc<Texture>,
    pub font: FontAsset,
}

impl GameAssets {
    /// Loads from `dir` (when given), falling back to generated sprites.
    /// `font` overrides the font search.
    pub fn load(dir: Option<&Path>, font: Option<&Path>) -> VisualizerResult<Self> {
        let planets = match dir.map(|d| (d.join("planets.png"), d.join("planets.json"))) {
            Some((img, json)) if img.is_file() && json.is_file() => PlanetAtlas::load(&img, &json)?,
            _ => {
                log::info!("no planet atlas found, generating sprites");
                PlanetAtlas::procedural()
            }
        };

        let ship = match dir.map(|d| d.join("ship.png")) {
            Some(path) if path.is_file() => Texture::from_image("ship", image::open(&path)?.to_rgba8()),
            _ => {
                log::info!("no ship sprite found, generating one");
                procedural_ship()
            }
        };

        let font = match font {
            Some(path) => FontAsset::load(path)?,
            None => FontAsset::search(dir)?,
        };

        Ok(Self {
            shaders: ShaderLibrary::default(),
            planets,
            ship: Rc::new(ship),
            font,
        })
    }

    /// Generated sprites and a blank grid font; needs no files.
    pub fn procedural() -> Self {
        Self {
            shaders: ShaderLibrary::default(),
            planets: PlanetAtlas::procedural(),
            ship: Rc::new(procedural_ship()),
            font: FontAsset::blank_grid(),
        }
    }
}
