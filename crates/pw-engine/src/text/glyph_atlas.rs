use std::collections::HashMap;
use std::fmt;

/// Error returned when font bytes cannot be parsed.
#[derive(Debug, Clone)]
pub struct FontLoadError(pub String);

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "font load error: {}", self.0)
    }
}

impl std::error::Error for FontLoadError {}

/// Horizontal extent of one glyph cell; every cell is `letter_height` tall.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GlyphCell {
    pub x: u32,
    pub y: u32,
    pub width: u32,
}

/// Padding between cells so linear sampling never bleeds.
const CELL_GAP: u32 = 1;
const MAX_ATLAS_WIDTH: u32 = 1024;

/// A fixed-height glyph strip atlas: one cell per character, glyphs sitting on
/// a shared baseline, coverage stored as 8-bit alpha.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    pub width: u32,
    pub height: u32,
    pub letter_height: u32,
    pub space_width: u32,
    pub cells: HashMap<char, GlyphCell>,
    coverage: Vec<u8>,
}

impl GlyphAtlas {
    /// Parses a TrueType/OpenType font and rasterizes `chars` at `px`.
    pub fn rasterize(font_bytes: &[u8], px: f32, chars: &str) -> Result<Self, FontLoadError> {
        let font = fontdue::Font::from_bytes(font_bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        Ok(Self::from_font(&font, px, chars))
    }

    pub fn from_font(font: &fontdue::Font, px: f32, chars: &str) -> Self {
        let (ascent, descent) = font
            .horizontal_line_metrics(px)
            .map_or((px, 0.0), |m| (m.ascent, m.descent));
        let letter_height = (ascent - descent).ceil().max(1.0) as u32;
        let baseline = ascent.ceil() as i32;

        let space_width = font.metrics(' ', px).advance_width.ceil().max(1.0) as u32;

        let mut glyphs = Vec::new();
        for ch in chars.chars().filter(|c| !c.is_whitespace()) {
            if glyphs.iter().any(|(c, _, _)| *c == ch) {
                continue;
            }
            let (metrics, bitmap) = font.rasterize(ch, px);
            let width = (metrics.advance_width.ceil() as i32)
                .max(metrics.xmin.max(0) + metrics.width as i32)
                .max(1) as u32;
            glyphs.push((ch, width, (metrics, bitmap)));
        }

        let widths: Vec<(char, u32)> = glyphs.iter().map(|(c, w, _)| (*c, *w)).collect();
        let (cells, width, height) = pack_cells(&widths, letter_height, MAX_ATLAS_WIDTH);

        let mut coverage = vec![0u8; (width * height) as usize];
        for (ch, _, (metrics, bitmap)) in &glyphs {
            let Some(cell) = cells.get(ch) else { continue };
            let left = cell.x as i32 + metrics.xmin.max(0);
            let top = cell.y as i32 + baseline - (metrics.ymin + metrics.height as i32);
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let (x, y) = (left + col as i32, top + row as i32);
                    let inside_cell = y >= cell.y as i32 && y < (cell.y + letter_height) as i32;
                    if x < 0 || x >= width as i32 || !inside_cell {
                        continue;
                    }
                    coverage[(y as u32 * width + x as u32) as usize] = bitmap[row * metrics.width + col];
                }
            }
        }

        log::debug!("glyph atlas {width}x{height}, {} glyphs at {px}px", cells.len());

        Self { width, height, letter_height, space_width, cells, coverage }
    }

    pub fn cell(&self, ch: char) -> Option<&GlyphCell> {
        self.cells.get(&ch)
    }

    /// White glyphs with coverage in alpha.
    pub fn to_rgba(&self) -> image::RgbaImage {
        let mut img = image::RgbaImage::new(self.width, self.height);
        for (px, &a) in img.pixels_mut().zip(&self.coverage) {
            *px = image::Rgba([255, 255, 255, a]);
        }
        img
    }
}

/// Packs fixed-height cells left to right, wrapping rows at `max_width`.
///
/// Returns the cell positions and the atlas size.
pub(crate) fn pack_cells(
    widths: &[(char, u32)],
    letter_height: u32,
    max_width: u32,
) -> (HashMap<char, GlyphCell>, u32, u32) {
    let mut cells = HashMap::with_capacity(widths.len());
    let (mut x, mut y) = (CELL_GAP, CELL_GAP);
    let mut used_width = 1;

    for &(ch, width) in widths {
        if x + width + CELL_GAP > max_width && x > CELL_GAP {
            x = CELL_GAP;
            y += letter_height + CELL_GAP;
        }
        cells.insert(ch, GlyphCell { x, y, width });
        x += width + CELL_GAP;
        used_width = used_width.max(x);
    }

    (cells, used_width, y + letter_height + CELL_GAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── packing ───────────────────────────────────────────────────────────

    #[test]
    fn cells_pack_left_to_right() {
        let (cells, w, h) = pack_cells(&[('a', 5), ('b', 7)], 10, 64);
        assert_eq!(cells[&'a'], GlyphCell { x: 1, y: 1, width: 5 });
        assert_eq!(cells[&'b'], GlyphCell { x: 7, y: 1, width: 7 });
        assert_eq!((w, h), (15, 12));
    }

    #[test]
    fn cells_wrap_at_max_width() {
        let (cells, _, h) = pack_cells(&[('a', 10), ('b', 10), ('c', 10)], 8, 20);
        assert_eq!(cells[&'a'].y, 1);
        assert_eq!(cells[&'b'].y, 10);
        assert_eq!(cells[&'b'].x, 1);
        assert_eq!(cells[&'c'].y, 19);
        assert_eq!(h, 28);
    }

    #[test]
    fn oversized_cell_still_gets_a_row() {
        let (cells, w, _) = pack_cells(&[('w', 40)], 8, 16);
        assert_eq!(cells[&'w'].x, 1);
        assert_eq!(w, 42);
    }

    // ── loading ───────────────────────────────────────────────────────────

    #[test]
    fn garbage_font_bytes_fail() {
        let err = GlyphAtlas::rasterize(&[0, 1, 2, 3], 16.0, "abc").unwrap_err();
        assert!(err.to_string().starts_with("font load error"));
    }
}
