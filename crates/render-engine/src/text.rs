//! Typefaces, text measurement, and greedy word wrap.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use image::{Pixel, Rgba, RgbaImage};
use memeforge_common::config::FontPaths;
use memeforge_common::error::{MemeError, MemeResult};
use memeforge_meme_model::style::CaptionFont;
use rusttype::{point, Font, Scale};

use crate::bitmap_font::{self, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};

/// A face that can measure and draw a single line of text.
pub trait Typeface: Send + Sync {
    /// Face name for logging.
    fn name(&self) -> &str;

    /// Horizontal extent of `text` at `px` pixels, in pixels.
    fn measure(&self, text: &str, px: f32) -> f32;

    /// Alpha-blend `text` onto `canvas` with its line box at
    /// `(left, top)` and height `px`.
    fn draw(&self, canvas: &mut RgbaImage, text: &str, left: f32, top: f32, px: f32, color: Rgba<u8>);
}

/// Blend `color` over the pixel at `(x, y)`, ignoring out-of-bounds writes.
pub(crate) fn blend_pixel(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    canvas.get_pixel_mut(x as u32, y as u32).blend(&color);
}

/// The built-in 5x7 face, scaled by whole pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitmapTypeface;

impl BitmapTypeface {
    /// Integer scale for a requested pixel size. One font row maps to
    /// `scale` canvas rows; a line box holds eight font rows.
    pub fn scale_for(px: f32) -> u32 {
        ((px / 8.0).round() as u32).max(1)
    }
}

impl Typeface for BitmapTypeface {
    fn name(&self) -> &str {
        "builtin-5x7"
    }

    fn measure(&self, text: &str, px: f32) -> f32 {
        let count = text.chars().count() as u64;
        if count == 0 {
            return 0.0;
        }
        let scale = Self::scale_for(px) as u64;
        ((count * GLYPH_ADVANCE as u64 - 1) * scale) as f32
    }

    fn draw(&self, canvas: &mut RgbaImage, text: &str, left: f32, top: f32, px: f32, color: Rgba<u8>) {
        let scale = Self::scale_for(px) as i64;
        let glyph_top = top + (px - (GLYPH_HEIGHT as i64 * scale) as f32) / 2.0;
        let origin_x = left.round() as i64;
        let origin_y = glyph_top.round() as i64;
        let (width, height) = (canvas.width() as i64, canvas.height() as i64);

        for (index, c) in text.chars().enumerate() {
            let cell_x = origin_x + index as i64 * GLYPH_ADVANCE as i64 * scale;
            if cell_x >= width {
                break;
            }
            let rows = bitmap_font::glyph(c);
            for row in 0..GLYPH_HEIGHT {
                for col in 0..GLYPH_WIDTH {
                    if !bitmap_font::is_set(&rows, col, row) {
                        continue;
                    }
                    // Only visit the part of each font pixel that lands on the canvas.
                    let x0 = cell_x + col as i64 * scale;
                    let y0 = origin_y + row as i64 * scale;
                    for y in y0.max(0)..(y0 + scale).min(height) {
                        for x in x0.max(0)..(x0 + scale).min(width) {
                            blend_pixel(canvas, x, y, color);
                        }
                    }
                }
            }
        }
    }
}

/// A TrueType/OpenType face rendered with `rusttype`.
pub struct TrueTypeFace {
    name: String,
    font: Font<'static>,
}

impl TrueTypeFace {
    /// Load a font file from disk.
    pub fn load(path: &Path) -> MemeResult<Self> {
        if !path.exists() {
            return Err(MemeError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let bytes = std::fs::read(path)?;
        let font = Font::try_from_vec(bytes).ok_or_else(|| {
            MemeError::render(format!("Not a usable font file: {}", path.display()))
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("truetype")
            .to_string();
        Ok(Self { name, font })
    }
}

impl Typeface for TrueTypeFace {
    fn name(&self) -> &str {
        &self.name
    }

    fn measure(&self, text: &str, px: f32) -> f32 {
        let scale = Scale::uniform(px);
        self.font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
    }

    fn draw(&self, canvas: &mut RgbaImage, text: &str, left: f32, top: f32, px: f32, color: Rgba<u8>) {
        let scale = Scale::uniform(px);
        let metrics = self.font.v_metrics(scale);
        let glyph_height = metrics.ascent - metrics.descent;
        let baseline = top + (px - glyph_height) / 2.0 + metrics.ascent;

        for glyph in self.font.layout(text, scale, point(left, baseline)) {
            let Some(bounds) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let alpha = (color[3] as f32 * coverage).round() as u8;
                if alpha == 0 {
                    return;
                }
                blend_pixel(
                    canvas,
                    bounds.min.x as i64 + gx as i64,
                    bounds.min.y as i64 + gy as i64,
                    Rgba([color[0], color[1], color[2], alpha]),
                );
            });
        }
    }
}

/// Double-strikes an inner face to fake a bold weight.
pub struct Emboldened(pub Arc<dyn Typeface>);

impl Emboldened {
    fn offset(px: f32) -> f32 {
        (px / 16.0).round().max(1.0)
    }
}

impl Typeface for Emboldened {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn measure(&self, text: &str, px: f32) -> f32 {
        let width = self.0.measure(text, px);
        if width == 0.0 {
            0.0
        } else {
            width + Self::offset(px)
        }
    }

    fn draw(&self, canvas: &mut RgbaImage, text: &str, left: f32, top: f32, px: f32, color: Rgba<u8>) {
        self.0.draw(canvas, text, left, top, px, color);
        self.0.draw(canvas, text, left + Self::offset(px), top, px, color);
    }
}

/// Resolves caption fonts to typefaces.
pub struct FontBook {
    faces: HashMap<CaptionFont, Arc<dyn Typeface>>,
    fallback: Arc<dyn Typeface>,
}

impl FontBook {
    /// Every font rendered with the built-in bitmap face.
    pub fn builtin() -> Self {
        let fallback: Arc<dyn Typeface> = Arc::new(BitmapTypeface);
        let faces = CaptionFont::ALL
            .iter()
            .map(|font| (*font, Self::styled(*font, fallback.clone())))
            .collect();
        Self { faces, fallback }
    }

    /// Load configured font files. Missing or broken files fall back to
    /// the built-in face with a warning.
    pub fn from_paths(paths: &FontPaths) -> Self {
        let mut book = Self::builtin();
        let configured = [
            (CaptionFont::Impact, paths.impact.as_deref()),
            (CaptionFont::Arial, paths.arial.as_deref()),
            (CaptionFont::Comic, paths.comic.as_deref()),
        ];

        for (font, path) in configured {
            let Some(path) = path else { continue };
            match TrueTypeFace::load(path) {
                Ok(face) => {
                    tracing::debug!(font = font.as_str(), path = %path.display(), "Loaded font");
                    let face: Arc<dyn Typeface> = Arc::new(face);
                    if font == CaptionFont::Arial {
                        book.fallback = face.clone();
                    }
                    book.faces.insert(font, Self::styled(font, face));
                }
                Err(e) => {
                    tracing::warn!(
                        font = font.as_str(),
                        path = %path.display(),
                        "Failed to load font, using built-in face: {e}"
                    );
                }
            }
        }
        book
    }

    fn styled(font: CaptionFont, face: Arc<dyn Typeface>) -> Arc<dyn Typeface> {
        if font.bold() {
            Arc::new(Emboldened(face))
        } else {
            face
        }
    }

    /// Face for a caption font.
    pub fn face(&self, font: CaptionFont) -> &dyn Typeface {
        self.faces
            .get(&font)
            .map(|f| f.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    /// Plain sans-serif face, used for the watermark.
    pub fn plain(&self) -> &dyn Typeface {
        self.fallback.as_ref()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Greedy word wrap so that every line measures at most `max_width`.
///
/// Words wider than a whole line are split between characters. A single
/// character wider than `max_width` still gets its own line.
pub fn wrap_lines(face: &dyn Typeface, text: &str, px: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if face.measure(word, px) > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for piece in split_word(face, word, px, max_width) {
                lines.push(piece);
            }
            // Let following words join the last fragment when they fit.
            if let Some(last) = lines.pop() {
                current = last;
            }
            continue;
        }

        if current.is_empty() {
            current = word.to_string();
            continue;
        }

        let candidate = format!("{current} {word}");
        if face.measure(&candidate, px) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_word(face: &dyn Typeface, word: &str, px: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        if current.chars().count() > 1 && face.measure(&current, px) > max_width {
            current.pop();
            pieces.push(std::mem::replace(&mut current, c.to_string()));
        }
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Largest size not above `px` (and not below `min_px`) at which `text`
/// fits in `max_width`.
pub fn fit_size(face: &dyn Typeface, text: &str, px: f32, min_px: f32, max_width: f32) -> f32 {
    let mut size = px;
    while size > min_px && face.measure(text, size) > max_width {
        size = (size - 1.0).max(min_px);
    }
    size
}

/// Largest size not above `px` (and not below `min_px`) at which every
/// single character of `text` fits in `max_width`.
///
/// Wrapping can break between any two characters, so at this size
/// [`wrap_lines`] keeps every line within `max_width`.
pub fn fit_glyphs(face: &dyn Typeface, text: &str, px: f32, min_px: f32, max_width: f32) -> f32 {
    let glyphs: BTreeSet<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    let mut buf = [0u8; 4];
    glyphs
        .into_iter()
        .map(|c| fit_size(face, c.encode_utf8(&mut buf), px, min_px, max_width))
        .fold(px, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bitmap_measure() {
        let face = BitmapTypeface;
        assert_eq!(face.measure("", 32.0), 0.0);
        // scale 4: one glyph is 5 columns wide
        assert_eq!(face.measure("A", 32.0), 20.0);
        assert_eq!(face.measure("AB", 32.0), 44.0);
        assert_eq!(face.measure("AB", 8.0), 11.0);
    }

    #[test]
    fn test_bitmap_draw_marks_pixels_in_color() {
        let mut canvas = RgbaImage::from_pixel(20, 12, Rgba([0, 0, 0, 255]));
        BitmapTypeface.draw(&mut canvas, "I", 0.0, 0.0, 8.0, Rgba([255, 0, 0, 255]));
        // 7 glyph rows centered in an 8px line box start at y = 1
        let lit: Vec<u32> = (0..5)
            .filter(|x| canvas.get_pixel(*x, 1)[0] == 255)
            .collect();
        assert_eq!(lit, vec![1, 2, 3]);
        assert!((0..20).all(|x| canvas.get_pixel(x, 0)[0] == 0));
        assert_eq!(canvas.get_pixel(10, 5), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_draw_clips_out_of_bounds() {
        let mut canvas = RgbaImage::new(4, 4);
        BitmapTypeface.draw(&mut canvas, "WIDE TEXT", -10.0, -3.0, 16.0, Rgba([255; 4]));
    }

    #[test]
    fn test_emboldened_is_wider() {
        let plain: Arc<dyn Typeface> = Arc::new(BitmapTypeface);
        let bold = Emboldened(plain.clone());
        assert_eq!(bold.measure("HI", 32.0), plain.measure("HI", 32.0) + 2.0);
        assert_eq!(bold.measure("", 32.0), 0.0);
    }

    #[test]
    fn test_builtin_book_styles_impact_bold() {
        let book = FontBook::builtin();
        let impact = book.face(CaptionFont::Impact).measure("X", 32.0);
        let arial = book.face(CaptionFont::Arial).measure("X", 32.0);
        assert!(impact > arial);
        assert_eq!(book.plain().measure("X", 32.0), arial);
    }

    #[test]
    fn test_missing_font_file_falls_back() {
        let paths = FontPaths {
            comic: Some("/definitely/not/here.ttf".into()),
            ..FontPaths::default()
        };
        let book = FontBook::from_paths(&paths);
        assert_eq!(book.face(CaptionFont::Comic).name(), "builtin-5x7");
    }

    #[test]
    fn test_wrap_greedy() {
        let face = BitmapTypeface;
        // at 8px each char advances 6px, so 5 chars = 29px
        let lines = wrap_lines(&face, "aaa bbb ccc ddd", 8.0, 45.0);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let face = BitmapTypeface;
        let lines = wrap_lines(&face, "abcdefghij xy", 8.0, 29.0);
        assert_eq!(lines, vec!["abcde", "fghij", "xy"]);
    }

    #[test]
    fn test_wrap_empty_text() {
        assert!(wrap_lines(&BitmapTypeface, "   ", 8.0, 100.0).is_empty());
    }

    #[test]
    fn test_fit_size_shrinks_until_it_fits() {
        let face = BitmapTypeface;
        let size = fit_size(&face, "HELLO", 32.0, 8.0, 60.0);
        assert!(face.measure("HELLO", size) <= 60.0);
        assert!(size < 32.0);
        assert_eq!(fit_size(&face, "HI", 32.0, 8.0, 500.0), 32.0);
        assert_eq!(fit_size(&face, "HELLO WORLD", 32.0, 8.0, 1.0), 8.0);
    }

    #[test]
    fn test_fit_glyphs_shrinks_to_widest_character() {
        let face = BitmapTypeface;
        // at 200px one glyph is 125px wide
        let px = fit_glyphs(&face, "wide words", 200.0, 8.0, 100.0);
        assert!(px < 200.0);
        assert!(face.measure("W", px) <= 100.0);
        assert_eq!(fit_glyphs(&face, "ok", 16.0, 8.0, 100.0), 16.0);
        assert_eq!(fit_glyphs(&face, "   ", 64.0, 8.0, 1.0), 64.0);
    }

    #[test]
    fn test_huge_sizes_measure_without_overflow() {
        let face = BitmapTypeface;
        let width = face.measure("HI THERE", u32::MAX as f32);
        assert!(width.is_finite() && width > 0.0);

        let mut canvas = RgbaImage::new(16, 16);
        face.draw(&mut canvas, "HI", 0.0, -1.0e6, 1.0e6, Rgba([255; 4]));
    }

    proptest! {
        #[test]
        fn wrapped_lines_never_exceed_width(
            words in proptest::collection::vec("[a-zA-Z0-9!?,.']{1,18}", 1..30),
            px in 8u32..600,
            width in 40u32..1200,
        ) {
            let book = FontBook::builtin();
            let face = book.face(CaptionFont::Impact);
            let text = words.join(" ");
            let max_width = width as f32;
            let px = fit_glyphs(face, &text, px as f32, 8.0, max_width);
            let lines = wrap_lines(face, &text, px, max_width);

            prop_assert!(!lines.is_empty());
            for line in &lines {
                prop_assert!(face.measure(line, px) <= max_width, "{line:?} too wide");
            }
            let rejoined: String = lines.concat().chars().filter(|c| !c.is_whitespace()).collect();
            let original: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            prop_assert_eq!(rejoined, original);
        }
    }
}
