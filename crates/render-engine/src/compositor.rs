//! Caption compositor: burns the caption band, caption text, and watermark
//! into a copy of the source image.
//!
//! Layout is computed separately from drawing ([`layout_caption`]) so the
//! geometry can be inspected without rasterizing anything.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, Blend};
use imageproc::rect::Rect;
use memeforge_common::config::RenderDefaults;
use memeforge_common::error::{MemeError, MemeResult};
use memeforge_meme_model::raster::{FlattenedImage, SourceImage};
use memeforge_meme_model::state::MemeState;
use memeforge_meme_model::style::{CaptionPosition, CaptionStyle};

use crate::text::{fit_glyphs, fit_size, wrap_lines, FontBook, Typeface};

/// Caption band height in pixels.
pub const BAND_HEIGHT: u32 = 80;
/// Band fill alpha (0.7 of full opacity).
pub const BAND_ALPHA: u8 = 178;
/// Captions longer than this many characters are word-wrapped.
pub const WRAP_THRESHOLD_CHARS: usize = 40;
/// Horizontal space reserved around caption lines.
pub const CAPTION_MARGIN: f32 = 20.0;
/// Line advance as a multiple of the pixel size.
pub const LINE_HEIGHT: f32 = 1.2;
/// Smallest size a caption is shrunk to.
pub const MIN_FONT_PX: f32 = 8.0;
pub const WATERMARK_PX: f32 = 12.0;
/// Watermark alpha (0.5 of full opacity).
pub const WATERMARK_ALPHA: u8 = 128;
pub const WATERMARK_PADDING: u32 = 8;

/// Knobs that are not part of the caption style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeOptions {
    /// Watermark text. `None` or empty skips the watermark.
    pub watermark: Option<String>,

    /// Requested band height, clamped to the image height.
    pub band_height: u32,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            watermark: Some(RenderDefaults::default().watermark),
            band_height: BAND_HEIGHT,
        }
    }
}

impl CompositeOptions {
    pub fn from_config(config: &RenderDefaults) -> Self {
        let watermark = Some(config.watermark.clone()).filter(|w| !w.trim().is_empty());
        Self {
            watermark,
            band_height: BAND_HEIGHT,
        }
    }

    pub fn without_watermark(self) -> Self {
        Self {
            watermark: None,
            ..self
        }
    }
}

/// Resolved geometry for one caption.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionLayout {
    /// First row of the band.
    pub band_top: u32,
    /// Band height after clamping.
    pub band_height: u32,
    /// Pixel size the text is drawn at.
    pub px: f32,
    /// Lines in drawing order, already case-transformed and quoted.
    pub lines: Vec<String>,
    /// Top-left of each line box.
    pub origins: Vec<(f32, f32)>,
}

/// Band placement for an image of `height` rows.
pub fn caption_band(height: u32, position: CaptionPosition, band_height: u32) -> (u32, u32) {
    let band = band_height.min(height);
    let top = match position {
        CaptionPosition::Top => 0,
        CaptionPosition::Center => (height - band) / 2,
        CaptionPosition::Bottom => height - band,
    };
    (top, band)
}

/// Lay out `caption` for a `width` x `height` image.
pub fn layout_caption(
    face: &dyn Typeface,
    caption: &str,
    style: &CaptionStyle,
    width: u32,
    height: u32,
    band_height: u32,
) -> CaptionLayout {
    let (band_top, band_height) = caption_band(height, style.position, band_height);
    let max_width = (width as f32 - CAPTION_MARGIN).max(1.0);
    // A line box never needs to be taller than the image.
    let size = style.size.clamp(1, height.max(1)) as f32;

    let text = caption.trim();
    let text = if style.font.uppercase() {
        text.to_uppercase()
    } else {
        text.to_string()
    };

    let (px, lines) = if text.is_empty() {
        (size, Vec::new())
    } else if text.chars().count() > WRAP_THRESHOLD_CHARS {
        let px = fit_glyphs(face, &text, size, MIN_FONT_PX.min(size), max_width);
        (px, wrap_lines(face, &text, px, max_width))
    } else {
        let quoted = format!("\"{text}\"");
        let px = fit_size(face, &quoted, size, MIN_FONT_PX.min(size), max_width);
        (px, vec![quoted])
    };

    let line_height = px * LINE_HEIGHT;
    let band_center = band_top as f32 + band_height as f32 / 2.0;
    let block_top = band_center - line_height * lines.len() as f32 / 2.0;

    let origins = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let center_y = block_top + line_height * (i as f32 + 0.5);
            let left = (width as f32 - face.measure(line, px)) / 2.0;
            (left, center_y - px / 2.0)
        })
        .collect();

    CaptionLayout {
        band_top,
        band_height,
        px,
        lines,
        origins,
    }
}

/// Composite a caption onto `source`. The output has the source's size.
pub fn composite(
    source: &SourceImage,
    caption: Option<&str>,
    style: &CaptionStyle,
    options: &CompositeOptions,
    fonts: &FontBook,
) -> FlattenedImage {
    let (width, height) = (source.width(), source.height());
    let face = fonts.face(style.font);
    let layout = layout_caption(
        face,
        caption.unwrap_or(""),
        style,
        width,
        height,
        options.band_height,
    );

    let mut canvas = Blend(source.pixels().clone());
    if layout.band_height > 0 {
        draw_filled_rect_mut(
            &mut canvas,
            Rect::at(0, layout.band_top as i32).of_size(width, layout.band_height),
            Rgba([0, 0, 0, BAND_ALPHA]),
        );
    }
    let mut canvas: RgbaImage = canvas.0;

    let [r, g, b] = style.color.rgb();
    let fill = Rgba([r, g, b, 255]);
    for (line, (left, top)) in layout.lines.iter().zip(&layout.origins) {
        face.draw(&mut canvas, line, *left, *top, layout.px, fill);
    }

    if let Some(mark) = options.watermark.as_deref().filter(|w| !w.is_empty()) {
        draw_watermark(&mut canvas, fonts.plain(), mark);
    }

    tracing::debug!(
        width,
        height,
        lines = layout.lines.len(),
        px = layout.px,
        face = face.name(),
        position = style.position.as_str(),
        "Caption composited"
    );

    FlattenedImage::from_canvas(canvas)
}

fn draw_watermark(canvas: &mut RgbaImage, face: &dyn Typeface, mark: &str) {
    let left = canvas.width() as f32 - WATERMARK_PADDING as f32 - face.measure(mark, WATERMARK_PX);
    let top = canvas.height() as f32 - WATERMARK_PADDING as f32 - WATERMARK_PX;
    face.draw(
        canvas,
        mark,
        left,
        top,
        WATERMARK_PX,
        Rgba([255, 255, 255, WATERMARK_ALPHA]),
    );
}

/// Composite the session's source with its active caption and style.
pub fn composite_state(
    state: &MemeState,
    options: &CompositeOptions,
    fonts: &FontBook,
) -> MemeResult<FlattenedImage> {
    let source = state
        .source()
        .ok_or_else(|| MemeError::render("No image has been uploaded"))?;
    Ok(composite(
        source,
        state.active_caption(),
        &state.style(),
        options,
        fonts,
    ))
}
