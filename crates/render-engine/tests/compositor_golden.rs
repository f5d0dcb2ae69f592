use image::{Rgba, RgbaImage};
use memeforge_meme_model::raster::{ExportFormat, ImageMime, SourceImage};
use memeforge_meme_model::state::MemeState;
use memeforge_meme_model::style::{CaptionFont, CaptionStyle, StylePreset};
use memeforge_render_engine::compositor::{composite, composite_state, layout_caption, CompositeOptions};
use memeforge_render_engine::text::{BitmapTypeface, FontBook};

fn gradient(width: u32, height: u32) -> SourceImage {
    let pixels = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 255 / width) as u8, (y * 255 / height) as u8, 96, 255])
    });
    SourceImage::new(pixels, ImageMime::Png).expect("gradient is non-empty")
}

fn fnv1a_64(input: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in input {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[test]
fn wrapped_caption_layout_signature_is_stable() {
    let style = CaptionStyle::default().with_font(CaptionFont::Arial).with_size(16);
    let layout = layout_caption(
        &BitmapTypeface,
        "When you fix one bug and three more appear out of nowhere",
        &style,
        320,
        240,
        80,
    );

    let signature = layout
        .lines
        .iter()
        .zip(&layout.origins)
        .map(|(line, (left, top))| format!("{line}|{left:.1}|{top:.1}"))
        .collect::<Vec<_>>()
        .join("\n");

    assert_eq!(
        signature,
        "When you fix one bug and|17.0|172.8\n\
         three more appear out of|17.0|192.0\n\
         nowhere|119.0|211.2"
    );
    assert_eq!(fnv1a_64(signature.as_bytes()), 0x28ab2691a734ac94);
}

#[test]
fn identical_inputs_produce_identical_png_bytes() {
    let fonts = FontBook::builtin();
    let source = gradient(240, 180);
    let options = CompositeOptions::default();

    for preset in memeforge_meme_model::style::STYLE_PRESETS {
        let style = preset.style();
        let first = composite(&source, Some("Deterministic output"), &style, &options, &fonts)
            .encode(ExportFormat::Png)
            .expect("png encode");
        let second = composite(&source, Some("Deterministic output"), &style, &options, &fonts)
            .encode(ExportFormat::Png)
            .expect("png encode");

        assert_eq!(
            fnv1a_64(&first.bytes),
            fnv1a_64(&second.bytes),
            "preset {} rendered differently",
            preset.name
        );
        assert_eq!(first, second);
    }
}

#[test]
fn preset_state_renders_same_as_explicit_style() {
    let fonts = FontBook::builtin();
    let options = CompositeOptions::default();
    let preset = StylePreset::find("Tech Vibe").expect("preset exists");

    let state = MemeState::new()
        .with_source(gradient(200, 200))
        .generate_captions()
        .apply_preset(preset);
    let caption = state.active_caption().map(str::to_string);

    let from_state = composite_state(&state, &options, &fonts).expect("state has a source");
    let direct = composite(
        &gradient(200, 200),
        caption.as_deref(),
        &preset.style(),
        &options,
        &fonts,
    );

    assert_eq!(from_state, direct);
    assert_eq!((from_state.width(), from_state.height()), (200, 200));
}
