//! List style presets.

use memeforge_meme_model::style::STYLE_PRESETS;

pub fn run() -> anyhow::Result<()> {
    println!("Style presets:");
    for preset in STYLE_PRESETS {
        println!(
            "  {:<16} {:<7} {:<7} {:>3}px {:<7} {}",
            preset.slug(),
            preset.font.as_str(),
            preset.color.as_str(),
            preset.size,
            preset.position.as_str(),
            preset.description
        );
    }
    Ok(())
}
