//! List canned captions.

use memeforge_meme_model::caption::{generate_captions, CaptionTone};

pub fn run(style: &str) -> anyhow::Result<()> {
    let tone = match style.parse::<CaptionTone>() {
        Ok(tone) => tone,
        Err(e) => {
            tracing::warn!("{e}, using {}", CaptionTone::default());
            CaptionTone::default()
        }
    };

    println!("Captions ({tone}):");
    for (index, caption) in generate_captions(tone.as_str()).iter().enumerate() {
        println!("  [{index}] {caption}");
    }
    println!();
    println!(
        "Tones: {}",
        CaptionTone::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}
