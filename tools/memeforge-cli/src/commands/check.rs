//! Check configuration, fonts, and output directories.

use std::path::Path;

use anyhow::Context;

use memeforge_common::config::AppConfig;
use memeforge_meme_model::style::CaptionFont;
use memeforge_render_engine::ingest::AVIF_DECODING;
use memeforge_render_engine::text::FontBook;

fn check_dir(label: &str, dir: &Path) -> bool {
    let marker = dir.join(".memeforge-check");
    let writable = std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(&marker, b"ok"))
        .and_then(|_| std::fs::remove_file(&marker));
    match writable {
        Ok(()) => {
            println!("[OK] {label}: {}", dir.display());
            true
        }
        Err(e) => {
            println!("[WARN] {label}: {} ({e})", dir.display());
            false
        }
    }
}

pub fn run(config: &AppConfig, write_config: bool) -> anyhow::Result<()> {
    println!("memeforge System Check");
    println!("{}", "=".repeat(50));

    let config_path = AppConfig::path();
    if write_config {
        config
            .save()
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        println!("[OK] Wrote config: {}", config_path.display());
    } else if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[OK] Config: defaults ({} not found)", config_path.display());
    }

    let library_ok = check_dir("Library", &config.library_dir);
    let downloads_ok = check_dir("Downloads", &config.downloads_dir);
    let scratch_ok = check_dir("Scratch", &config.scratch_dir);

    let fonts = FontBook::from_paths(&config.render.fonts);
    for font in CaptionFont::ALL {
        println!("[OK] Font {}: {}", font.as_str(), fonts.face(font).name());
    }

    if AVIF_DECODING {
        println!("[OK] AVIF decoding enabled");
    } else {
        println!("[WARN] AVIF decoding disabled (build with the `avif` feature)");
    }

    println!();
    if library_ok && (downloads_ok || scratch_ok) {
        println!("memeforge is ready.");
    } else {
        println!("Some directories are not writable. Exports fall back to inline data URLs.");
    }
    Ok(())
}
