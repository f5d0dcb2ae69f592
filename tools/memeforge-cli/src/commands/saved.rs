//! Manage the saved-meme library.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use memeforge_common::clock::SystemClock;
use memeforge_common::config::AppConfig;
use memeforge_render_engine::export::Exporter;
use memeforge_store::{FileStore, MemeLibrary};

use super::create::{print_report, progress_printer};

fn open(config: &AppConfig) -> MemeLibrary<FileStore> {
    MemeLibrary::open(FileStore::new(&config.library_dir))
}

pub fn list(config: &AppConfig) -> anyhow::Result<()> {
    let mut library = open(config);
    let memes = library.get_all();
    if memes.is_empty() {
        println!("No saved memes in {}", config.library_dir.display());
        return Ok(());
    }

    println!("Saved memes ({}):", memes.len());
    for meme in memes {
        println!("  {}  {}  {}", meme.id, meme.created_at_display(), meme.caption);
    }
    Ok(())
}

pub fn show(config: &AppConfig, id: &str) -> anyhow::Result<()> {
    let mut library = open(config);
    let meme = library
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("No saved meme with id {id}"))?;
    let image = meme.image().context("Stored image is corrupt")?;

    let summary = serde_json::json!({
        "id": meme.id,
        "caption": meme.caption,
        "created_at": meme.created_at_display(),
        "format": image.format,
        "bytes": image.bytes.len(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

pub fn delete(config: &AppConfig, id: &str) -> anyhow::Result<()> {
    let mut library = open(config);
    if library.delete(id) {
        println!("Deleted {id}");
        Ok(())
    } else {
        Err(anyhow::anyhow!("No saved meme with id {id}"))
    }
}

pub fn clear(config: &AppConfig) -> anyhow::Result<()> {
    let mut library = open(config);
    let count = library.count();
    library.clear();
    println!("Removed {count} saved meme(s)");
    Ok(())
}

pub fn export(config: &AppConfig, id: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let mut library = open(config);
    let meme = library
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("No saved meme with id {id}"))?;
    let image = meme.image().context("Stored image is corrupt")?;

    let exporter = Exporter::standard(config, output, false, Arc::new(SystemClock));
    let progress = progress_printer();
    let report = exporter.export(&image, Some(&progress));
    print_report(&report);
    Ok(())
}
