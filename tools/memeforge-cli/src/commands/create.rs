//! Caption an image and export it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use memeforge_common::clock::{Clock, SystemClock};
use memeforge_common::config::AppConfig;
use memeforge_meme_model::caption::CaptionTone;
use memeforge_meme_model::raster::ExportFormat;
use memeforge_meme_model::saved::SavedMeme;
use memeforge_meme_model::state::MemeState;
use memeforge_meme_model::style::{CaptionColor, CaptionFont, CaptionPosition, StylePreset};
use memeforge_render_engine::compositor::{composite_state, CompositeOptions};
use memeforge_render_engine::export::{ExportOutcome, ExportProgress, ExportReport, Exporter};
use memeforge_render_engine::ingest::{ingest_path, IngestPolicy};
use memeforge_render_engine::text::FontBook;
use memeforge_store::{FileStore, MemeLibrary};

pub struct CreateArgs {
    pub image: PathBuf,
    pub style: String,
    pub pick: usize,
    pub caption: Option<String>,
    pub preset: Option<String>,
    pub font: Option<String>,
    pub color: Option<String>,
    pub size: Option<u32>,
    pub position: Option<String>,
    pub output: Option<PathBuf>,
    pub format: String,
    pub save: bool,
    pub open_viewer: bool,
}

fn parse_format(format: &str) -> anyhow::Result<ExportFormat> {
    match format.to_ascii_lowercase().as_str() {
        "png" => Ok(ExportFormat::Png),
        "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
        "webp" => Ok(ExportFormat::Webp),
        _ => Err(anyhow::anyhow!("Unknown format: {format}. Use: png, jpeg, webp")),
    }
}

fn build_state(args: &CreateArgs, state: MemeState) -> anyhow::Result<MemeState> {
    let tone = match args.style.parse::<CaptionTone>() {
        Ok(tone) => tone,
        Err(e) => {
            tracing::warn!("{e}, using {}", CaptionTone::default());
            CaptionTone::default()
        }
    };

    let mut state = state.with_caption_tone(tone);
    if args.pick >= state.captions().len() {
        tracing::warn!(
            pick = args.pick,
            available = state.captions().len(),
            "Caption index out of range, keeping the first caption"
        );
    }
    state = state.select_caption_at(args.pick);

    if let Some(text) = &args.caption {
        state = state
            .with_custom_caption(text.clone())
            .with_use_custom_caption(true);
    }

    if let Some(name) = &args.preset {
        let preset = StylePreset::find(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown preset: {name}. See `memeforge presets`"))?;
        state = state.apply_preset(preset);
    }
    if let Some(font) = &args.font {
        state = state.with_font(CaptionFont::from_id(font));
    }
    if let Some(color) = &args.color {
        state = state.with_color(CaptionColor::from_id(color));
    }
    if let Some(size) = args.size {
        state = state.with_size(size);
    }
    if let Some(position) = &args.position {
        state = state.with_position(CaptionPosition::from_id(position));
    }
    Ok(state)
}

pub fn print_report(report: &ExportReport) {
    for failure in &report.failures {
        println!("  [WARN] {} failed: {}", failure.strategy, failure.error);
    }
    match &report.outcome {
        ExportOutcome::Saved { path } => println!("Saved: {}", path.display()),
        ExportOutcome::Downloaded { path } => println!("Downloaded: {}", path.display()),
        ExportOutcome::Opened {
            path,
            launched,
            instructions,
        } => {
            println!("Written: {}", path.display());
            if *launched {
                println!("Opened in your image viewer.");
            }
            println!("{instructions}");
        }
        ExportOutcome::Inline { data_url } => {
            println!("Could not write a file. Copy this data URL into a browser to save the image:");
            println!("{data_url}");
        }
    }
}

pub fn progress_printer() -> memeforge_render_engine::export::ProgressCallback {
    Box::new(|p: ExportProgress| {
        tracing::debug!(
            stage = ?p.stage,
            strategy = p.strategy.as_deref().unwrap_or("-"),
            "Export progress {:.0}%",
            p.progress * 100.0
        );
    })
}

pub async fn run(config: &AppConfig, args: CreateArgs) -> anyhow::Result<()> {
    let format = parse_format(&args.format)?;
    let policy = IngestPolicy::from_config(&config.ingest);

    println!("Loading: {}", args.image.display());
    let source = ingest_path(&args.image, &policy)
        .await
        .with_context(|| format!("Failed to load {}", args.image.display()))?;
    println!("  Size: {}x{} ({})", source.width(), source.height(), source.mime());

    let state = build_state(&args, MemeState::new().with_source(source))?;
    let caption = state.active_caption().unwrap_or("").to_string();
    let style = state.style();
    println!("  Caption: {caption}");
    println!(
        "  Style: {} {} {}px {}",
        style.font.as_str(),
        style.color.as_str(),
        style.size,
        style.position.as_str()
    );

    let fonts = FontBook::from_paths(&config.render.fonts);
    let options = CompositeOptions::from_config(&config.render);
    let flattened = composite_state(&state, &options, &fonts)?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let exporter = Exporter::standard(config, args.output.clone(), args.open_viewer, clock.clone());
    let progress = progress_printer();
    let report = exporter.export_flattened(&flattened, format, Some(&progress))?;
    print_report(&report);

    if args.save {
        let meme = SavedMeme::from_flattened(&flattened, caption, clock.now_utc())
            .context("Failed to encode meme for saving")?;
        let id = meme.id.clone();
        let mut library = MemeLibrary::open(FileStore::new(&config.library_dir));
        if library.save(meme) {
            println!("Saved to library as {id}");
        } else {
            println!("Already in library as {id}");
        }
        library.close();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CreateArgs {
        CreateArgs {
            image: PathBuf::from("in.png"),
            style: "tech".into(),
            pick: 1,
            caption: None,
            preset: None,
            font: None,
            color: None,
            size: None,
            position: None,
            output: None,
            format: "png".into(),
            save: false,
            open_viewer: false,
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("PNG").unwrap(), ExportFormat::Png);
        assert_eq!(parse_format("jpg").unwrap(), ExportFormat::Jpeg);
        assert!(parse_format("gif").is_err());
    }

    #[test]
    fn test_build_state_picks_canned_caption() {
        let state = build_state(&args(), MemeState::new()).unwrap();
        assert_eq!(state.caption_tone(), CaptionTone::Tech);
        assert_eq!(state.active_caption(), Some(CaptionTone::Tech.captions()[1]));
    }

    #[test]
    fn test_overrides_apply_after_preset() {
        let mut a = args();
        a.caption = Some("Hello".into());
        a.preset = Some("minimal".into());
        a.color = Some("pink".into());
        let state = build_state(&a, MemeState::new()).unwrap();
        assert_eq!(state.active_caption(), Some("Hello"));
        assert_eq!(state.style().font, CaptionFont::Arial);
        assert_eq!(state.style().color, CaptionColor::Pink);
    }

    #[test]
    fn test_unknown_preset_is_an_error() {
        let mut a = args();
        a.preset = Some("vaporwave".into());
        assert!(build_state(&a, MemeState::new()).is_err());
    }
}
