//! memeforge CLI: caption images, export them, and manage saved memes.
//!
//! Usage:
//!   memeforge captions [--style TONE]   List canned captions
//!   memeforge presets                   List style presets
//!   memeforge create <IMAGE> [OPTIONS]  Caption an image and export it
//!   memeforge saved <ACTION>            List, show, export, or delete saved memes
//!   memeforge check                     Check configuration and output directories

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "memeforge",
    about = "Caption pictures and turn them into shareable memes",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the canned captions for a tone
    Captions {
        /// Caption tone: funny|sarcastic|motivational|dark|tech
        #[arg(short, long, default_value = "funny")]
        style: String,
    },

    /// List the built-in style presets
    Presets,

    /// Caption an image and export the result
    Create {
        /// Image to caption (JPEG, PNG, WEBP, or AVIF)
        image: PathBuf,

        /// Caption tone to pick from
        #[arg(short, long, default_value = "funny")]
        style: String,

        /// Zero-based index into the tone's captions
        #[arg(long, default_value = "0")]
        pick: usize,

        /// Custom caption text (overrides the canned caption)
        #[arg(short, long)]
        caption: Option<String>,

        /// Style preset name, e.g. "Classic Meme" or classic-meme
        #[arg(long)]
        preset: Option<String>,

        /// Font: impact|arial|comic
        #[arg(long)]
        font: Option<String>,

        /// Color: white|yellow|neon|pink|purple
        #[arg(long)]
        color: Option<String>,

        /// Caption size in pixels
        #[arg(long)]
        size: Option<u32>,

        /// Caption position: top|center|bottom
        #[arg(long)]
        position: Option<String>,

        /// Save to this exact path instead of the downloads folder
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: png|jpeg|webp
        #[arg(long, default_value = "png")]
        format: String,

        /// Also add the result to the saved-meme library
        #[arg(long)]
        save: bool,

        /// Never launch an image viewer
        #[arg(long)]
        no_open: bool,
    },

    /// Manage saved memes
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },

    /// Check configuration, fonts, and output directories
    Check {
        /// Write the effective configuration to the config file
        #[arg(long)]
        write_config: bool,
    },
}

#[derive(Subcommand)]
enum SavedAction {
    /// List saved memes, newest first
    List,

    /// Show one saved meme
    Show {
        /// Saved meme id
        id: String,
    },

    /// Delete one saved meme
    Delete {
        /// Saved meme id
        id: String,
    },

    /// Delete every saved meme
    Clear,

    /// Export a saved meme as an image file
    Export {
        /// Saved meme id
        id: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = memeforge_common::config::AppConfig::load();
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    memeforge_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Captions { style } => commands::captions::run(&style),
        Commands::Presets => commands::presets::run(),
        Commands::Create {
            image,
            style,
            pick,
            caption,
            preset,
            font,
            color,
            size,
            position,
            output,
            format,
            save,
            no_open,
        } => {
            commands::create::run(
                &config,
                commands::create::CreateArgs {
                    image,
                    style,
                    pick,
                    caption,
                    preset,
                    font,
                    color,
                    size,
                    position,
                    output,
                    format,
                    save,
                    open_viewer: !no_open,
                },
            )
            .await
        }
        Commands::Saved { action } => match action {
            SavedAction::List => commands::saved::list(&config),
            SavedAction::Show { id } => commands::saved::show(&config, &id),
            SavedAction::Delete { id } => commands::saved::delete(&config, &id),
            SavedAction::Clear => commands::saved::clear(&config),
            SavedAction::Export { id, output } => commands::saved::export(&config, &id, output),
        },
        Commands::Check { write_config } => commands::check::run(&config, write_config),
    }
}
