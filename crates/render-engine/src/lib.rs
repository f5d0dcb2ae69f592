//! memeforge Render Engine
//!
//! Turns an uploaded picture plus editing choices (caption, style) into a
//! finished meme and delivers it somewhere the user can keep it.
//!
//! # Pipeline Architecture
//!
//! ```text
//! upload bytes ──► ingest (validate, decode) ──► SourceImage
//!                                                   │
//! MemeState (caption, style) ───────────────────────┤
//!                                                   ▼
//!                                    compositor (band, text, watermark)
//!                                                   │
//!                                                   ▼
//!                                            FlattenedImage
//!                                                   │
//!                                            encode (PNG/JPEG/WebP)
//!                                                   │
//!                                                   ▼
//!                 export chain: native save ─► downloads ─► viewer ─► data URL
//! ```

pub mod bitmap_font;
pub mod compositor;
pub mod export;
pub mod ingest;
pub mod text;

pub use compositor::*;
pub use export::*;
pub use ingest::*;
pub use text::{FontBook, Typeface};
