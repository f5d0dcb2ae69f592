//! memeforge Meme Model
//!
//! Defines the core data contracts for memeforge:
//! - **Caption:** canned caption lists keyed by tone
//! - **Style:** font, color, size, position, and named presets
//! - **State:** the immutable editing session value and its transitions
//! - **Raster:** source, flattened, and encoded image values
//! - **Saved:** persisted, already-flattened meme records

pub mod caption;
pub mod raster;
pub mod saved;
pub mod state;
pub mod style;

pub use caption::*;
pub use raster::*;
pub use saved::*;
pub use state::*;
pub use style::*;
