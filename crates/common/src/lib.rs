//! memeforge Common Utilities
//!
//! Shared infrastructure for all memeforge crates:
//! - Error types and result aliases
//! - Wall-clock abstraction for timestamps and export filenames
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
