//! memeforge Store
//!
//! Durable storage for saved memes:
//! - **KV:** the [`KeyValueStore`] seam with file and in-memory backends
//! - **Library:** [`MemeLibrary`], the cached saved-meme list on top of a store

pub mod kv;
pub mod library;

pub use kv::*;
pub use library::*;
