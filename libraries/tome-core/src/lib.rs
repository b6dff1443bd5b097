//! Tome Player Core
//!
//! Platform-agnostic core types and traits for Tome Player.
//!
//! This crate provides the foundational building blocks shared by the
//! playback engine and any embedding application:
//! - **Domain Types**: `PlayableItem`, `Chapter`, `Bookmark`
//! - **Collaborator Traits**: `LibraryStore`
//! - **Error Handling**: Unified `TomeError` and `Result` types
//!
//! Chapter resolution lives on [`PlayableItem`]: it maps global timeline
//! positions to chapters and converts between global and chapter-relative
//! time for both single-file and bound (multi-file) books.

#![forbid(unsafe_code)]

pub mod error;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{Result, TomeError};
pub use store::{Adjacency, LibraryStore};
pub use types::{Bookmark, BookmarkKind, Chapter, PlayableItem};
