//! Library store collaborator trait
//!
//! The hierarchical library model (folders, books, ordering, persistence)
//! lives outside this core. The playback engine only talks to it through
//! this interface, and treats every write as best-effort: failures are
//! logged by callers, never retried here.

use crate::error::Result;
use crate::types::{Bookmark, BookmarkKind, PlayableItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod memory;

/// Which neighbor to resolve when navigating between items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjacency {
    /// The item ordered before the given one
    Before,
    /// The item ordered after the given one
    After,
}

/// Persistence side of playback: positions, speeds, bookmarks, ordering
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Persist the current playback position for an item
    async fn update_playback_time(&self, relative_path: &str, time: f64) -> Result<()>;

    /// Persist the per-item playback speed
    async fn update_speed(&self, relative_path: &str, speed: f32) -> Result<()>;

    /// Fetch the persisted per-item speed, if any
    async fn get_speed(&self, relative_path: &str) -> Result<Option<f32>>;

    /// Persist the global playback speed slot
    async fn set_global_speed(&self, speed: f32) -> Result<()>;

    /// Fetch the persisted global speed, if any
    async fn get_global_speed(&self) -> Result<Option<f32>>;

    /// Record (or clear, with `None`) the library's last played item
    async fn set_last_played_item(&self, relative_path: Option<&str>) -> Result<()>;

    /// Record the last time an item was played
    async fn update_last_play_date(
        &self,
        relative_path: &str,
        date: DateTime<Utc>,
    ) -> Result<()>;

    /// Mark an item finished or unfinished
    async fn mark_finished(&self, relative_path: &str, flag: bool) -> Result<()>;

    /// Fetch the bookmark of a kind for an item, if one exists
    async fn get_bookmark(
        &self,
        kind: BookmarkKind,
        relative_path: &str,
    ) -> Result<Option<Bookmark>>;

    /// Create or replace the bookmark for (item, kind)
    async fn upsert_bookmark(&self, bookmark: Bookmark) -> Result<()>;

    /// Resolve the neighboring playable item within the surrounding
    /// collection (bound-book or folder ordering)
    ///
    /// `autoplayed` lets implementations skip finished items when the
    /// request comes from auto-advance rather than an explicit command.
    async fn adjacent_item(
        &self,
        relative_path: &str,
        parent_folder: Option<&str>,
        direction: Adjacency,
        autoplayed: bool,
    ) -> Result<Option<PlayableItem>>;
}
