//! Automatic bookmark recording
//!
//! Play and skip bookmarks are system-owned recovery points: at most one
//! exists per (item, kind), moved forward on every play or jump rather
//! than accumulated.

use crate::error::Result;
use std::sync::Arc;
use tome_core::{Bookmark, BookmarkKind, LibraryStore};

/// Records automatic bookmarks through the library store
pub struct BookmarkRecorder {
    store: Arc<dyn LibraryStore>,
}

impl BookmarkRecorder {
    /// Create a recorder backed by the given store
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        Self { store }
    }

    /// Create or move the automatic bookmark of `kind` for an item
    ///
    /// The position is floored to whole seconds. If a bookmark of the same
    /// kind already exists it is updated in place, keeping the single-slot
    /// invariant.
    pub async fn record(
        &self,
        kind: BookmarkKind,
        relative_path: &str,
        time: f64,
    ) -> Result<()> {
        let bookmark = match self.store.get_bookmark(kind, relative_path).await? {
            Some(mut existing) => {
                existing.time = time.floor();
                existing
            }
            None => Bookmark::new(relative_path, time, kind),
        };

        self.store.upsert_bookmark(bookmark).await?;
        Ok(())
    }
}
