//! In-memory library store
//!
//! A complete `LibraryStore` backed by hash maps behind a mutex. Useful as
//! a reference implementation, for tests, and for embedders that manage
//! their own persistence and only need playback to function.

use crate::error::Result;
use crate::store::{Adjacency, LibraryStore};
use crate::types::{Bookmark, BookmarkKind, PlayableItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    /// Items in library order, used for neighbor resolution
    items: Vec<PlayableItem>,
    times: HashMap<String, f64>,
    speeds: HashMap<String, f32>,
    global_speed: Option<f32>,
    last_played: Option<String>,
    play_dates: HashMap<String, DateTime<Utc>>,
    finished: HashSet<String>,
    bookmarks: HashMap<(String, BookmarkKind), Bookmark>,
}

/// Hash-map backed `LibraryStore`
#[derive(Debug, Default)]
pub struct MemoryLibraryStore {
    inner: Mutex<Inner>,
}

impl MemoryLibraryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item, appended to the library ordering
    pub fn insert_item(&self, item: PlayableItem) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .times
            .insert(item.relative_path.clone(), item.current_time);
        inner.items.push(item);
    }

    /// The last played item recorded, if any
    pub fn last_played_item(&self) -> Option<String> {
        self.inner.lock().unwrap().last_played.clone()
    }

    /// The persisted playback position for an item, if any
    pub fn playback_time(&self, relative_path: &str) -> Option<f64> {
        self.inner.lock().unwrap().times.get(relative_path).copied()
    }

    /// Whether an item is marked finished
    pub fn is_finished(&self, relative_path: &str) -> bool {
        self.inner.lock().unwrap().finished.contains(relative_path)
    }
}

#[async_trait]
impl LibraryStore for MemoryLibraryStore {
    async fn update_playback_time(&self, relative_path: &str, time: f64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.times.insert(relative_path.to_string(), time);
        if let Some(item) = inner
            .items
            .iter_mut()
            .find(|item| item.relative_path == relative_path)
        {
            item.current_time = time;
        }
        Ok(())
    }

    async fn update_speed(&self, relative_path: &str, speed: f32) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .speeds
            .insert(relative_path.to_string(), speed);
        Ok(())
    }

    async fn get_speed(&self, relative_path: &str) -> Result<Option<f32>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .speeds
            .get(relative_path)
            .copied())
    }

    async fn set_global_speed(&self, speed: f32) -> Result<()> {
        self.inner.lock().unwrap().global_speed = Some(speed);
        Ok(())
    }

    async fn get_global_speed(&self) -> Result<Option<f32>> {
        Ok(self.inner.lock().unwrap().global_speed)
    }

    async fn set_last_played_item(&self, relative_path: Option<&str>) -> Result<()> {
        self.inner.lock().unwrap().last_played = relative_path.map(str::to_string);
        Ok(())
    }

    async fn update_last_play_date(
        &self,
        relative_path: &str,
        date: DateTime<Utc>,
    ) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .play_dates
            .insert(relative_path.to_string(), date);
        Ok(())
    }

    async fn mark_finished(&self, relative_path: &str, flag: bool) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if flag {
            inner.finished.insert(relative_path.to_string());
        } else {
            inner.finished.remove(relative_path);
        }
        Ok(())
    }

    async fn get_bookmark(
        &self,
        kind: BookmarkKind,
        relative_path: &str,
    ) -> Result<Option<Bookmark>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .bookmarks
            .get(&(relative_path.to_string(), kind))
            .cloned())
    }

    async fn upsert_bookmark(&self, bookmark: Bookmark) -> Result<()> {
        self.inner
            .lock()
            .unwrap()
            .bookmarks
            .insert((bookmark.relative_path.clone(), bookmark.kind), bookmark);
        Ok(())
    }

    async fn adjacent_item(
        &self,
        relative_path: &str,
        parent_folder: Option<&str>,
        direction: Adjacency,
        autoplayed: bool,
    ) -> Result<Option<PlayableItem>> {
        let inner = self.inner.lock().unwrap();

        let scoped: Vec<&PlayableItem> = inner
            .items
            .iter()
            .filter(|item| match parent_folder {
                Some(folder) => item.parent_folder.as_deref() == Some(folder),
                None => true,
            })
            .collect();

        let Some(index) = scoped
            .iter()
            .position(|item| item.relative_path == relative_path)
        else {
            return Ok(None);
        };

        let candidates: Box<dyn Iterator<Item = &&PlayableItem>> = match direction {
            Adjacency::After => Box::new(scoped[index + 1..].iter()),
            Adjacency::Before => Box::new(scoped[..index].iter().rev()),
        };

        for candidate in candidates {
            if autoplayed && inner.finished.contains(&candidate.relative_path) {
                continue;
            }
            let mut item = (*candidate).clone();
            if let Some(time) = inner.times.get(&item.relative_path) {
                item.current_time = *time;
            }
            return Ok(Some(item));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(path: &str, folder: Option<&str>) -> PlayableItem {
        PlayableItem {
            relative_path: path.to_string(),
            title: path.to_string(),
            author: "Author".to_string(),
            duration: 100.0,
            current_time: 0.0,
            chapters: vec![],
            is_bound_book: false,
            parent_folder: folder.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn playback_time_round_trips() {
        let store = MemoryLibraryStore::new();
        store.insert_item(item("a", None));
        store.update_playback_time("a", 42.5).await.unwrap();
        assert_eq!(store.playback_time("a"), Some(42.5));
    }

    #[tokio::test]
    async fn bookmark_upsert_replaces_by_kind() {
        let store = MemoryLibraryStore::new();
        store
            .upsert_bookmark(Bookmark::new("a", 10.0, BookmarkKind::Skip))
            .await
            .unwrap();
        store
            .upsert_bookmark(Bookmark::new("a", 20.0, BookmarkKind::Skip))
            .await
            .unwrap();

        let found = store.get_bookmark(BookmarkKind::Skip, "a").await.unwrap();
        assert_eq!(found.unwrap().time, 20.0);
        // other kinds are untouched
        assert!(store
            .get_bookmark(BookmarkKind::Play, "a")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn adjacency_respects_folder_scope() {
        let store = MemoryLibraryStore::new();
        store.insert_item(item("a", Some("book")));
        store.insert_item(item("x", Some("other")));
        store.insert_item(item("b", Some("book")));

        let next = store
            .adjacent_item("a", Some("book"), Adjacency::After, false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.relative_path, "b");

        let previous = store
            .adjacent_item("b", Some("book"), Adjacency::Before, false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(previous.relative_path, "a");
    }

    #[tokio::test]
    async fn autoplay_skips_finished_items() {
        let store = MemoryLibraryStore::new();
        store.insert_item(item("a", None));
        store.insert_item(item("b", None));
        store.insert_item(item("c", None));
        store.mark_finished("b", true).await.unwrap();

        let next = store
            .adjacent_item("a", None, Adjacency::After, true)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.relative_path, "c");

        // explicit navigation still reaches the finished item
        let next = store
            .adjacent_item("a", None, Adjacency::After, false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.relative_path, "b");
    }

    #[tokio::test]
    async fn adjacent_item_applies_persisted_position() {
        let store = MemoryLibraryStore::new();
        store.insert_item(item("a", None));
        store.insert_item(item("b", None));
        store.update_playback_time("b", 33.0).await.unwrap();

        let next = store
            .adjacent_item("a", None, Adjacency::After, false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.current_time, 33.0);
    }
}
