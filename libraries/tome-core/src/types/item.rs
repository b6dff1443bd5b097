//! Playable item and chapter domain types

use serde::{Deserialize, Serialize};

/// A named sub-range of a playable item's timeline
///
/// For bound books each chapter points at its own media resource starting
/// at 0; for single-file books every chapter shares the item's resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter title
    pub title: String,

    /// Start offset in the item's global timeline (seconds)
    pub start: f64,

    /// Chapter duration (seconds)
    pub duration: f64,

    /// Relative path of the underlying media resource
    pub relative_path: String,
}

impl Chapter {
    /// End offset in the global timeline (exclusive)
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A book currently loaded for playback
///
/// Constructed by the library layer when an item is selected; owned
/// exclusively by the player while loaded and replaced wholesale when a
/// different item is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayableItem {
    /// Unique identifier and storage key
    pub relative_path: String,

    /// Book title
    pub title: String,

    /// Book author
    pub author: String,

    /// Total duration in seconds (global timeline)
    pub duration: f64,

    /// Current playback position in seconds (global timeline)
    pub current_time: f64,

    /// Ordered chapter list (non-empty, sorted by `start`, first start = 0)
    pub chapters: Vec<Chapter>,

    /// True when chapters map to distinct underlying files presented as
    /// one continuous timeline
    pub is_bound_book: bool,

    /// Containing collection, used only for next/previous scoping
    pub parent_folder: Option<String>,
}

impl PlayableItem {
    /// Index of the active chapter for a global time
    ///
    /// Returns the last chapter whose `start <= global_time`, clamped into
    /// range for times outside `[0, duration)`. A time exactly at a chapter
    /// boundary belongs to the later chapter.
    pub fn chapter_index_at(&self, global_time: f64) -> usize {
        let after = self
            .chapters
            .partition_point(|chapter| chapter.start <= global_time);
        after.saturating_sub(1)
    }

    /// The active chapter for a global time
    pub fn chapter_at(&self, global_time: f64) -> &Chapter {
        &self.chapters[self.chapter_index_at(global_time)]
    }

    /// The chapter containing `current_time`
    pub fn current_chapter(&self) -> &Chapter {
        self.chapter_at(self.current_time)
    }

    /// Index of the chapter containing `current_time`
    pub fn current_chapter_index(&self) -> usize {
        self.chapter_index_at(self.current_time)
    }

    /// Convert a global time to time within its chapter
    ///
    /// This is the file-local seek target for bound books, whose chapters
    /// each start at 0 in their own resource.
    pub fn chapter_relative_time(&self, global_time: f64) -> f64 {
        global_time - self.chapter_at(global_time).start
    }

    /// Convert a chapter-relative time back to the global timeline
    pub fn global_time(&self, chapter: &Chapter, relative_time: f64) -> f64 {
        chapter.start + relative_time
    }

    /// Clamp a requested position into `[0, duration]`
    pub fn clamped_time(&self, time: f64) -> f64 {
        time.clamp(0.0, self.duration)
    }

    /// Whether the last chapter is the active one
    pub fn on_last_chapter(&self) -> bool {
        self.current_chapter_index() + 1 == self.chapters.len()
    }

    /// Whether a position rounds to the same whole second as the duration
    ///
    /// Used as the completion short-circuit before starting playback.
    pub fn is_completed_at(&self, time: f64) -> bool {
        (self.duration as i64) == (time as i64)
    }
}
