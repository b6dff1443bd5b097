//! Bookmark domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of bookmark
///
/// Automatic kinds are upserted per (item, kind): at most one exists for
/// a given item at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookmarkKind {
    /// Recorded automatically right before playback starts
    Play,

    /// Recorded automatically right before a seek jump
    Skip,

    /// Created explicitly by the user
    User,
}

impl BookmarkKind {
    /// Default note attached to automatic bookmarks
    pub fn default_note(self) -> Option<&'static str> {
        match self {
            BookmarkKind::Play => Some("Automatic bookmark (play)"),
            BookmarkKind::Skip => Some("Automatic bookmark (skip)"),
            BookmarkKind::User => None,
        }
    }

    /// Whether this kind is system-created
    pub fn is_automatic(self) -> bool {
        !matches!(self, BookmarkKind::User)
    }
}

/// A position marker inside a playable item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Storage key of the item this bookmark belongs to
    pub relative_path: String,

    /// Position in whole seconds (floored at creation)
    pub time: f64,

    /// Bookmark kind
    pub kind: BookmarkKind,

    /// Optional note
    pub note: Option<String>,

    /// When the bookmark was created or last updated
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    /// Create a bookmark at a position, flooring to whole seconds
    pub fn new(relative_path: impl Into<String>, time: f64, kind: BookmarkKind) -> Self {
        Self {
            relative_path: relative_path.into(),
            time: time.floor(),
            kind,
            note: kind.default_note().map(String::from),
            created_at: Utc::now(),
        }
    }
}
