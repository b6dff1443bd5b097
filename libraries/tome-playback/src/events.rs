//! Playback events
//!
//! Discrete notifications broadcast by the player so UIs, sleep timers and
//! widgets can react without polling. Continuous values (current item,
//! effective speed, playing flag, now-playing snapshot) are exposed as
//! watch channels instead; events carry moments, watches carry state.

use serde::{Deserialize, Serialize};

/// A discrete playback notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// An item finished loading and is ready to play
    Ready { relative_path: String, speed: f32 },

    /// An item could not be loaded
    LoadFailed { relative_path: String },

    /// Playback started or resumed
    Played { relative_path: String },

    /// Playback paused
    ///
    /// Emitted at the moment of the pause command, before any fade-out
    /// completes.
    Paused { relative_path: String },

    /// Playback stopped and the item was unloaded
    Stopped { relative_path: String },

    /// The active chapter changed
    ChapterChanged { title: String, index: usize },

    /// Periodic position update while an item is loaded
    PositionUpdated {
        relative_path: String,
        time: f64,
        duration: f64,
    },

    /// The current book (or the current chapter, with stop-after-chapter
    /// armed) reached its end
    BookEnded { relative_path: String },

    /// The transport failed after a successful load
    TransportFailed { message: String },
}

/// Snapshot of what is playing, for lock screens and now-playing widgets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    /// Active chapter title
    pub chapter_title: String,

    /// Book title
    pub book_title: String,

    /// Book author
    pub author: String,

    /// Global position in seconds
    pub time: f64,

    /// Total book duration in seconds
    pub duration: f64,

    /// Current playback rate
    pub rate: f32,
}
