//! Error types for the playback engine

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No item is currently loaded
    #[error("No item loaded")]
    NoItemLoaded,

    /// The item's resource could not be prepared for playback
    #[error("Failed to load item: {0}")]
    LoadFailed(String),

    /// The underlying transport failed after a successful load
    #[error("Transport error: {0}")]
    Transport(String),

    /// The platform audio session could not be activated
    ///
    /// Fatal to the current `play()` attempt only; the player stays usable.
    #[error("Audio session error: {0}")]
    AudioSession(String),

    /// Invalid seek position
    #[error("Invalid seek position: {0}")]
    InvalidSeekPosition(f64),

    /// Storage collaborator error
    #[error(transparent)]
    Store(#[from] tome_core::TomeError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
