//! Platform-agnostic audio transport trait
//!
//! Abstracts the underlying media player (AVPlayer, GStreamer, a decoder
//! pipeline, ...) behind load/seek/play/pause/rate commands plus an event
//! stream for readiness, failure and natural completion. The player owns
//! exactly one transport instance; nothing else may mutate it.

use crate::error::Result;
use tokio::sync::broadcast;

/// Observable transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// No resource loaded
    Idle,

    /// A resource is being prepared
    Loading,

    /// Resource prepared, playback can start
    ReadyToPlay,

    /// Audio is rendering
    Playing,

    /// Paused mid-resource
    Paused,

    /// Preparation or rendering failed
    Failed,
}

impl TransportState {
    /// Whether commands like play/seek can be issued
    pub fn is_ready(self) -> bool {
        matches!(self, Self::ReadyToPlay | Self::Playing | Self::Paused)
    }
}

/// Asynchronous notifications from the transport
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Status moved to a new state (readiness, failure, ...)
    StatusChanged(TransportState),

    /// The loaded resource played to its natural end
    PlayedToEnd,
}

/// Platform-agnostic audio transport
///
/// Implementors wrap a concrete media backend. `prepare` is asynchronous:
/// it returns immediately and the outcome arrives as a `StatusChanged`
/// event (`ReadyToPlay` or `Failed`) on the subscription stream.
pub trait AudioTransport: Send {
    /// Begin preparing a media resource for playback
    ///
    /// Replaces whatever resource is currently loaded. Status moves to
    /// `Loading`, then to `ReadyToPlay` or `Failed` via the event stream.
    fn prepare(&mut self, resource: &str);

    /// Start or resume playback at the given rate
    fn play(&mut self, rate: f32);

    /// Pause playback, keeping the resource loaded
    fn pause(&mut self);

    /// Stop playback and release the loaded resource
    fn unload(&mut self);

    /// Seek to a position in the loaded resource (seconds, file-local)
    fn seek(&mut self, seconds: f64);

    /// Current position in the loaded resource (seconds, file-local)
    ///
    /// May transiently report negative values on some backends during
    /// chapter switches; callers must tolerate that.
    fn position(&self) -> f64;

    /// Current playback rate
    fn rate(&self) -> f32;

    /// Change the playback rate while playing
    fn set_rate(&mut self, rate: f32);

    /// Output volume in `[0.0, 1.0]`, used by the pause fade
    fn volume(&self) -> f32;

    /// Set the output volume
    fn set_volume(&mut self, volume: f32);

    /// Current status
    fn status(&self) -> TransportState;

    /// Resource currently loaded (or being prepared), if any
    fn loaded_resource(&self) -> Option<&str>;

    /// Subscribe to readiness/failure/completion events
    fn subscribe(&self) -> broadcast::Receiver<TransportEvent>;

    /// Whether audio is currently rendering
    fn is_playing(&self) -> bool {
        self.status() == TransportState::Playing
    }

    /// Activate the platform audio session before playback
    ///
    /// Failure aborts the current play attempt only; it must never take
    /// down the process.
    fn activate_session(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release the platform audio session after pause/stop
    fn deactivate_session(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_states() {
        assert!(TransportState::ReadyToPlay.is_ready());
        assert!(TransportState::Playing.is_ready());
        assert!(TransportState::Paused.is_ready());
        assert!(!TransportState::Idle.is_ready());
        assert!(!TransportState::Loading.is_ready());
        assert!(!TransportState::Failed.is_ready());
    }
}
