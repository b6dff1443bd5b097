//! Playback speed policy
//!
//! Resolves the effective rate from the global-vs-per-item setting and
//! persists changes through the library store. The current speed is also
//! kept in an in-memory observable so the loaded item's rate reflects a
//! change immediately, whichever scope is authoritative.

use std::sync::Arc;
use tokio::sync::watch;
use tome_core::LibraryStore;
use tracing::warn;

/// Lowest supported playback rate
pub const MIN_SPEED: f32 = 0.5;

/// Highest supported playback rate
pub const MAX_SPEED: f32 = 4.0;

/// Speed resolution and persistence
pub struct SpeedPolicy {
    store: Arc<dyn LibraryStore>,
    current: watch::Sender<f32>,
}

impl SpeedPolicy {
    /// Create a policy backed by the given store
    pub fn new(store: Arc<dyn LibraryStore>) -> Self {
        let (current, _) = watch::channel(1.0);
        Self { store, current }
    }

    /// Observable stream of the current effective speed
    pub fn subscribe(&self) -> watch::Receiver<f32> {
        self.current.subscribe()
    }

    /// The last resolved speed
    pub fn current(&self) -> f32 {
        *self.current.borrow()
    }

    /// Resolve the effective speed for an item
    ///
    /// Global mode reads the global slot, otherwise the per-item slot.
    /// Absent or non-positive stored values fall back to 1.0; this never
    /// returns a rate `<= 0`.
    pub async fn get_speed(&self, relative_path: &str, global: bool) -> f32 {
        let stored = if global {
            self.store.get_global_speed().await
        } else {
            self.store.get_speed(relative_path).await
        };

        let stored = match stored {
            Ok(value) => value,
            Err(error) => {
                warn!(%relative_path, %error, "failed to read persisted speed");
                None
            }
        };

        let speed = match stored {
            Some(value) if value > 0.0 => value,
            _ => 1.0,
        };

        self.current.send_replace(speed);
        speed
    }

    /// Persist a new speed and update the observable
    ///
    /// The per-item slot is always written when an item is loaded; the
    /// global slot is written additionally when global mode is enabled.
    /// Range clamping to `[MIN_SPEED, MAX_SPEED]` is the caller's concern.
    pub async fn set_speed(&self, speed: f32, relative_path: Option<&str>, global: bool) {
        if let Some(relative_path) = relative_path {
            if let Err(error) = self.store.update_speed(relative_path, speed).await {
                warn!(%relative_path, %error, "failed to persist item speed");
            }
        }

        if global {
            if let Err(error) = self.store.set_global_speed(speed).await {
                warn!(%error, "failed to persist global speed");
            }
        }

        self.current.send_replace(speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tome_core::store::memory::MemoryLibraryStore;

    #[tokio::test]
    async fn defaults_to_one_when_unset() {
        let store = Arc::new(MemoryLibraryStore::new());
        let policy = SpeedPolicy::new(store);
        assert_eq!(policy.get_speed("book", false).await, 1.0);
        assert_eq!(policy.get_speed("book", true).await, 1.0);
    }

    #[tokio::test]
    async fn non_positive_stored_speed_falls_back_to_one() {
        let store = Arc::new(MemoryLibraryStore::new());
        store.update_speed("book", -2.0).await.unwrap();
        let policy = SpeedPolicy::new(store);
        assert_eq!(policy.get_speed("book", false).await, 1.0);
    }

    #[tokio::test]
    async fn per_item_speed_round_trips() {
        let store = Arc::new(MemoryLibraryStore::new());
        let policy = SpeedPolicy::new(store);

        policy.set_speed(1.5, Some("book"), false).await;
        assert_eq!(policy.get_speed("book", false).await, 1.5);
        // other items are unaffected
        assert_eq!(policy.get_speed("other", false).await, 1.0);
    }

    #[tokio::test]
    async fn global_mode_uses_global_slot() {
        let store = Arc::new(MemoryLibraryStore::new());
        let policy = SpeedPolicy::new(store);

        policy.set_speed(2.0, Some("book"), true).await;
        assert_eq!(policy.get_speed("anything", true).await, 2.0);
    }

    #[tokio::test]
    async fn set_updates_observable_immediately() {
        let store = Arc::new(MemoryLibraryStore::new());
        let policy = SpeedPolicy::new(store);
        let rx = policy.subscribe();

        policy.set_speed(1.25, None, false).await;
        assert_eq!(*rx.borrow(), 1.25);
        assert_eq!(policy.current(), 1.25);
    }
}
