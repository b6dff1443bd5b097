//! Tome Player - Playback Engine
//!
//! Platform-agnostic audiobook playback for Tome Player.
//!
//! This crate provides:
//! - Single ownership of the playback position (global book timeline)
//! - Chapter resolution for single-file and bound (multi-file) books
//! - Smart rewind on resume (cubic curve, up to 30 s)
//! - Per-item and global playback speed
//! - Automatic play/skip bookmarks as recovery points
//! - Pause fade-out, autoplay, and stop-after-chapter for sleep timers
//! - Typed playback events plus watch-channel observables
//!
//! # Architecture
//!
//! `tome-playback` is completely platform-agnostic: the actual media
//! backend (AVPlayer, GStreamer, a decoder pipeline) is provided through
//! the [`AudioTransport`] trait, and persistence through the
//! [`tome_core::LibraryStore`] trait. The engine owns exactly one
//! transport and is the only writer of the playback position.
//!
//! Two integration styles are supported:
//! - [`PlayerManager`]: the state machine itself, driven manually by
//!   feeding it transport events and periodic ticks
//! - [`Player`]: a spawned task wrapping the manager, talked to through a
//!   cloneable handle
//!
//! # Example: Platform Integration
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::broadcast;
//! use tome_core::store::memory::MemoryLibraryStore;
//! use tome_playback::{
//!     AudioTransport, PlaybackSettings, Player, TransportEvent, TransportState,
//! };
//!
//! // Implement AudioTransport for your media backend
//! struct MyTransport {
//!     events: broadcast::Sender<TransportEvent>,
//!     state: TransportState,
//!     resource: Option<String>,
//!     rate: f32,
//!     volume: f32,
//!     position: f64,
//! }
//!
//! impl AudioTransport for MyTransport {
//!     fn prepare(&mut self, resource: &str) {
//!         // start asynchronous preparation; emit ReadyToPlay when done
//!         self.resource = Some(resource.to_string());
//!         self.state = TransportState::Loading;
//!     }
//!     fn play(&mut self, rate: f32) {
//!         self.rate = rate;
//!         self.state = TransportState::Playing;
//!     }
//!     fn pause(&mut self) {
//!         self.state = TransportState::Paused;
//!     }
//!     fn unload(&mut self) {
//!         self.resource = None;
//!         self.state = TransportState::Idle;
//!     }
//!     fn seek(&mut self, seconds: f64) {
//!         self.position = seconds;
//!     }
//!     fn position(&self) -> f64 {
//!         self.position
//!     }
//!     fn rate(&self) -> f32 {
//!         self.rate
//!     }
//!     fn set_rate(&mut self, rate: f32) {
//!         self.rate = rate;
//!     }
//!     fn volume(&self) -> f32 {
//!         self.volume
//!     }
//!     fn set_volume(&mut self, volume: f32) {
//!         self.volume = volume;
//!     }
//!     fn status(&self) -> TransportState {
//!         self.state
//!     }
//!     fn loaded_resource(&self) -> Option<&str> {
//!         self.resource.as_deref()
//!     }
//!     fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
//!         self.events.subscribe()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (events, _) = broadcast::channel(16);
//!     let transport = MyTransport {
//!         events,
//!         state: TransportState::Idle,
//!         resource: None,
//!         rate: 1.0,
//!         volume: 1.0,
//!         position: 0.0,
//!     };
//!     let store = Arc::new(MemoryLibraryStore::new());
//!
//!     let player = Player::spawn(Box::new(transport), store, PlaybackSettings::default());
//!     let mut events = player.subscribe_events();
//!
//!     // load an item from your library layer, then:
//!     player.play().await.unwrap();
//!     while let Ok(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//! }
//! ```

mod bookmarks;
mod error;
pub mod events;
mod player;
mod rewind;
mod service;
pub mod settings;
mod speed;
pub mod transport;

// Public exports
pub use bookmarks::BookmarkRecorder;
pub use error::{PlaybackError, Result};
pub use events::{NowPlaying, PlayerEvent};
pub use player::PlayerManager;
pub use rewind::{rewind_offset, SmartRewind, MAX_REWIND_SECS, REWIND_THRESHOLD_SECS};
pub use service::{Player, PlayerCommand};
pub use settings::{PlaybackSettings, VOLUME_BOOSTED, VOLUME_NORMAL};
pub use speed::{SpeedPolicy, MAX_SPEED, MIN_SPEED};
pub use transport::{AudioTransport, TransportEvent, TransportState};
