//! Playback orchestrator
//!
//! `PlayerManager` owns the single source of truth for playback position
//! and the lifecycle of the loaded item: chapter resolution, speed and
//! smart-rewind policies, automatic bookmarks, and persistence through the
//! library store. It drives exactly one [`AudioTransport`] and reacts to
//! its readiness/failure/completion events.
//!
//! All mutation goes through `&mut self`: callers provide the execution
//! affinity (see [`crate::service`] for the actor wrapper) and feed
//! transport events and periodic ticks into [`PlayerManager::on_transport_event`]
//! and [`PlayerManager::tick`].

use crate::bookmarks::BookmarkRecorder;
use crate::error::Result;
use crate::events::{NowPlaying, PlayerEvent};
use crate::rewind::SmartRewind;
use crate::settings::{PlaybackSettings, VOLUME_BOOSTED, VOLUME_NORMAL};
use crate::speed::{SpeedPolicy, MAX_SPEED, MIN_SPEED};
use crate::transport::{AudioTransport, TransportEvent, TransportState};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tome_core::{Adjacency, BookmarkKind, Chapter, LibraryStore, PlayableItem};
use tracing::{debug, error, info, warn};

/// Capacity of the player event channel
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Linear fade-out stepped once per tick while pausing
#[derive(Debug)]
struct FadeState {
    initial_volume: f32,
    steps_left: u32,
    total_steps: u32,
}

impl FadeState {
    fn new(initial_volume: f32, duration: Duration) -> Self {
        let total_steps = duration.as_secs().max(1) as u32;
        Self {
            initial_volume,
            steps_left: total_steps,
            total_steps,
        }
    }

    /// Volume for the next step, or `None` once the fade has completed
    fn step(&mut self) -> Option<f32> {
        if self.steps_left == 0 {
            return None;
        }
        self.steps_left -= 1;
        Some(self.initial_volume * self.steps_left as f32 / self.total_steps as f32)
    }
}

/// The playback engine
pub struct PlayerManager {
    transport: Box<dyn AudioTransport>,
    store: Arc<dyn LibraryStore>,
    speed: SpeedPolicy,
    rewind: SmartRewind,
    bookmarks: BookmarkRecorder,
    settings: PlaybackSettings,

    current_item: Option<PlayableItem>,
    /// A play command arrived before the transport was ready
    pending_play: bool,
    /// A prepare is in flight; the next `Failed` status is a load failure
    awaiting_ready: bool,
    /// End the session when the current chapter finishes (sleep timer)
    stop_after_chapter: bool,
    fade: Option<FadeState>,

    events: broadcast::Sender<PlayerEvent>,
    current_item_tx: watch::Sender<Option<PlayableItem>>,
    is_playing_tx: watch::Sender<bool>,
    now_playing_tx: watch::Sender<Option<NowPlaying>>,
}

impl PlayerManager {
    /// Create a player owning the given transport and store
    pub fn new(
        transport: Box<dyn AudioTransport>,
        store: Arc<dyn LibraryStore>,
        settings: PlaybackSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (current_item_tx, _) = watch::channel(None);
        let (is_playing_tx, _) = watch::channel(false);
        let (now_playing_tx, _) = watch::channel(None);

        Self {
            speed: SpeedPolicy::new(store.clone()),
            bookmarks: BookmarkRecorder::new(store.clone()),
            rewind: SmartRewind::new(),
            transport,
            store,
            settings,
            current_item: None,
            pending_play: false,
            awaiting_ready: false,
            stop_after_chapter: false,
            fade: None,
            events,
            current_item_tx,
            is_playing_tx,
            now_playing_tx,
        }
    }

    // === Observation ===

    /// Subscribe to discrete playback events
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// The event channel itself, for handles that hand out subscriptions
    pub(crate) fn events_sender(&self) -> broadcast::Sender<PlayerEvent> {
        self.events.clone()
    }

    /// Observable current item, updated on load and stop
    pub fn subscribe_current_item(&self) -> watch::Receiver<Option<PlayableItem>> {
        self.current_item_tx.subscribe()
    }

    /// Observable playing flag
    pub fn subscribe_is_playing(&self) -> watch::Receiver<bool> {
        self.is_playing_tx.subscribe()
    }

    /// Observable effective speed
    pub fn subscribe_speed(&self) -> watch::Receiver<f32> {
        self.speed.subscribe()
    }

    /// Observable now-playing snapshot
    pub fn subscribe_now_playing(&self) -> watch::Receiver<Option<NowPlaying>> {
        self.now_playing_tx.subscribe()
    }

    /// The loaded item, if any
    pub fn current_item(&self) -> Option<&PlayableItem> {
        self.current_item.as_ref()
    }

    /// Whether audio is currently rendering
    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    /// Whether the transport has a resource loaded or loading
    pub fn has_loaded_item(&self) -> bool {
        self.transport.loaded_resource().is_some()
    }

    /// The current effective speed
    pub fn current_speed(&self) -> f32 {
        self.speed.current()
    }

    /// Replace the playback settings
    pub fn set_settings(&mut self, settings: PlaybackSettings) {
        self.settings = settings;
    }

    /// Arm or disarm ending the session at the next chapter boundary
    pub fn set_stop_after_chapter(&mut self, flag: bool) {
        self.stop_after_chapter = flag;
    }

    // === Loading ===

    /// Load an item for playback, replacing whatever is loaded
    ///
    /// Loading is asynchronous: readiness or failure arrives later as a
    /// [`PlayerEvent::Ready`] or [`PlayerEvent::LoadFailed`] event.
    pub async fn load(&mut self, item: PlayableItem) {
        info!(relative_path = %item.relative_path, title = %item.title, "loading item");

        if self.current_item.is_some() {
            self.stop().await;
        }

        if item.chapters.is_empty() || item.duration <= 0.0 {
            warn!(relative_path = %item.relative_path, "item has no playable content");
            self.emit(PlayerEvent::LoadFailed {
                relative_path: item.relative_path,
            });
            return;
        }

        let chapter = item.current_chapter().clone();
        let chapter_index = item.current_chapter_index();
        self.current_item = Some(item);
        self.current_item_tx.send_replace(self.current_item.clone());
        self.emit(PlayerEvent::ChapterChanged {
            title: chapter.title.clone(),
            index: chapter_index,
        });
        self.update_now_playing();
        self.load_chapter(&chapter);
    }

    /// Load an item and start playing once it is ready
    pub async fn play_item(&mut self, item: PlayableItem) {
        self.load(item).await;
        // a synchronous load failure clears the item; drop the intent too
        if self.current_item.is_some() {
            self.pending_play = true;
        }
    }

    fn load_chapter(&mut self, chapter: &Chapter) {
        if chapter.duration <= 0.0 {
            warn!(resource = %chapter.relative_path, "chapter has no duration");
            self.pending_play = false;
            if let Some(item) = self.current_item.take() {
                self.current_item_tx.send_replace(None);
                self.update_now_playing();
                self.emit(PlayerEvent::LoadFailed {
                    relative_path: item.relative_path,
                });
            }
            return;
        }

        self.awaiting_ready = true;
        self.transport.prepare(&chapter.relative_path);
    }

    // === Transport feedback ===

    /// Feed a transport event into the state machine
    pub async fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::StatusChanged(TransportState::ReadyToPlay) => {
                self.handle_ready().await;
            }
            TransportEvent::StatusChanged(TransportState::Failed) => {
                self.handle_failure();
            }
            TransportEvent::StatusChanged(state) => {
                self.is_playing_tx
                    .send_replace(state == TransportState::Playing);
            }
            TransportEvent::PlayedToEnd => {
                self.handle_playback_finished().await;
            }
        }
    }

    async fn handle_ready(&mut self) {
        // a readiness notification for a superseded load arrives while the
        // transport is already preparing something else
        if !self.transport.status().is_ready() {
            debug!("ignoring stale readiness notification");
            return;
        }
        self.awaiting_ready = false;
        let Some(item) = &self.current_item else {
            return;
        };
        let relative_path = item.relative_path.clone();
        let current_time = item.current_time;
        let duration = item.duration;

        let speed = self
            .speed
            .get_speed(&relative_path, self.settings.global_speed_enabled)
            .await;

        if current_time > 0.0 {
            // a book parked within a second of its end starts over
            let target = if current_time + 1.0 >= duration {
                0.0
            } else {
                current_time
            };
            self.jump_to(target, false).await;
        }

        if let Err(error) = self
            .store
            .update_last_play_date(&relative_path, Utc::now())
            .await
        {
            warn!(%relative_path, %error, "failed to record play date");
        }

        self.update_now_playing();
        self.emit(PlayerEvent::Ready {
            relative_path,
            speed,
        });

        if self.pending_play {
            self.pending_play = false;
            if !self.transport.is_playing() {
                if let Err(error) = self.play().await {
                    warn!(%error, "queued play failed");
                }
            }
        } else {
            self.tick().await;
        }
    }

    fn handle_failure(&mut self) {
        self.is_playing_tx.send_replace(false);

        if !self.awaiting_ready {
            self.emit(PlayerEvent::TransportFailed {
                message: "playback failed".to_string(),
            });
            return;
        }

        // the prepare we issued failed: unload and report
        self.awaiting_ready = false;
        self.pending_play = false;
        if let Some(item) = self.current_item.take() {
            error!(relative_path = %item.relative_path, "failed to load item");
            self.current_item_tx.send_replace(None);
            self.update_now_playing();
            self.emit(PlayerEvent::LoadFailed {
                relative_path: item.relative_path,
            });
        }
    }

    async fn handle_playback_finished(&mut self) {
        let Some(item) = &self.current_item else {
            return;
        };
        let relative_path = item.relative_path.clone();
        let on_last_chapter = item.on_last_chapter();
        let is_bound = item.is_bound_book;
        let current_time = item.current_time;

        debug!(%relative_path, on_last_chapter, "resource played to end");
        self.rewind.clear(&relative_path);
        self.is_playing_tx.send_replace(false);

        if self.stop_after_chapter {
            self.stop_after_chapter = false;
            self.pending_play = false;
            self.emit(PlayerEvent::BookEnded { relative_path });
            return;
        }

        if on_last_chapter {
            if let Err(error) = self.store.set_last_played_item(None).await {
                warn!(%error, "failed to clear last played item");
            }
            self.mark_as_completed(true).await;
            self.play_next_item(true).await;
        } else if is_bound {
            // nudge across the boundary; the next chapter's file loads and
            // playback resumes once it is ready
            self.pending_play = true;
            self.set_current_time(current_time + 0.1).await;
        }
    }

    // === Playback commands ===

    /// Start or resume playback
    ///
    /// No-op when nothing is loaded. If the transport is still preparing,
    /// the intent is remembered and resolved on readiness. An audio session
    /// failure aborts this attempt only.
    pub async fn play(&mut self) -> Result<()> {
        let Some(item) = &self.current_item else {
            return Ok(());
        };
        let relative_path = item.relative_path.clone();
        let saved_time = item.current_time;
        let is_bound = item.is_bound_book;
        let chapter_start = item.current_chapter().start;

        if !self.transport.status().is_ready() {
            debug!(%relative_path, "transport not ready, queueing play intent");
            self.pending_play = true;
            return Ok(());
        }

        self.transport.activate_session()?;

        if let Err(error) = self
            .bookmarks
            .record(BookmarkKind::Play, &relative_path, saved_time)
            .await
        {
            warn!(%relative_path, %error, "failed to record play bookmark");
        }
        if let Err(error) = self.store.set_last_played_item(Some(&relative_path)).await {
            warn!(%error, "failed to record last played item");
        }
        if let Err(error) = self
            .store
            .update_last_play_date(&relative_path, Utc::now())
            .await
        {
            warn!(%error, "failed to record play date");
        }

        let raw_position = self.transport.position().max(0.0);
        let global_position = if is_bound {
            raw_position + chapter_start
        } else {
            raw_position
        };
        if let Some(item) = &self.current_item {
            if item.is_completed_at(global_position) {
                debug!(%relative_path, "item already at its end, not starting playback");
                return Ok(());
            }
        }

        if self.settings.smart_rewind_enabled {
            if let Some(offset) = self.rewind.take_offset(&relative_path, Utc::now()) {
                let target = (raw_position - offset).max(0.0);
                debug!(%relative_path, offset, "applying smart rewind");
                self.transport.seek(target);
            }
        }

        self.fade = None;
        self.transport.set_volume(self.playback_volume());
        let rate = self.speed.current();
        self.transport.play(rate);
        self.is_playing_tx.send_replace(true);
        self.emit(PlayerEvent::Played { relative_path });
        Ok(())
    }

    /// Pause playback, optionally fading the volume out first
    ///
    /// The paused state is effective immediately: the event fires and any
    /// queued play intent is dropped before the fade completes.
    pub async fn pause(&mut self, fade: bool) {
        let Some(item) = &self.current_item else {
            return;
        };
        let relative_path = item.relative_path.clone();

        self.pending_play = false;
        if let Err(error) = self.store.set_last_played_item(Some(&relative_path)).await {
            warn!(%error, "failed to record last played item");
        }
        self.rewind.record_pause(&relative_path, Utc::now());
        self.is_playing_tx.send_replace(false);
        self.emit(PlayerEvent::Paused { relative_path });

        if fade && self.transport.is_playing() {
            self.fade = Some(FadeState::new(
                self.transport.volume(),
                self.settings.fade_out,
            ));
        } else {
            self.fade = None;
            self.finish_pause();
        }
    }

    /// Toggle between play and pause
    pub async fn play_pause(&mut self) -> Result<()> {
        if self.transport.is_playing() {
            self.pause(false).await;
            Ok(())
        } else {
            self.play().await
        }
    }

    /// Stop playback and unload the current item
    pub async fn stop(&mut self) {
        self.pending_play = false;
        self.awaiting_ready = false;
        self.fade = None;
        self.transport.pause();
        self.transport.unload();
        self.transport.deactivate_session();

        if let Err(error) = self.store.set_last_played_item(None).await {
            warn!(%error, "failed to clear last played item");
        }

        if let Some(item) = self.current_item.take() {
            info!(relative_path = %item.relative_path, "stopped playback");
            self.current_item_tx.send_replace(None);
            self.is_playing_tx.send_replace(false);
            self.now_playing_tx.send_replace(None);
            self.emit(PlayerEvent::Stopped {
                relative_path: item.relative_path,
            });
        }
    }

    // === Seeking ===

    /// Seek to a global position, clamped into `[0, duration]`
    ///
    /// `record_bookmark` moves the automatic skip bookmark to the position
    /// being left. For bound books a cross-chapter jump loads the target
    /// chapter's file and finishes the seek once it is ready.
    pub async fn jump_to(&mut self, time: f64, record_bookmark: bool) {
        let Some(item) = &self.current_item else {
            return;
        };
        let relative_path = item.relative_path.clone();
        let leaving_time = item.current_time;
        let bounded = item.clamped_time(time);
        let is_bound = item.is_bound_book;

        if record_bookmark {
            if let Err(error) = self
                .bookmarks
                .record(BookmarkKind::Skip, &relative_path, leaving_time)
                .await
            {
                warn!(%relative_path, %error, "failed to record skip bookmark");
            }
        }

        // seeking while paused counts as a pause for smart rewind
        let was_playing = self.transport.is_playing();
        if !was_playing {
            self.rewind.record_pause(&relative_path, Utc::now());
        }

        let chapter_changed = self.set_current_time(bounded).await;
        if chapter_changed && is_bound {
            // the target chapter's file is loading; the seek completes on
            // its readiness, and playback resumes if it was running
            if was_playing {
                self.pending_play = true;
            }
            return;
        }

        let target = if is_bound {
            self.current_item
                .as_ref()
                .map(|item| item.chapter_relative_time(bounded))
                .unwrap_or(bounded)
        } else {
            bounded
        };
        self.transport.seek(target);
        self.update_now_playing();
    }

    /// Skip forward by the configured interval
    pub async fn forward(&mut self) {
        let Some(target) = self
            .current_item
            .as_ref()
            .map(|item| item.current_time + self.settings.forward_interval)
        else {
            return;
        };
        self.jump_to(target, true).await;
    }

    /// Skip backward by the configured interval
    pub async fn rewind(&mut self) {
        let Some(target) = self
            .current_item
            .as_ref()
            .map(|item| item.current_time - self.settings.rewind_interval)
        else {
            return;
        };
        self.jump_to(target, true).await;
    }

    // === Speed ===

    /// Set the playback speed, clamped into `[MIN_SPEED, MAX_SPEED]`
    ///
    /// Persisted per-item (and globally when global speed is enabled) and
    /// applied to the transport immediately when playing.
    pub async fn set_speed(&mut self, speed: f32) {
        let speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        let relative_path = self
            .current_item
            .as_ref()
            .map(|item| item.relative_path.clone());
        self.speed
            .set_speed(
                speed,
                relative_path.as_deref(),
                self.settings.global_speed_enabled,
            )
            .await;

        if self.transport.is_playing() {
            self.transport.set_rate(speed);
        }
        self.update_now_playing();
    }

    // === Completion and navigation ===

    /// Mark the loaded item finished or unfinished
    pub async fn mark_as_completed(&mut self, flag: bool) {
        let Some(item) = &self.current_item else {
            return;
        };
        let relative_path = item.relative_path.clone();
        if let Err(error) = self.store.mark_finished(&relative_path, flag).await {
            warn!(%relative_path, %error, "failed to mark item finished");
        }
        self.emit(PlayerEvent::BookEnded { relative_path });
    }

    /// Load and play the next item in the surrounding collection
    ///
    /// When `autoplayed`, the request is dropped unless autoplay is enabled
    /// and finished items are skipped over.
    pub async fn play_next_item(&mut self, autoplayed: bool) {
        if autoplayed && !self.settings.autoplay_enabled {
            return;
        }
        let Some((relative_path, parent_folder)) = self
            .current_item
            .as_ref()
            .map(|item| (item.relative_path.clone(), item.parent_folder.clone()))
        else {
            return;
        };

        match self
            .store
            .adjacent_item(
                &relative_path,
                parent_folder.as_deref(),
                Adjacency::After,
                autoplayed,
            )
            .await
        {
            Ok(Some(next)) => self.play_item(next).await,
            Ok(None) => debug!(%relative_path, "no next item"),
            Err(error) => warn!(%relative_path, %error, "failed to resolve next item"),
        }
    }

    /// Load and play the previous item in the surrounding collection
    pub async fn play_previous_item(&mut self) {
        let Some((relative_path, parent_folder)) = self
            .current_item
            .as_ref()
            .map(|item| (item.relative_path.clone(), item.parent_folder.clone()))
        else {
            return;
        };

        match self
            .store
            .adjacent_item(
                &relative_path,
                parent_folder.as_deref(),
                Adjacency::Before,
                false,
            )
            .await
        {
            Ok(Some(previous)) => self.play_item(previous).await,
            Ok(None) => debug!(%relative_path, "no previous item"),
            Err(error) => warn!(%relative_path, %error, "failed to resolve previous item"),
        }
    }

    // === Periodic tick ===

    /// Advance time-driven behavior: pause fade steps and position updates
    ///
    /// Expected roughly once per second while the player is alive. Position
    /// updates only happen while a resource is ready; persistence rides
    /// along with every update.
    pub async fn tick(&mut self) {
        if let Some(mut fade) = self.fade.take() {
            match fade.step() {
                Some(volume) if volume > 0.0 => {
                    self.transport.set_volume(volume);
                    self.fade = Some(fade);
                }
                _ => self.finish_pause(),
            }
        }

        if self.current_item.is_none() || !self.transport.status().is_ready() {
            return;
        }

        // some backends report slightly negative positions right after a
        // chapter switch
        let raw_position = self.transport.position();
        let position = if raw_position < 0.0 { 0.05 } else { raw_position };

        let Some((global, relative_path, duration)) = self.current_item.as_ref().map(|item| {
            let global = if item.is_bound_book {
                position + item.current_chapter().start
            } else {
                position
            };
            (global, item.relative_path.clone(), item.duration)
        }) else {
            return;
        };

        self.set_current_time(global).await;

        let time = self
            .current_item
            .as_ref()
            .map(|item| item.current_time)
            .unwrap_or(global);
        self.update_now_playing();
        self.emit(PlayerEvent::PositionUpdated {
            relative_path,
            time,
            duration,
        });
    }

    // === Internals ===

    /// Move the owned position, persist it, and resolve the active chapter
    ///
    /// Returns whether the active chapter changed. A bound-book chapter
    /// change starts loading the new chapter's file.
    async fn set_current_time(&mut self, time: f64) -> bool {
        let Some(item) = self.current_item.as_mut() else {
            return false;
        };

        let previous_index = item.current_chapter_index();
        item.current_time = item.clamped_time(time);
        let new_index = item.current_chapter_index();
        let chapter_changed = new_index != previous_index;

        let relative_path = item.relative_path.clone();
        let time = item.current_time;
        let chapter = item.current_chapter();
        let chapter_title = chapter.title.clone();
        let chapter_resource = chapter.relative_path.clone();

        if chapter_changed {
            debug!(%relative_path, index = new_index, "active chapter changed");
            self.emit(PlayerEvent::ChapterChanged {
                title: chapter_title,
                index: new_index,
            });
            if self.transport.loaded_resource() != Some(chapter_resource.as_str()) {
                self.awaiting_ready = true;
                self.transport.prepare(&chapter_resource);
            }
        }

        if let Err(error) = self.store.update_playback_time(&relative_path, time).await {
            warn!(%relative_path, %error, "failed to persist playback time");
        }

        chapter_changed
    }

    fn finish_pause(&mut self) {
        self.transport.pause();
        self.transport.set_volume(self.playback_volume());
        self.transport.deactivate_session();
    }

    fn playback_volume(&self) -> f32 {
        if self.settings.boost_volume_enabled {
            VOLUME_BOOSTED
        } else {
            VOLUME_NORMAL
        }
    }

    fn update_now_playing(&self) {
        let snapshot = self.current_item.as_ref().map(|item| NowPlaying {
            chapter_title: item.current_chapter().title.clone(),
            book_title: item.title.clone(),
            author: item.author.clone(),
            time: item.current_time,
            duration: item.duration,
            rate: self.speed.current(),
        });
        self.now_playing_tx.send_replace(snapshot);
    }

    fn emit(&self, event: PlayerEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}
