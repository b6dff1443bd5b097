//! Player service
//!
//! Wraps [`PlayerManager`] in a spawned task so the whole engine runs with
//! a single execution affinity: commands arrive over a channel, transport
//! events are drained from the transport's subscription, and a one-second
//! interval drives position updates and pause fades. [`Player`] is the
//! cloneable handle the rest of the application talks to.

use crate::error::{PlaybackError, Result};
use crate::events::{NowPlaying, PlayerEvent};
use crate::player::PlayerManager;
use crate::settings::PlaybackSettings;
use crate::transport::AudioTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tome_core::{LibraryStore, PlayableItem};
use tracing::{info, warn};

/// Commands accepted by the player task
#[derive(Debug)]
pub enum PlayerCommand {
    Load(PlayableItem),
    PlayItem(PlayableItem),
    Play,
    Pause { fade: bool },
    PlayPause,
    Stop,
    JumpTo { time: f64, record_bookmark: bool },
    Forward,
    Rewind,
    SetSpeed(f32),
    MarkAsCompleted(bool),
    PlayNext { autoplayed: bool },
    PlayPrevious,
    SetSettings(PlaybackSettings),
    SetStopAfterChapter(bool),
}

/// Cloneable handle to a running player task
#[derive(Clone)]
pub struct Player {
    commands: mpsc::Sender<PlayerCommand>,
    events: broadcast::Sender<PlayerEvent>,
    current_item: watch::Receiver<Option<PlayableItem>>,
    is_playing: watch::Receiver<bool>,
    speed: watch::Receiver<f32>,
    now_playing: watch::Receiver<Option<NowPlaying>>,
}

impl Player {
    /// Spawn the player task and return its handle
    ///
    /// Must be called within a tokio runtime. The task owns the transport
    /// and runs until every handle is dropped.
    pub fn spawn(
        transport: Box<dyn AudioTransport>,
        store: Arc<dyn LibraryStore>,
        settings: PlaybackSettings,
    ) -> Self {
        let transport_events = transport.subscribe();
        let manager = PlayerManager::new(transport, store, settings);

        let events = manager.events_sender();
        let current_item = manager.subscribe_current_item();
        let is_playing = manager.subscribe_is_playing();
        let speed = manager.subscribe_speed();
        let now_playing = manager.subscribe_now_playing();

        let (commands, receiver) = mpsc::channel(32);
        tokio::spawn(run(manager, receiver, transport_events));

        Self {
            commands,
            events,
            current_item,
            is_playing,
            speed,
            now_playing,
        }
    }

    /// Subscribe to discrete playback events
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    /// Observable current item
    pub fn current_item(&self) -> watch::Receiver<Option<PlayableItem>> {
        self.current_item.clone()
    }

    /// Observable playing flag
    pub fn is_playing(&self) -> watch::Receiver<bool> {
        self.is_playing.clone()
    }

    /// Observable effective speed
    pub fn speed(&self) -> watch::Receiver<f32> {
        self.speed.clone()
    }

    /// Observable now-playing snapshot
    pub fn now_playing(&self) -> watch::Receiver<Option<NowPlaying>> {
        self.now_playing.clone()
    }

    /// Load an item for playback
    pub async fn load(&self, item: PlayableItem) -> Result<()> {
        self.send(PlayerCommand::Load(item)).await
    }

    /// Load an item and play it once ready
    pub async fn play_item(&self, item: PlayableItem) -> Result<()> {
        self.send(PlayerCommand::PlayItem(item)).await
    }

    /// Start or resume playback
    pub async fn play(&self) -> Result<()> {
        self.send(PlayerCommand::Play).await
    }

    /// Pause playback, optionally fading out
    pub async fn pause(&self, fade: bool) -> Result<()> {
        self.send(PlayerCommand::Pause { fade }).await
    }

    /// Toggle play/pause
    pub async fn play_pause(&self) -> Result<()> {
        self.send(PlayerCommand::PlayPause).await
    }

    /// Stop and unload
    pub async fn stop(&self) -> Result<()> {
        self.send(PlayerCommand::Stop).await
    }

    /// Seek to a global position
    pub async fn jump_to(&self, time: f64, record_bookmark: bool) -> Result<()> {
        self.send(PlayerCommand::JumpTo {
            time,
            record_bookmark,
        })
        .await
    }

    /// Skip forward by the configured interval
    pub async fn forward(&self) -> Result<()> {
        self.send(PlayerCommand::Forward).await
    }

    /// Skip backward by the configured interval
    pub async fn rewind(&self) -> Result<()> {
        self.send(PlayerCommand::Rewind).await
    }

    /// Change the playback speed
    pub async fn set_speed(&self, speed: f32) -> Result<()> {
        self.send(PlayerCommand::SetSpeed(speed)).await
    }

    /// Mark the loaded item finished or unfinished
    pub async fn mark_as_completed(&self, flag: bool) -> Result<()> {
        self.send(PlayerCommand::MarkAsCompleted(flag)).await
    }

    /// Skip to the next item
    pub async fn play_next_item(&self, autoplayed: bool) -> Result<()> {
        self.send(PlayerCommand::PlayNext { autoplayed }).await
    }

    /// Skip to the previous item
    pub async fn play_previous_item(&self) -> Result<()> {
        self.send(PlayerCommand::PlayPrevious).await
    }

    /// Replace the playback settings
    pub async fn set_settings(&self, settings: PlaybackSettings) -> Result<()> {
        self.send(PlayerCommand::SetSettings(settings)).await
    }

    /// Arm or disarm stopping at the next chapter boundary
    pub async fn set_stop_after_chapter(&self, flag: bool) -> Result<()> {
        self.send(PlayerCommand::SetStopAfterChapter(flag)).await
    }

    async fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlaybackError::Transport("player task is gone".to_string()))
    }
}

async fn run(
    mut manager: PlayerManager,
    mut commands: mpsc::Receiver<PlayerCommand>,
    mut transport_events: broadcast::Receiver<crate::transport::TransportEvent>,
) {
    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut transport_open = true;

    info!("player task started");
    loop {
        tokio::select! {
            command = commands.recv() => {
                match command {
                    Some(command) => dispatch(&mut manager, command).await,
                    None => break,
                }
            }
            event = transport_events.recv(), if transport_open => {
                match event {
                    Ok(event) => manager.on_transport_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "transport event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("transport event stream closed");
                        transport_open = false;
                    }
                }
            }
            _ = ticker.tick() => {
                manager.tick().await;
            }
        }
    }
    info!("player task stopped");
}

async fn dispatch(manager: &mut PlayerManager, command: PlayerCommand) {
    match command {
        PlayerCommand::Load(item) => manager.load(item).await,
        PlayerCommand::PlayItem(item) => manager.play_item(item).await,
        PlayerCommand::Play => {
            if let Err(error) = manager.play().await {
                warn!(%error, "play failed");
            }
        }
        PlayerCommand::Pause { fade } => manager.pause(fade).await,
        PlayerCommand::PlayPause => {
            if let Err(error) = manager.play_pause().await {
                warn!(%error, "play/pause failed");
            }
        }
        PlayerCommand::Stop => manager.stop().await,
        PlayerCommand::JumpTo {
            time,
            record_bookmark,
        } => manager.jump_to(time, record_bookmark).await,
        PlayerCommand::Forward => manager.forward().await,
        PlayerCommand::Rewind => manager.rewind().await,
        PlayerCommand::SetSpeed(speed) => manager.set_speed(speed).await,
        PlayerCommand::MarkAsCompleted(flag) => manager.mark_as_completed(flag).await,
        PlayerCommand::PlayNext { autoplayed } => manager.play_next_item(autoplayed).await,
        PlayerCommand::PlayPrevious => manager.play_previous_item().await,
        PlayerCommand::SetSettings(settings) => manager.set_settings(settings),
        PlayerCommand::SetStopAfterChapter(flag) => manager.set_stop_after_chapter(flag),
    }
}
