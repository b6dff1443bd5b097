//! End-to-end test for the spawned player task

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};
use tome_core::store::memory::MemoryLibraryStore;
use tome_core::{Chapter, PlayableItem};
use tome_playback::{
    AudioTransport, PlaybackSettings, Player, PlayerEvent, TransportEvent, TransportState,
};

#[derive(Debug)]
struct Shared {
    state: TransportState,
    prepared: Vec<String>,
}

struct ChannelTransport {
    shared: Arc<Mutex<Shared>>,
    events: broadcast::Sender<TransportEvent>,
    loaded: Option<String>,
}

impl ChannelTransport {
    fn new() -> (Self, Arc<Mutex<Shared>>, broadcast::Sender<TransportEvent>) {
        let shared = Arc::new(Mutex::new(Shared {
            state: TransportState::Idle,
            prepared: Vec::new(),
        }));
        let (events, _) = broadcast::channel(16);
        (
            Self {
                shared: shared.clone(),
                events: events.clone(),
                loaded: None,
            },
            shared,
            events,
        )
    }
}

impl AudioTransport for ChannelTransport {
    fn prepare(&mut self, resource: &str) {
        self.loaded = Some(resource.to_string());
        let mut shared = self.shared.lock().unwrap();
        shared.prepared.push(resource.to_string());
        shared.state = TransportState::Loading;
    }

    fn play(&mut self, _rate: f32) {
        self.shared.lock().unwrap().state = TransportState::Playing;
    }

    fn pause(&mut self) {
        self.shared.lock().unwrap().state = TransportState::Paused;
    }

    fn unload(&mut self) {
        self.loaded = None;
        self.shared.lock().unwrap().state = TransportState::Idle;
    }

    fn seek(&mut self, _seconds: f64) {}

    fn position(&self) -> f64 {
        0.0
    }

    fn rate(&self) -> f32 {
        1.0
    }

    fn set_rate(&mut self, _rate: f32) {}

    fn volume(&self) -> f32 {
        1.0
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn status(&self) -> TransportState {
        self.shared.lock().unwrap().state
    }

    fn loaded_resource(&self) -> Option<&str> {
        self.loaded.as_deref()
    }

    fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.events.subscribe()
    }
}

fn book(path: &str) -> PlayableItem {
    PlayableItem {
        relative_path: path.to_string(),
        title: "Book".to_string(),
        author: "Author".to_string(),
        duration: 100.0,
        current_time: 0.0,
        chapters: vec![Chapter {
            title: "Chapter 1".to_string(),
            start: 0.0,
            duration: 100.0,
            relative_path: path.to_string(),
        }],
        is_bound_book: false,
        parent_folder: None,
    }
}

async fn wait_for_event<F>(
    events: &mut broadcast::Receiver<PlayerEvent>,
    mut matches: F,
) -> PlayerEvent
where
    F: FnMut(&PlayerEvent) -> bool,
{
    timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if matches(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

#[tokio::test]
async fn spawned_player_plays_an_item_end_to_end() {
    let (transport, shared, transport_events) = ChannelTransport::new();
    let store = Arc::new(MemoryLibraryStore::new());
    let player = Player::spawn(Box::new(transport), store, PlaybackSettings::default());
    let mut events = player.subscribe_events();

    player.play_item(book("book")).await.unwrap();

    // wait for the task to issue the prepare
    timeout(Duration::from_secs(5), async {
        while shared.lock().unwrap().prepared.is_empty() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("prepare never happened");

    // readiness arrives over the transport's own event stream
    shared.lock().unwrap().state = TransportState::ReadyToPlay;
    transport_events
        .send(TransportEvent::StatusChanged(TransportState::ReadyToPlay))
        .unwrap();

    wait_for_event(&mut events, |event| {
        matches!(event, PlayerEvent::Ready { .. })
    })
    .await;
    wait_for_event(&mut events, |event| {
        matches!(event, PlayerEvent::Played { .. })
    })
    .await;
    assert_eq!(shared.lock().unwrap().state, TransportState::Playing);
    assert!(*player.is_playing().borrow());

    player.pause(false).await.unwrap();
    wait_for_event(&mut events, |event| {
        matches!(event, PlayerEvent::Paused { .. })
    })
    .await;
    assert_eq!(shared.lock().unwrap().state, TransportState::Paused);
}
