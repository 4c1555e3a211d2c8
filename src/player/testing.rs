//! In-memory voice backend for exercising sessions without Discord.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use serenity::{
    all::{ChannelId, GuildId},
    async_trait,
};
use tokio::sync::mpsc;

use super::{EventSink, PlayerHandle, SessionObserver, VoiceBackend};
use crate::error::{PlaybackError, Result};

pub struct PlayRequest {
    pub guild: GuildId,
    pub url: String,
    pub sink: EventSink,
}

#[derive(Default)]
struct FakeState {
    joins: Vec<(GuildId, ChannelId)>,
    connected: HashSet<GuildId>,
    fail_joins: bool,
    fail_plays: bool,
}

pub struct FakeVoice {
    state: Mutex<FakeState>,
    live: Arc<AtomicUsize>,
    plays: mpsc::UnboundedSender<PlayRequest>,
}

impl FakeVoice {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PlayRequest>) {
        let (plays, requests) = mpsc::unbounded_channel();
        let voice = Self {
            state: Mutex::default(),
            live: Arc::default(),
            plays,
        };
        (voice, requests)
    }

    pub fn fail_joins(&self) {
        self.state.lock().unwrap().fail_joins = true;
    }

    pub fn fail_plays(&self) {
        self.state.lock().unwrap().fail_plays = true;
    }

    pub fn connect(&self, guild: GuildId) {
        self.state.lock().unwrap().connected.insert(guild);
    }

    pub fn is_connected(&self, guild: GuildId) -> bool {
        self.state.lock().unwrap().connected.contains(&guild)
    }

    pub fn joins(&self) -> Vec<(GuildId, ChannelId)> {
        self.state.lock().unwrap().joins.clone()
    }

    /// Player handles handed out and not stopped yet.
    pub fn live_players(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceBackend for FakeVoice {
    async fn join(&self, guild: GuildId, channel: ChannelId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_joins {
            return Err(PlaybackError::JoinFailed("channel is full".into()));
        }
        state.joins.push((guild, channel));
        state.connected.insert(guild);
        Ok(())
    }

    async fn play(
        &self,
        guild: GuildId,
        url: &str,
        sink: EventSink,
    ) -> Result<Box<dyn PlayerHandle>> {
        {
            let state = self.state.lock().unwrap();
            if state.fail_plays {
                return Err(PlaybackError::PlaybackFailed("unsupported format".into()));
            }
            if !state.connected.contains(&guild) {
                return Err(PlaybackError::PlaybackFailed("not connected".into()));
            }
        }

        self.live.fetch_add(1, Ordering::SeqCst);
        let player = FakePlayer {
            live: self.live.clone(),
            stopped: AtomicBool::new(false),
        };
        self.plays
            .send(PlayRequest {
                guild,
                url: url.to_owned(),
                sink,
            })
            .ok();
        Ok(Box::new(player))
    }

    async fn leave(&self, guild: GuildId) -> Result<bool> {
        Ok(self.state.lock().unwrap().connected.remove(&guild))
    }
}

struct FakePlayer {
    live: Arc<AtomicUsize>,
    stopped: AtomicBool,
}

impl PlayerHandle for FakePlayer {
    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    failures: Mutex<Vec<(GuildId, String, PlaybackError)>>,
}

impl RecordingObserver {
    pub fn failures(&self) -> Vec<(GuildId, String, PlaybackError)> {
        self.failures.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionObserver for RecordingObserver {
    async fn session_failed(&self, guild: GuildId, url: &str, error: &PlaybackError) {
        self.failures
            .lock()
            .unwrap()
            .push((guild, url.to_owned(), error.clone()));
    }
}
