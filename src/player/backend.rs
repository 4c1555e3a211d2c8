//! The seam between the stream player and whatever actually speaks voice.

use serenity::{
    all::{ChannelId, GuildId},
    async_trait,
};
use tokio::sync::{mpsc, oneshot};

use crate::error::Result;

/// Status changes reported by the playback subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The resource became playable or started playing.
    Playing,
    /// Nothing is being consumed from the resource any more.
    Idle,
    Errored(String),
    /// The voice connection itself went away.
    Disconnected,
}

#[derive(Debug)]
pub(crate) enum SessionMessage {
    Player { generation: u64, event: PlayerEvent },
    Shutdown(oneshot::Sender<()>),
}

/// Where a backend reports the events of one player handle.
///
/// Every handle handed out by [`VoiceBackend::play`] gets its own sink, tagged
/// with the generation of that play request, so late events from a replaced
/// handle can be told apart from current ones.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<SessionMessage>,
}

impl EventSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<SessionMessage>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns `false` once the owning session is gone.
    pub fn emit(&self, event: PlayerEvent) -> bool {
        self.tx
            .send(SessionMessage::Player {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

pub trait PlayerHandle: Send + Sync {
    fn stop(&self);
}

#[async_trait]
pub trait VoiceBackend: Send + Sync + 'static {
    async fn join(&self, guild: GuildId, channel: ChannelId) -> Result<()>;

    /// Creates a resource for `url` and starts playing it, replacing whatever
    /// the guild's connection was playing before.
    async fn play(&self, guild: GuildId, url: &str, sink: EventSink)
        -> Result<Box<dyn PlayerHandle>>;

    /// Disconnects from the guild. Returns whether a connection existed.
    async fn leave(&self, guild: GuildId) -> Result<bool>;
}
