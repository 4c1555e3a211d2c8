//! Resilient stream playback, one session per guild.

mod actor;
pub mod backend;
pub mod session;
pub mod voice;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use dashmap::DashMap;
use serenity::{
    all::{ChannelId, GuildId},
    async_trait,
};
use tokio::sync::{mpsc, watch, Mutex};

use crate::error::{PlaybackError, Result, StopOutcome};
use actor::Session;

pub use backend::{EventSink, PlayerEvent, PlayerHandle, VoiceBackend};
pub use session::{RestartPolicy, SessionState};
pub use voice::SongbirdBackend;

/// Where audio should go: a guild, and the voice channel the caller sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub guild: GuildId,
    pub channel: Option<ChannelId>,
}

/// Gets told when a session gives up for good.
#[async_trait]
pub trait SessionObserver: Send + Sync {
    async fn session_failed(&self, guild: GuildId, url: &str, error: &PlaybackError);
}

/// A view on a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    guild: GuildId,
    url: String,
    status: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub fn guild(&self) -> GuildId {
        self.guild
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> SessionState {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.status.clone()
    }
}

type Slot = Arc<Mutex<Option<Session>>>;

/// Forgets a session that already ended on its own.
async fn prune(current: &mut Option<Session>) {
    if current.as_ref().is_some_and(Session::is_over) {
        if let Some(session) = current.take() {
            log::debug!("Dropping finished session for {}", session.url);
            session.shutdown().await;
        }
    }
}

/// Keeps an internet radio stream playing in each guild it was started in.
///
/// Every guild has its own slot lock, so concurrent commands for one guild
/// are applied one after the other while different guilds never wait on
/// each other.
pub struct ResilientStreamPlayer<B> {
    backend: Arc<B>,
    policy: RestartPolicy,
    sessions: DashMap<GuildId, Slot>,
}

impl<B: VoiceBackend> ResilientStreamPlayer<B> {
    pub fn new(backend: B, policy: RestartPolicy) -> Self {
        Self {
            backend: Arc::new(backend),
            policy,
            sessions: DashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn slot(&self, guild: GuildId) -> Slot {
        self.sessions.entry(guild).or_default().clone()
    }

    /// Joins the destination and starts streaming `url`, replacing any
    /// session already running in that guild.
    pub async fn start(
        &self,
        destination: Destination,
        url: impl Into<String>,
        observer: Option<Arc<dyn SessionObserver>>,
    ) -> Result<SessionHandle> {
        let url = url.into();
        let guild = destination.guild;
        let channel = destination.channel.ok_or(PlaybackError::NoJoinTarget)?;

        let slot = self.slot(guild);
        let mut current = slot.lock().await;
        if let Some(previous) = current.take() {
            log::info!("Replacing stream {} in guild {guild}", previous.url);
            previous.shutdown().await;
        }

        log::debug!("Joining channel {channel} in guild {guild}");
        if let Err(e) = self.backend.join(guild, channel).await {
            if let Err(leave_error) = self.backend.leave(guild).await {
                log::error!("Could not leave guild {guild}: {leave_error}");
            }
            return Err(e);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let player = match self
            .backend
            .play(guild, &url, EventSink::new(0, tx.clone()))
            .await
        {
            Ok(player) => player,
            Err(e) => {
                if let Err(leave_error) = self.backend.leave(guild).await {
                    log::error!("Could not leave guild {guild}: {leave_error}");
                }
                return Err(e);
            }
        };
        log::info!("Playing {url} in channel {channel} of guild {guild}");

        let session = Session::spawn(
            guild,
            url.clone(),
            self.backend.clone(),
            self.policy.clone(),
            observer,
            player,
            tx,
            rx,
        );
        let handle = SessionHandle {
            guild,
            url,
            status: session.status.clone(),
        };
        *current = Some(session);

        Ok(handle)
    }

    /// Ends the guild's session and leaves its voice channel.
    pub async fn stop(&self, guild: GuildId) -> Result<StopOutcome> {
        let slot = self.slot(guild);
        let mut current = slot.lock().await;
        prune(&mut current).await;

        let had_session = match current.take() {
            Some(session) => {
                log::info!("Stopping {} in guild {guild}", session.url);
                session.shutdown().await;
                true
            }
            None => false,
        };
        let was_connected = self.backend.leave(guild).await?;

        if had_session || was_connected {
            Ok(StopOutcome::Stopped)
        } else {
            Ok(StopOutcome::NothingToStop)
        }
    }

    pub async fn session(&self, guild: GuildId) -> Option<SessionHandle> {
        let slot = self.sessions.get(&guild)?.clone();
        let mut current = slot.lock().await;
        prune(&mut current).await;
        current.as_ref().map(|session| SessionHandle {
            guild,
            url: session.url.clone(),
            status: session.status.clone(),
        })
    }

    pub async fn status(&self, guild: GuildId) -> Option<SessionState> {
        let slot = self.sessions.get(&guild)?.clone();
        let mut current = slot.lock().await;
        prune(&mut current).await;
        current.as_ref().map(Session::state)
    }
}
