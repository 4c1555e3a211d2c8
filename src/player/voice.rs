//! songbird-backed voice: joins calls, streams URLs over HTTP and forwards
//! track and driver events to the owning session.

use std::sync::Arc;

use serenity::{
    all::{ChannelId, GuildId},
    async_trait,
};
use songbird::{
    events::{CoreEvent, Event, EventContext, EventHandler as VoiceEventHandler, TrackEvent},
    input::HttpRequest,
    tracks::{PlayMode, TrackHandle},
    Songbird,
};

use super::backend::{EventSink, PlayerEvent, PlayerHandle, VoiceBackend};
use crate::error::{PlaybackError, Result};

pub struct SongbirdBackend {
    manager: Arc<Songbird>,
    http: reqwest::Client,
}

impl SongbirdBackend {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self {
            manager,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl VoiceBackend for SongbirdBackend {
    async fn join(&self, guild: GuildId, channel: ChannelId) -> Result<()> {
        self.manager
            .join(guild, channel)
            .await
            .map_err(|e| PlaybackError::JoinFailed(e.to_string()))?;
        log::info!("Joined channel {channel} in guild {guild}");
        Ok(())
    }

    async fn play(
        &self,
        guild: GuildId,
        url: &str,
        sink: EventSink,
    ) -> Result<Box<dyn PlayerHandle>> {
        let call = self
            .manager
            .get(guild)
            .ok_or_else(|| PlaybackError::PlaybackFailed("not in a voice channel".into()))?;
        let mut handler = call.lock().await;

        log::debug!("Creating audio resource for {url}");
        let input = HttpRequest::new(self.http.clone(), url.to_owned());
        let track = handler.play_only_input(input.into());

        handler.remove_all_global_events();
        handler.add_global_event(
            Event::Core(CoreEvent::DriverDisconnect),
            EventForwarder { sink: sink.clone() },
        );

        let track_events = [
            TrackEvent::Playable,
            TrackEvent::Play,
            TrackEvent::End,
            TrackEvent::Error,
        ];
        for event in track_events {
            let forwarder = EventForwarder { sink: sink.clone() };
            if let Err(e) = track.add_event(Event::Track(event), forwarder) {
                track.stop().ok();
                return Err(PlaybackError::PlaybackFailed(e.to_string()));
            }
        }

        Ok(Box::new(track))
    }

    async fn leave(&self, guild: GuildId) -> Result<bool> {
        if self.manager.get(guild).is_none() {
            return Ok(false);
        }
        self.manager
            .remove(guild)
            .await
            .map_err(|e| PlaybackError::Disconnect(e.to_string()))?;
        Ok(true)
    }
}

impl PlayerHandle for TrackHandle {
    fn stop(&self) {
        if let Err(e) = TrackHandle::stop(self) {
            log::debug!("Track {} was already gone: {e}", self.uuid());
        }
    }
}

struct EventForwarder {
    sink: EventSink,
}

#[async_trait]
impl VoiceEventHandler for EventForwarder {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let event = match ctx {
            EventContext::Track(&[(state, _handle), ..]) => match &state.playing {
                PlayMode::Play => PlayerEvent::Playing,
                PlayMode::End | PlayMode::Stop => PlayerEvent::Idle,
                PlayMode::Errored(e) => PlayerEvent::Errored(format!("{e:?}")),
                other => {
                    log::debug!("Audio player reported {other:?}");
                    return None;
                }
            },
            EventContext::DriverDisconnect(data) => {
                log::debug!("Voice driver disconnected: {:?}", data.reason);
                PlayerEvent::Disconnected
            }
            _ => return None,
        };

        if !self.sink.emit(event) {
            log::debug!("Session behind player {} is gone", self.sink.generation());
        }
        None
    }
}
