use std::sync::Arc;

use anyhow::{anyhow, Result};
use serenity::{
    all::{ChannelId, GuildId, Http},
    async_trait,
};

use crate::{
    error::PlaybackError,
    player::{Destination, ResilientStreamPlayer, SessionObserver, SongbirdBackend},
};

pub struct Data {
    pub player: ResilientStreamPlayer<SongbirdBackend>,
}
pub type Context<'a> = poise::Context<'a, Data, anyhow::Error>;

pub fn get_guild(ctx: Context<'_>) -> Result<GuildId> {
    ctx.guild_id()
        .ok_or_else(|| anyhow!("This command only works inside a server"))
}

/// The guild, plus the voice channel the author currently sits in (if any).
pub fn get_destination(ctx: Context<'_>) -> Result<Destination> {
    let guild = ctx
        .guild()
        .ok_or_else(|| anyhow!("This command only works inside a server"))?;
    let channel = guild
        .voice_states
        .get(&ctx.author().id)
        .and_then(|voice_state| voice_state.channel_id);
    log::debug!("Author {} is in voice channel {channel:?}", ctx.author().id);

    Ok(Destination {
        guild: guild.id,
        channel,
    })
}

/// Reports a session that gave up in the text channel it was started from.
pub struct ChannelNotifier {
    http: Arc<Http>,
    channel: ChannelId,
}

impl ChannelNotifier {
    pub fn new(http: Arc<Http>, channel: ChannelId) -> Self {
        Self { http, channel }
    }
}

#[async_trait]
impl SessionObserver for ChannelNotifier {
    async fn session_failed(&self, guild: GuildId, url: &str, error: &PlaybackError) {
        let message = format!("Stopped streaming <{url}>: **{error}**");
        if let Err(e) = self.channel.say(self.http.clone(), message).await {
            log::error!("Could not report failure in guild {guild}: {e}");
        }
    }
}
