use std::sync::Arc;

use anyhow::Result;
use poise::command;

use crate::{
    discord::{
        common::{get_destination, get_guild, ChannelNotifier},
        Context,
    },
    error::{PlaybackError, StopOutcome},
    player::SessionObserver,
    station::Station,
};

/// Interact with Listen.moe
#[command(
    slash_command,
    prefix_command,
    guild_only,
    subcommands("play", "stop", "status"),
    subcommand_required
)]
pub async fn listenmoe(_ctx: Context<'_>) -> Result<()> {
    Ok(())
}

/// Join your voice channel and play the stream specified
#[command(slash_command, prefix_command, guild_only)]
pub async fn play(
    ctx: Context<'_>,
    #[description = "Stream to play: 1 for J-Pop, 2 for K-Pop"] audio_stream: i64,
) -> Result<()> {
    let station = Station::from_selector(audio_stream);
    let destination = get_destination(ctx)?;
    log::debug!("Playing stream link: {}", station.url());

    ctx.defer().await?;
    let notifier: Arc<dyn SessionObserver> = Arc::new(ChannelNotifier::new(
        ctx.serenity_context().http.clone(),
        ctx.channel_id(),
    ));
    let player = &ctx.data().player;
    match player.start(destination, station.url(), Some(notifier)).await {
        Ok(session) => {
            log::info!("Started {station} in guild {}", session.guild());
            ctx.say(format!("Now streaming **Listen.moe {station}**. Enjoy!"))
                .await?;
        }
        Err(PlaybackError::NoJoinTarget) => {
            ctx.say("Where should I play those tunes? Join a voice channel first.")
                .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Stop playing music and leave the channel
#[command(slash_command, prefix_command, guild_only)]
pub async fn stop(ctx: Context<'_>) -> Result<()> {
    let guild = get_guild(ctx)?;

    match ctx.data().player.stop(guild).await? {
        StopOutcome::Stopped => ctx.say("Stopped streaming. Bye!").await?,
        StopOutcome::NothingToStop => ctx.say("I'm not playing anything here.").await?,
    };

    Ok(())
}

/// Show what is streaming in this server
#[command(slash_command, prefix_command, guild_only)]
pub async fn status(ctx: Context<'_>) -> Result<()> {
    let guild = get_guild(ctx)?;

    let text = match ctx.data().player.session(guild).await {
        Some(session) => format!("**{}**: <{}>", session.state(), session.url()),
        None => "Nothing is streaming here".to_owned(),
    };
    ctx.say(text).await?;

    Ok(())
}
