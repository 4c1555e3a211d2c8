use crate::{
    discord::{commands, Data},
    player::{ResilientStreamPlayer, RestartPolicy, SongbirdBackend},
};
use anyhow::{anyhow, Result};
use poise::{samples::create_application_commands, Framework, PrefixFrameworkOptions};
use serenity::{
    all::{Command, GuildId, Ready, UserId},
    builder::CreateCommand,
    client::Client as DiscordClient,
    prelude::{Context, GatewayIntents},
};
use songbird::{SerenityInit, Songbird};

async fn on_error(error: poise::FrameworkError<'_, Data, anyhow::Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            let message = format!(
                "Error while running `{}`: **{}**",
                ctx.command().name,
                error
            );
            log::error!("{message}");
            ctx.say(message).await.ok();
        }
        poise::FrameworkError::Setup {
            error, framework, ..
        } => {
            // User data is never set after a failed setup.
            log::error!("Startup failed: {error}");
            framework.shard_manager().shutdown_all().await;
            std::process::exit(1);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                log::error!("Error while handling error: {e}");
            }
        }
    }
}

/// Fails with an invite link when the bot has not joined `guild`.
fn ensure_on_guild(guild: GuildId, joined: &[GuildId], bot: UserId) -> Result<()> {
    if joined.contains(&guild) {
        return Ok(());
    }
    let permissions = "3145728";
    let scope = "bot%20applications.commands";
    let invite_link = format!(
        "https://discord.com/oauth2/authorize?client_id={bot}&permissions={permissions}&scope={scope}"
    );
    Err(anyhow!(
        "The bot is not on guild {guild}. Invite it with:\n {invite_link}"
    ))
}

async fn on_startup(
    guild: Option<GuildId>,
    data: Data,
    create_commands: Vec<CreateCommand>,
    ctx: &Context,
    ready: &Ready,
) -> Result<Data> {
    log::info!("{} is connected!", ready.user.name);

    match guild {
        Some(guild) => {
            let joined: Vec<GuildId> = ready.guilds.iter().map(|x| x.id).collect();
            ensure_on_guild(guild, &joined, ready.user.id)?;
            guild.set_commands(&ctx.http, create_commands).await?;
            log::info!("Registered commands on guild {guild}");
        }
        None => {
            Command::set_global_commands(&ctx.http, create_commands).await?;
            log::info!("Registered global commands");
        }
    }

    Ok(data)
}

pub async fn create_client(
    token: &str,
    guild_id: Option<u64>,
    policy: RestartPolicy,
) -> Result<DiscordClient> {
    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;
    let commands = commands::commands();
    let manager = Songbird::serenity();
    let data = Data {
        player: ResilientStreamPlayer::new(SongbirdBackend::new(manager.clone()), policy),
    };
    let guild = guild_id.map(GuildId::new);

    let create_commands = create_application_commands(&commands);
    let options = poise::FrameworkOptions {
        commands,
        on_error: |e| Box::pin(on_error(e)),
        prefix_options: PrefixFrameworkOptions {
            prefix: Some("~".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    let framework = Framework::new(options, move |ctx, ready, _framework| {
        Box::pin(on_startup(guild, data, create_commands, ctx, ready))
    });

    let client = DiscordClient::builder(token, intents)
        .framework(framework)
        .register_songbird_with(manager)
        .await?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joined_guild_passes() {
        let guild = GuildId::new(7);
        assert!(ensure_on_guild(guild, &[GuildId::new(3), guild], UserId::new(99)).is_ok());
    }

    #[test]
    fn missing_guild_explains_how_to_invite() {
        let error = ensure_on_guild(GuildId::new(7), &[GuildId::new(3)], UserId::new(99))
            .unwrap_err()
            .to_string();
        assert!(error.contains("not on guild 7"));
        assert!(error.contains("client_id=99&permissions=3145728"));
    }
}
