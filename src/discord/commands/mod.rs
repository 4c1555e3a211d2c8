pub mod listenmoe;

/// Show help for the bot's commands
#[poise::command(slash_command, prefix_command)]
pub async fn help(
    ctx: crate::discord::Context<'_>,
    #[description = "Command to show help for"] command: Option<String>,
) -> Result<(), anyhow::Error> {
    let config = poise::builtins::HelpConfiguration {
        extra_text_at_bottom: "Streams are provided by https://listen.moe",
        ..Default::default()
    };
    poise::builtins::help(ctx, command.as_deref(), config).await?;
    Ok(())
}

#[poise::command(prefix_command)]
pub async fn register(ctx: crate::discord::Context<'_>) -> Result<(), anyhow::Error> {
    poise::builtins::register_application_commands_buttons(ctx).await?;
    Ok(())
}

pub fn commands() -> Vec<poise::Command<super::Data, anyhow::Error>> {
    vec![register(), help(), listenmoe::listenmoe()]
}
