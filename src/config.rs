use std::time::Duration;

use crate::{discord, player::RestartPolicy};
use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use serenity::client::Client as DiscordClient;
use simple_logger::SimpleLogger;

#[derive(Parser, Clone)]
#[clap(version, about)]
pub struct Config {
    #[clap(long, env = "LISTENMOE_DISCORD_TOKEN", hide_env_values = true)]
    discord_token: String,
    /// Register commands on this guild only, instead of globally
    #[clap(long, env = "LISTENMOE_DISCORD_GUILD")]
    discord_guild: Option<u64>,
    #[clap(long, env = "LISTENMOE_LOG_LEVEL", default_value = "info")]
    log_level: LevelFilter,
    /// Consecutive restarts of a stalled stream before giving up
    #[clap(long, env = "LISTENMOE_MAX_RESTARTS", default_value_t = 5)]
    max_restarts: u32,
    #[clap(long, env = "LISTENMOE_RESTART_MIN_DELAY_MS", default_value_t = 500)]
    restart_min_delay_ms: u64,
    #[clap(long, env = "LISTENMOE_RESTART_MAX_DELAY_MS", default_value_t = 30_000)]
    restart_max_delay_ms: u64,
}

impl Config {
    pub async fn discord(&self) -> Result<DiscordClient> {
        discord::create_client(
            &self.discord_token,
            self.discord_guild,
            self.restart_policy(),
        )
        .await
    }

    pub fn restart_policy(&self) -> RestartPolicy {
        let min_delay = Duration::from_millis(self.restart_min_delay_ms);
        RestartPolicy {
            max_restarts: self.max_restarts,
            min_delay,
            max_delay: Duration::from_millis(self.restart_max_delay_ms).max(min_delay),
        }
    }

    pub fn logger(&self) -> SimpleLogger {
        SimpleLogger::new()
            .with_level(LevelFilter::Warn)
            .with_module_level("listenmoe_radio", self.log_level)
    }
}
