use anyhow::Result;
use clap::Parser;

use listenmoe_radio::Config;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = Config::parse();
    config.logger().init()?;

    let mut discord = config.discord().await?;
    log::info!("Initialized discord client.");

    discord.start().await?;

    Ok(())
}
