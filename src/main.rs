use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use courses_bot::bot::{self, BotContext};
use courses_bot::bot_config::BotConfig;
use courses_bot::health::start_health_server;
use courses_bot::localization::init_localization;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting courses Telegram bot");

    let config = BotConfig::from_env()?;
    init_localization()?;

    info!(
        base_dir = %config.base_dir.display(),
        catalog_file = %config.catalog_file.display(),
        membership_gate = config.required_channel.is_some(),
        "Configuration loaded"
    );

    let loader = config.catalog_loader();
    let catalog = tokio::task::spawn_blocking(move || loader.load()).await?;

    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = start_health_server(port).await {
            error!(error = %e, "Health server stopped");
        }
    });

    let telegram = Bot::new(config.token.clone());
    let ctx = Arc::new(BotContext::new(config, catalog));

    info!("Bot initialized, starting dispatcher");

    Dispatcher::builder(telegram, bot::schema())
        .dependencies(dptree::deps![ctx])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
