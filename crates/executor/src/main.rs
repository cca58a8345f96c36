use std::sync::Arc;

use anyhow::Context;
use teloxide::prelude::*;
use tracing::{debug, error, info};

use common::config::{self, Settings};
use common::logger;
use common::params::RuntimeParams;
use market_data::BinanceClient;

use crate::services::command_service::CommandService;
use crate::services::signal_service::SignalService;
use crate::services::telegram_service::TelegramService;

mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_logger(config::log_file_from_env().as_deref())?;
    debug!("System starting up...");

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Configuration error: {}", e);
            return Err(e).context("Failed to load configuration");
        }
    };
    debug!("Loaded {:?}", settings);

    let params = Arc::new(
        RuntimeParams::new(settings.take_profit_pct, settings.stop_loss_pct)
            .context("Invalid take-profit/stop-loss settings")?,
    );
    let client = Arc::new(
        BinanceClient::new(settings.base_url.clone(), settings.fetch_timeout)
            .context("Failed to build exchange client")?
            .closed_candles_only(settings.closed_candles_only),
    );

    let bot = Bot::new(settings.telegram_token.clone());
    let chat_id = ChatId(settings.telegram_chat_id);
    let notifier = Arc::new(TelegramService::new(bot.clone(), chat_id));

    let commands = CommandService::new(bot, params.clone(), chat_id);
    tokio::spawn(commands.run());

    let mut service = SignalService::new(&settings, client, notifier, params);

    tokio::select! {
        result = service.run() => {
            if let Err(e) = result {
                info!("Exiting in {}s", settings.restart_backoff.as_secs());
                tokio::time::sleep(settings.restart_backoff).await;
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Bot stopped by user (Ctrl-C)");
        }
    }

    Ok(())
}
