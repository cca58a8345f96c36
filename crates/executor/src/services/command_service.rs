use std::sync::Arc;

use common::params::RuntimeParams;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html::escape;
use tracing::{debug, info, warn};

pub const UNAUTHORIZED: &str = "Unauthorized access.";

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "snake_case", description = "Available commands:")]
pub enum Command {
    #[command(description = "show this list of commands")]
    Help,
    #[command(description = "show the current take-profit and stop-loss")]
    Settings,
    #[command(description = "set take-profit percent, e.g. /set_tp 2.5")]
    SetTp(String),
    #[command(description = "set stop-loss percent, e.g. /set_sl 1")]
    SetSl(String),
}

/// The only chat allowed to issue commands.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizedChat(pub ChatId);

/// Operator command responder. Runs until the dispatcher stops.
pub struct CommandService {
    bot: Bot,
    params: Arc<RuntimeParams>,
    chat: AuthorizedChat,
}

impl CommandService {
    pub fn new(bot: Bot, params: Arc<RuntimeParams>, chat_id: ChatId) -> Self {
        Self {
            bot,
            params,
            chat: AuthorizedChat(chat_id),
        }
    }

    pub async fn run(self) {
        info!("Starting Telegram command responder");
        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!("Failed to register bot commands: {}", e);
        }

        let handler = Update::filter_message()
            .filter_command::<Command>()
            .endpoint(answer);

        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.params, self.chat])
            .build()
            .dispatch()
            .await;

        info!("Telegram command responder stopped.");
    }
}

async fn answer(
    bot: Bot,
    msg: Message,
    cmd: Command,
    params: Arc<RuntimeParams>,
    chat: AuthorizedChat,
) -> ResponseResult<()> {
    let reply = handle_command(&cmd, msg.chat.id, chat, &params);
    bot.send_message(msg.chat.id, reply)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Applies a command and returns the reply text.
pub fn handle_command(
    cmd: &Command,
    from: ChatId,
    chat: AuthorizedChat,
    params: &RuntimeParams,
) -> String {
    debug!("Received {:?} from chat {}", cmd, from);
    if from != chat.0 {
        warn!("Unauthorized access: chat {} != {}", from, chat.0);
        return UNAUTHORIZED.to_string();
    }

    match cmd {
        Command::Help => escape(&Command::descriptions().to_string()),
        Command::Settings => settings_text(params),
        Command::SetTp(raw) => match parse_percent(raw)
            .and_then(|v| params.set_take_profit_pct(v).map_err(|e| e.to_string()))
        {
            Ok(()) => {
                info!("Take-profit set to {}%", params.take_profit_pct());
                format!("Take-profit set to <code>{}%</code>", params.take_profit_pct())
            }
            Err(reason) => rejection(raw, &reason),
        },
        Command::SetSl(raw) => match parse_percent(raw)
            .and_then(|v| params.set_stop_loss_pct(v).map_err(|e| e.to_string()))
        {
            Ok(()) => {
                info!("Stop-loss set to {}%", params.stop_loss_pct());
                format!("Stop-loss set to <code>{}%</code>", params.stop_loss_pct())
            }
            Err(reason) => rejection(raw, &reason),
        },
    }
}

fn settings_text(params: &RuntimeParams) -> String {
    format!(
        "<b>⚙️ Current settings</b>\n\
         - <i>Take profit</i>: <code>{}%</code>\n\
         - <i>Stop loss</i>: <code>{}%</code>",
        params.take_profit_pct(),
        params.stop_loss_pct()
    )
}

fn parse_percent(raw: &str) -> Result<f64, String> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return Err("a value is required".to_string());
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| "not a number".to_string())
}

fn rejection(raw: &str, reason: &str) -> String {
    warn!("Rejected parameter value {:?}: {}", raw, reason);
    format!(
        "Invalid value <code>{}</code>: {}. Expected a positive percentage.",
        escape(raw.trim()),
        escape(reason)
    )
}
