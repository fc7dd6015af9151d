//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, info, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

use super::ui_builder::{format_counts, join_keyboard, main_menu_keyboard};
use super::BotContext;

/// Commands the bot understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Reload,
}

/// Parse the first word of a message as a command, ignoring `@botname`
pub fn parse_command(text: &str) -> Option<Command> {
    let word = text.split_whitespace().next()?;
    let name = word.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or_default();
    match name.to_lowercase().as_str() {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        "reload" => Some(Command::Reload),
        _ => None,
    }
}

async fn handle_start(bot: &Bot, msg: &Message, ctx: &BotContext, language_code: Option<&str>) -> Result<()> {
    if let Some(user) = msg.from.as_ref() {
        if !ctx.gate.check(bot, user.id).await {
            bot.send_message(msg.chat.id, t_lang("join-required", language_code))
                .reply_markup(join_keyboard(&ctx.gate, language_code))
                .await?;
            return Ok(());
        }
    }

    let catalog = ctx.store.snapshot();
    let keyboard = main_menu_keyboard(&catalog, ctx.config.contact_url.as_deref(), language_code);
    bot.send_message(msg.chat.id, t_lang("welcome", language_code))
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

async fn handle_reload(bot: &Bot, msg: &Message, ctx: &BotContext, language_code: Option<&str>) -> Result<()> {
    let allowed = msg
        .from
        .as_ref()
        .is_some_and(|user| ctx.config.is_admin(user.id.0));
    if !allowed {
        warn!(chat_id = %msg.chat.id, "Rejected /reload from non-admin");
        bot.send_message(msg.chat.id, t_lang("reload-denied", language_code))
            .await?;
        return Ok(());
    }

    let loader = ctx.loader.clone();
    let catalog = tokio::task::spawn_blocking(move || loader.load()).await?;
    ctx.store.replace(catalog);
    let catalog = ctx.store.snapshot();
    info!(chat_id = %msg.chat.id, sections = catalog.sections().len(), "Catalog reloaded on request");

    let counts = format_counts(&catalog, language_code);
    let keyboard = main_menu_keyboard(&catalog, ctx.config.contact_url.as_deref(), language_code);
    bot.send_message(
        msg.chat.id,
        t_args_lang("reload-done", &[("counts", counts.as_str())], language_code),
    )
    .reply_markup(keyboard)
    .await?;
    Ok(())
}

pub async fn message_handler(bot: Bot, msg: Message, ctx: Arc<BotContext>) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    debug!(chat_id = %msg.chat.id, message_length = text.len(), "Received text message");

    // Extract user's language code from Telegram
    let language_code = msg
        .from
        .as_ref()
        .and_then(|user| user.language_code.as_deref());

    match parse_command(text) {
        Some(Command::Start) => handle_start(&bot, &msg, &ctx, language_code).await?,
        Some(Command::Reload) => handle_reload(&bot, &msg, &ctx, language_code).await?,
        Some(Command::Help) => {
            bot.send_message(msg.chat.id, t_lang("help-text", language_code))
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, t_lang("text-hint", language_code))
                .await?;
        }
    }

    Ok(())
}
