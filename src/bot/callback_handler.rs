//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{debug, warn};

// Import localization
use crate::localization::t_lang;

use super::callback_data::CallbackAction;
use super::document_sender::{deliver_entry, edit_or_log};
use super::ui_builder::{join_keyboard, render_menu, MenuTarget};
use super::BotContext;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, ctx: Arc<BotContext>) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    // Answer right away so the button stops spinning even if sending takes long
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    let Some(msg) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = msg.chat().id;
    let message_id = msg.id();
    let language_code = q.from.language_code.as_deref();

    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        debug!(user_id = %q.from.id, data = ?q.data, "Ignoring unknown callback data");
        return Ok(());
    };

    if !ctx.gate.check(&bot, q.from.id).await {
        let mut text = t_lang("join-required", language_code);
        if action == CallbackAction::CheckMembership {
            text = format!("{}\n{}", t_lang("join-still-missing", language_code), text);
        }
        edit_or_log(
            &bot,
            chat_id,
            message_id,
            text,
            Some(join_keyboard(&ctx.gate, language_code)),
            None,
        )
        .await;
        return Ok(());
    }

    let catalog = ctx.store.snapshot();
    let contact_url = ctx.config.contact_url.as_deref();

    let target = match action {
        CallbackAction::MainMenu | CallbackAction::CheckMembership => Some(MenuTarget::Main),
        CallbackAction::Section(section) => {
            catalog.section(&section).map(|_| MenuTarget::Section(section))
        }
        CallbackAction::Group { section, group } => catalog
            .group(&section, group)
            .map(|_| MenuTarget::Group { section, group }),
        CallbackAction::Item { section, item } => {
            if let Some(entry) = catalog.entry(&section, item) {
                let back = MenuTarget::Section(section.clone());
                return deliver_entry(
                    &bot, chat_id, message_id, &ctx, &catalog, &section, entry, back, language_code,
                )
                .await;
            }
            None
        }
        CallbackAction::Child {
            section,
            group,
            child,
        } => {
            if let Some(entry) = catalog.child(&section, group, child) {
                let back = MenuTarget::Group {
                    section: section.clone(),
                    group,
                };
                return deliver_entry(
                    &bot, chat_id, message_id, &ctx, &catalog, &section, entry, back, language_code,
                )
                .await;
            }
            None
        }
    };

    match target {
        Some(target) => {
            let (text, keyboard) = render_menu(&target, &catalog, contact_url, language_code);
            edit_or_log(&bot, chat_id, message_id, text, Some(keyboard), None).await;
        }
        None => {
            // Stale button, usually from before a reload
            debug!(user_id = %q.from.id, data = ?q.data, "Callback points at a missing catalog item");
            let (_, keyboard) = render_menu(&MenuTarget::Main, &catalog, contact_url, language_code);
            edit_or_log(
                &bot,
                chat_id,
                message_id,
                t_lang("item-unavailable", language_code),
                Some(keyboard),
                None,
            )
            .await;
        }
    }

    Ok(())
}
