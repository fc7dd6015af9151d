//! Document delivery: resolve a catalog entry on disk and send it

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, InputFile, MessageId, ParseMode};
use tracing::{debug, error, info, warn};

use crate::catalog::{Catalog, CatalogEntry};
use crate::localization::{t_args_lang, t_lang};

use super::ui_builder::{not_found_message, render_menu, MenuTarget};
use super::BotContext;

/// Edit a bot message, logging instead of failing when Telegram refuses
pub async fn edit_or_log(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
    parse_mode: Option<ParseMode>,
) {
    let mut request = bot.edit_message_text(chat_id, message_id, text);
    if let Some(keyboard) = keyboard {
        request = request.reply_markup(keyboard);
    }
    if let Some(parse_mode) = parse_mode {
        request = request.parse_mode(parse_mode);
    }
    if let Err(e) = request.await {
        warn!(chat_id = %chat_id, error = %e, "Failed to edit message");
    }
}

/// Resolve `entry` and send it to the chat, then show `back` again.
///
/// A missing file is reported in place of the menu message; it is not an error.
pub async fn deliver_entry(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    ctx: &BotContext,
    catalog: &Catalog,
    section: &str,
    entry: &CatalogEntry,
    back: MenuTarget,
    language_code: Option<&str>,
) -> Result<()> {
    let contact_url = ctx.config.contact_url.as_deref();
    let resolver = ctx.loader.resolver().clone();
    let section_root = ctx.loader.section_root(section);
    let declared_path = entry.declared_path.clone();
    let title = entry.title.clone();

    // Directory scans block, keep them off the async workers
    let resolved = tokio::task::spawn_blocking(move || {
        resolver.resolve_detailed(&declared_path, Some(&title), Some(&section_root))
    })
    .await?;

    let Some(resolved) = resolved else {
        warn!(
            chat_id = %chat_id,
            section = %section,
            declared_path = %entry.declared_path,
            title = %entry.title,
            "Catalog entry has no matching file on disk"
        );
        let (_, keyboard) = render_menu(&back, catalog, contact_url, language_code);
        edit_or_log(
            bot,
            chat_id,
            message_id,
            not_found_message(&entry.declared_path, language_code),
            Some(keyboard),
            Some(ParseMode::Html),
        )
        .await;
        return Ok(());
    };

    info!(
        chat_id = %chat_id,
        section = %section,
        declared_path = %entry.declared_path,
        resolved_path = %resolved.path.display(),
        strategy = ?resolved.strategy,
        "Sending catalog document"
    );
    edit_or_log(bot, chat_id, message_id, t_lang("sending", language_code), None, None).await;

    let mut document = InputFile::file(&resolved.path);
    if let Some(name) = resolved.path.file_name() {
        document = document.file_name(name.to_string_lossy().into_owned());
    }
    let mut request = bot.send_document(chat_id, document);
    if !entry.title.trim().is_empty() {
        request = request.caption(entry.title.clone());
    }
    match request.await {
        Ok(_) => debug!(chat_id = %chat_id, "Document sent"),
        Err(e) => {
            error!(chat_id = %chat_id, path = %resolved.path.display(), error = %e, "Failed to send document");
            let reason = e.to_string();
            bot.send_message(
                chat_id,
                t_args_lang("send-failed", &[("error", reason.as_str())], language_code),
            )
            .await?;
        }
    }

    let (text, keyboard) = render_menu(&back, catalog, contact_url, language_code);
    bot.send_message(chat_id, text).reply_markup(keyboard).await?;
    Ok(())
}
