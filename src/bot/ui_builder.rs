//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html;

// Import localization
use crate::localization::{t_lang, t_opt};

// Import catalog types
use crate::catalog::{Catalog, CatalogGroup, CatalogItem};
use crate::membership::MembershipGate;

use super::callback_data::CallbackAction;

/// Buttons per row in every menu
pub const MENU_COLUMNS: usize = 2;

/// A menu screen the bot can show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuTarget {
    Main,
    Section(String),
    Group { section: String, group: usize },
}

/// Lay buttons out in rows of `cols`; the last row may be shorter
pub fn pretty_grid(buttons: Vec<InlineKeyboardButton>, cols: usize) -> Vec<Vec<InlineKeyboardButton>> {
    let cols = cols.max(1);
    let mut rows = Vec::with_capacity(buttons.len().div_ceil(cols));
    let mut row = Vec::with_capacity(cols);
    for button in buttons {
        row.push(button);
        if row.len() == cols {
            rows.push(std::mem::replace(&mut row, Vec::with_capacity(cols)));
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }
    rows
}

/// Localized section label, or the raw key for sections without one
pub fn section_label(key: &str, language_code: Option<&str>) -> String {
    t_opt(&format!("section-{key}"), language_code).unwrap_or_else(|| key.to_string())
}

fn callback(text: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.to_data())
}

fn url_button(text: String, url: &str) -> Option<InlineKeyboardButton> {
    match reqwest::Url::parse(url) {
        Ok(url) => Some(InlineKeyboardButton::url(text, url)),
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Skipping button with invalid URL");
            None
        }
    }
}

/// Sections in a grid plus the optional contact button
pub fn main_menu_keyboard(
    catalog: &Catalog,
    contact_url: Option<&str>,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut buttons: Vec<InlineKeyboardButton> = catalog
        .sections()
        .iter()
        .map(|section| {
            callback(
                section_label(&section.key, language_code),
                CallbackAction::Section(section.key.clone()),
            )
        })
        .collect();

    if let Some(button) =
        contact_url.and_then(|url| url_button(t_lang("contact-admin", language_code), url))
    {
        buttons.push(button);
    }

    InlineKeyboardMarkup::new(pretty_grid(buttons, MENU_COLUMNS))
}

/// Entries and groups of one section, then a back button
pub fn section_keyboard(
    catalog: &Catalog,
    section: &str,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let items = catalog
        .section(section)
        .map(|s| s.items.as_slice())
        .unwrap_or_default();

    let buttons = items
        .iter()
        .enumerate()
        .map(|(idx, item)| match item {
            CatalogItem::Group(group) => callback(
                format!("📚 {}", or_fallback(&group.title, "group-fallback", language_code)),
                CallbackAction::Group {
                    section: section.to_string(),
                    group: idx,
                },
            ),
            CatalogItem::Entry(entry) => callback(
                or_fallback(&entry.title, "file-fallback", language_code),
                CallbackAction::Item {
                    section: section.to_string(),
                    item: idx,
                },
            ),
        })
        .collect();

    let mut rows = pretty_grid(buttons, MENU_COLUMNS);
    rows.push(vec![callback(
        t_lang("back-to-main", language_code),
        CallbackAction::MainMenu,
    )]);
    InlineKeyboardMarkup::new(rows)
}

/// Children of a group, then a button back to its section
pub fn group_keyboard(
    section: &str,
    group_idx: usize,
    group: &CatalogGroup,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let buttons = group
        .children
        .iter()
        .enumerate()
        .map(|(idx, child)| {
            let label = if child.title.trim().is_empty() {
                format!("{} {}", t_lang("file-fallback", language_code), idx + 1)
            } else {
                child.title.clone()
            };
            callback(
                label,
                CallbackAction::Child {
                    section: section.to_string(),
                    group: group_idx,
                    child: idx,
                },
            )
        })
        .collect();

    let mut rows = pretty_grid(buttons, MENU_COLUMNS);
    rows.push(vec![callback(
        t_lang("back-to-section", language_code),
        CallbackAction::Section(section.to_string()),
    )]);
    InlineKeyboardMarkup::new(rows)
}

/// Text and keyboard for a menu screen.
///
/// A section or group missing from `catalog` falls back to the main menu.
pub fn render_menu(
    target: &MenuTarget,
    catalog: &Catalog,
    contact_url: Option<&str>,
    language_code: Option<&str>,
) -> (String, InlineKeyboardMarkup) {
    match target {
        MenuTarget::Section(section) if catalog.section(section).is_some() => (
            section_label(section, language_code),
            section_keyboard(catalog, section, language_code),
        ),
        MenuTarget::Group { section, group } => match catalog.group(section, *group) {
            Some(found) => (
                t_lang("choose-from-group", language_code),
                group_keyboard(section, *group, found, language_code),
            ),
            None => render_menu(&MenuTarget::Main, catalog, contact_url, language_code),
        },
        _ => {
            let text = if catalog.is_empty() {
                t_lang("catalog-empty", language_code)
            } else {
                t_lang("choose-section", language_code)
            };
            (text, main_menu_keyboard(catalog, contact_url, language_code))
        }
    }
}

/// Prompt shown to users who have not joined the required channel
pub fn join_keyboard(gate: &MembershipGate, language_code: Option<&str>) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if let Some(button) = gate
        .channel_url()
        .and_then(|url| url_button(t_lang("join-channel-button", language_code), &url))
    {
        rows.push(vec![button]);
    }
    rows.push(vec![callback(
        t_lang("join-check-button", language_code),
        CallbackAction::CheckMembership,
    )]);
    InlineKeyboardMarkup::new(rows)
}

/// `label: count | label: count` in menu order
pub fn format_counts(catalog: &Catalog, language_code: Option<&str>) -> String {
    catalog
        .counts()
        .into_iter()
        .map(|(key, count)| format!("{}: {count}", section_label(key, language_code)))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// HTML message for a catalog entry whose file is missing
pub fn not_found_message(declared_path: &str, language_code: Option<&str>) -> String {
    format!(
        "{}\n<code>{}</code>",
        html::escape(&t_lang("file-not-found", language_code)),
        html::escape(declared_path)
    )
}

fn or_fallback(title: &str, fallback_key: &str, language_code: Option<&str>) -> String {
    if title.trim().is_empty() {
        t_lang(fallback_key, language_code)
    } else {
        title.to_string()
    }
}
