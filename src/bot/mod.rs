//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Handles `/start`, `/help`, `/reload` and plain text
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `callback_data`: Encodes and parses button callback data
//! - `ui_builder`: Creates keyboards and formats messages
//! - `document_sender`: Resolves catalog entries and sends the files

pub mod callback_data;
pub mod callback_handler;
pub mod document_sender;
pub mod message_handler;
pub mod ui_builder;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::bot_config::BotConfig;
use crate::catalog::{Catalog, CatalogLoader, CatalogStore};
use crate::membership::MembershipGate;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

// Re-export utility functions that might be used elsewhere
pub use callback_data::CallbackAction;
pub use ui_builder::{main_menu_keyboard, pretty_grid, render_menu, MenuTarget};

/// State shared by every handler invocation
pub struct BotContext {
    pub config: BotConfig,
    pub loader: CatalogLoader,
    pub store: CatalogStore,
    pub gate: MembershipGate,
}

impl BotContext {
    /// Wrap the configuration and an already loaded catalog
    pub fn new(config: BotConfig, catalog: Catalog) -> Self {
        Self {
            loader: config.catalog_loader(),
            gate: config.membership_gate(),
            store: CatalogStore::new(catalog),
            config,
        }
    }
}

/// Dispatcher tree: text messages and callback queries
pub fn schema() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler))
}
