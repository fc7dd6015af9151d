//! # Courses Telegram Bot
//!
//! A Telegram bot that presents a catalog of PDF/ZIP documents as inline
//! menus and sends the selected file, locating it on disk with a relaxed
//! resolver that tolerates stale or inconsistent catalog paths.

pub mod bot;
pub mod bot_config;
pub mod catalog;
pub mod catalog_errors;
pub mod health;
pub mod localization;
pub mod membership;
pub mod resolver;
