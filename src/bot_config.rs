//! # Bot Configuration Module
//!
//! Runtime settings read from the environment (after `.env` is loaded by
//! `main`). Every setting except the token has a default.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::catalog::CatalogLoader;
use crate::membership::{MembershipFallback, MembershipGate};
use crate::resolver::RelaxedResolver;

// Defaults
pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_ASSETS_DIR: &str = "assets";
pub const DEFAULT_CATALOG_FILE: &str = "catalog.json";
pub const DEFAULT_CONTACT_URL: &str = "https://t.me/";

/// Token variables, first non-empty one wins
pub const TOKEN_VARS: [&str; 2] = ["TELEGRAM_TOKEN", "BOT_TOKEN"];

/// Configuration for the courses bot
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram bot token
    pub token: String,
    /// Directory catalog paths are relative to
    pub base_dir: PathBuf,
    /// Directory holding one sub-directory per section
    pub assets_dir: PathBuf,
    /// Catalog JSON document
    pub catalog_file: PathBuf,
    /// Health server port
    pub port: u16,
    /// Channel users must join, `@username` or numeric id
    pub required_channel: Option<String>,
    /// What to do when the membership check itself fails
    pub membership_fallback: MembershipFallback,
    /// Contact button target, `None` hides the button
    pub contact_url: Option<String>,
    /// Users allowed to run `/reload`; empty means everyone
    pub admin_ids: Vec<u64>,
}

impl BotConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup, mainly for tests
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let Some(token) = TOKEN_VARS.iter().find_map(|key| get(*key)) else {
            bail!("Set TELEGRAM_TOKEN (or BOT_TOKEN) in the environment");
        };

        let base_dir = match get("BASE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir().context("Cannot determine working directory")?,
        };
        let assets_dir = get("ASSETS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| base_dir.join(DEFAULT_ASSETS_DIR));
        let catalog_file = get("CATALOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| assets_dir.join(DEFAULT_CATALOG_FILE));

        let port = match get("PORT") {
            Some(port) => port
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got '{port}'"))?,
            None => DEFAULT_PORT,
        };

        let membership_fallback = match get("MEMBERSHIP_FAIL_OPEN") {
            Some(flag) => match parse_bool(&flag) {
                Some(true) => MembershipFallback::Allow,
                Some(false) => MembershipFallback::Deny,
                None => bail!("MEMBERSHIP_FAIL_OPEN must be true or false, got '{flag}'"),
            },
            None => MembershipFallback::default(),
        };

        // An explicitly empty CONTACT_URL hides the button
        let contact_url = match lookup("CONTACT_URL") {
            Some(url) if url.trim().is_empty() => None,
            Some(url) => Some(url.trim().to_string()),
            None => Some(DEFAULT_CONTACT_URL.to_string()),
        };

        let admin_ids = match get("ADMIN_IDS") {
            Some(ids) => parse_admin_ids(&ids)?,
            None => Vec::new(),
        };

        Ok(Self {
            token,
            base_dir,
            assets_dir,
            catalog_file,
            port,
            required_channel: get("REQUIRED_CHANNEL"),
            membership_fallback,
            contact_url,
            admin_ids,
        })
    }

    pub fn resolver(&self) -> RelaxedResolver {
        RelaxedResolver::new(&self.base_dir)
    }

    pub fn catalog_loader(&self) -> CatalogLoader {
        CatalogLoader::new(self.resolver(), &self.assets_dir, &self.catalog_file)
    }

    pub fn membership_gate(&self) -> MembershipGate {
        MembershipGate::new(self.required_channel.clone(), self.membership_fallback)
    }

    /// Whether `user_id` may run admin commands
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_ids.is_empty() || self.admin_ids.contains(&user_id)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_admin_ids(value: &str) -> Result<Vec<u64>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<u64>()
                .with_context(|| format!("ADMIN_IDS entry '{id}' is not a user id"))
        })
        .collect()
}
