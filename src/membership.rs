//! # Membership Gate
//!
//! Optional "join the channel first" check. When a channel is configured, only
//! users present in it may browse. If Telegram cannot answer the check (bot not
//! admin in the channel, network error), the configured fallback decides.

use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::{debug, warn};

/// Outcome when the membership lookup itself fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MembershipFallback {
    /// Let the user through (fail open)
    #[default]
    Allow,
    /// Treat the user as not joined (fail closed)
    Deny,
}

/// Result of asking Telegram about a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Member,
    NotMember,
    /// The lookup failed
    Unknown,
}

#[derive(Debug, Clone)]
pub struct MembershipGate {
    channel: Option<String>,
    fallback: MembershipFallback,
}

impl MembershipGate {
    pub fn new(channel: Option<String>, fallback: MembershipFallback) -> Self {
        Self { channel, fallback }
    }

    /// Gate that lets everybody through
    pub fn disabled() -> Self {
        Self::new(None, MembershipFallback::Allow)
    }

    pub fn is_enabled(&self) -> bool {
        self.channel.is_some()
    }

    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// Public link for `@username` channels; numeric ids have none
    pub fn channel_url(&self) -> Option<String> {
        let username = self.channel.as_deref()?.strip_prefix('@')?;
        (!username.is_empty()).then(|| format!("https://t.me/{username}"))
    }

    /// Whether a user with `status` may proceed
    pub fn decide(&self, status: MembershipStatus) -> bool {
        match status {
            MembershipStatus::Member => true,
            MembershipStatus::NotMember => false,
            MembershipStatus::Unknown => self.fallback == MembershipFallback::Allow,
        }
    }

    /// Ask Telegram whether `user_id` has joined and apply the policy
    pub async fn check(&self, bot: &Bot, user_id: UserId) -> bool {
        let Some(channel) = self.channel.as_deref() else {
            return true;
        };

        let status = match bot.get_chat_member(channel_recipient(channel), user_id).await {
            Ok(member) if member.kind.is_present() => MembershipStatus::Member,
            Ok(_) => MembershipStatus::NotMember,
            Err(e) => {
                warn!(user_id = %user_id, channel = %channel, error = %e, "Membership check failed");
                MembershipStatus::Unknown
            }
        };

        let allowed = self.decide(status);
        debug!(user_id = %user_id, status = ?status, allowed, "Membership gate evaluated");
        allowed
    }
}

/// `@name` stays a username, anything numeric becomes a chat id
pub fn channel_recipient(channel: &str) -> Recipient {
    match channel.trim().parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(channel.trim().to_string()),
    }
}
