//! Discord implementation of the outbound [`MessageGateway`].

use crate::{
    core::gateway::MessageGateway,
    errors::{Error, Result},
};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::debug;

/// Discord's per-message content limit, in characters.
pub const MESSAGE_LIMIT: usize = 2000;

/// Sends replies to Discord channels through the bot's HTTP client.
#[derive(Debug, Clone)]
pub struct DiscordGateway {
    http: Arc<serenity::Http>,
}

impl DiscordGateway {
    /// Wraps the HTTP client of a connected bot.
    #[must_use]
    pub const fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MessageGateway for DiscordGateway {
    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<()> {
        let channel_id = parse_channel_id(conversation_id)?;
        for chunk in split_message(text, MESSAGE_LIMIT) {
            channel_id
                .say(&*self.http, chunk)
                .await
                .map_err(|e| Error::GatewaySend {
                    message: format!("channel {conversation_id}: {e}"),
                })?;
        }
        debug!(channel = %conversation_id, "Message delivered");
        Ok(())
    }
}

fn parse_channel_id(conversation_id: &str) -> Result<serenity::ChannelId> {
    match conversation_id.parse::<u64>() {
        Ok(id) if id != 0 => Ok(serenity::ChannelId::new(id)),
        _ => Err(Error::GatewaySend {
            message: format!("'{conversation_id}' is not a Discord channel id"),
        }),
    }
}

/// Splits `text` into pieces of at most `limit` characters, preferring to
/// break after a newline.
#[must_use]
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.chars().count() > limit {
        let hard_end = rest
            .char_indices()
            .nth(limit)
            .map_or(rest.len(), |(index, _)| index);
        let end = rest[..hard_end]
            .rfind('\n')
            .filter(|&index| index > 0)
            .map_or(hard_end, |index| index + 1);
        chunks.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}
