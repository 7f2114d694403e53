//! Gateway message events - turns Discord messages into [`IncomingMessage`]s
//! and hands them to the responder.

use crate::{
    bot::BotData,
    core::{gateway::IncomingMessage, settings::ConversationKind},
    errors::{Error, Result},
};
use chrono::Utc;
use poise::serenity_prelude as serenity;
use tracing::{debug, error};

/// Poise event handler. Only `Message` events are of interest; failures are
/// logged so one bad message never takes the bot down.
pub async fn event_handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    if let serenity::FullEvent::Message { new_message } = event
        && let Err(e) = handle_message(new_message, data).await
    {
        error!(
            channel = %new_message.channel_id,
            "Failed to handle message: {}", e
        );
    }
    Ok(())
}

async fn handle_message(message: &serenity::Message, data: &BotData) -> Result<()> {
    let Some((sender_is_self, kind)) = classify(
        message.author.id.get(),
        message.author.bot,
        message.guild_id.is_some(),
        data.operator_id,
    ) else {
        return Ok(());
    };

    let incoming = IncomingMessage {
        conversation_id: message.channel_id.get().to_string(),
        sender_is_self,
        kind,
        text: message.content.clone(),
        timestamp: Utc::now(),
    };
    let outcome = data.responder.handle_message(&incoming).await?;
    debug!(channel = %message.channel_id, "Message handled: {:?}", outcome);
    Ok(())
}

/// Maps a Discord author and channel to `(sender_is_self, kind)`.
///
/// Bot authors (including this bot's own replies) yield `None`. Direct
/// messages are personal conversations, guild channels are group ones.
#[must_use]
pub const fn classify(
    author_id: u64,
    author_is_bot: bool,
    in_guild: bool,
    operator_id: u64,
) -> Option<(bool, ConversationKind)> {
    if author_is_bot {
        return None;
    }
    let kind = if in_guild {
        ConversationKind::Group
    } else {
        ConversationKind::Personal
    };
    Some((author_id == operator_id, kind))
}
