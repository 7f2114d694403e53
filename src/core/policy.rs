//! Policy evaluator - Decides whether an incoming message gets an automatic reply.
//!
//! [`evaluate`] is a pure function over a settings snapshot, the last send time
//! and the current time, so every rule can be tested without a database.
//! [`decide`] loads those inputs from the store and delegates to it.
//!
//! The caller records a ledger entry only after the reply was delivered.

use crate::{
    core::{
        ledger,
        settings::{self, ConversationKind, PolicySettings},
    },
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::ConnectionTrait;

/// Why no reply is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuppressReason {
    /// The message came from the operator
    OwnMessage,
    /// The autoresponder is switched off
    Disabled,
    /// The conversation kind is excluded by the audience filter
    AudienceFiltered,
    /// The conversation was replied to too recently
    CoolDown {
        /// First instant at which a reply would be allowed
        next_eligible_at: DateTime<Utc>,
    },
}

/// Outcome of evaluating one incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Reply with `message`
    Send {
        /// Reply body
        message: String,
    },
    /// Stay silent
    Suppress(SuppressReason),
}

impl Decision {
    /// Whether a reply should be sent.
    #[must_use]
    pub const fn should_send(&self) -> bool {
        matches!(self, Self::Send { .. })
    }

    /// The reply body, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Send { message } => Some(message),
            Self::Suppress(_) => None,
        }
    }
}

/// Applies the reply rules in order: own message, on/off switch, audience
/// filter, cool-down.
#[must_use]
pub fn evaluate(
    sender_is_self: bool,
    kind: ConversationKind,
    settings: &PolicySettings,
    last_sent: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Decision {
    if sender_is_self {
        return Decision::Suppress(SuppressReason::OwnMessage);
    }
    if !settings.enabled {
        return Decision::Suppress(SuppressReason::Disabled);
    }
    if !settings.audience.allows(kind) {
        return Decision::Suppress(SuppressReason::AudienceFiltered);
    }
    if let Some(last_sent) = last_sent {
        if now.signed_duration_since(last_sent) < settings.cool_down {
            return Decision::Suppress(SuppressReason::CoolDown {
                next_eligible_at: last_sent + settings.cool_down,
            });
        }
    }
    Decision::Send {
        message: settings.default_message.clone(),
    }
}

/// Evaluates a message from `conversation_id` against the persisted settings and ledger.
///
/// Own messages are rejected before anything is read from the store.
pub async fn decide<C>(
    db: &C,
    conversation_id: &str,
    sender_is_self: bool,
    kind: ConversationKind,
    now: DateTime<Utc>,
) -> Result<Decision>
where
    C: ConnectionTrait,
{
    if sender_is_self {
        return Ok(Decision::Suppress(SuppressReason::OwnMessage));
    }
    let settings = settings::load_policy_settings(db).await?;
    let last_sent = ledger::last_send_time(db, conversation_id).await?;
    Ok(evaluate(sender_is_self, kind, &settings, last_sent, now))
}
