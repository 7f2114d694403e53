//! Dedup ledger - Append-only history of delivered automatic replies.
//!
//! The policy evaluator only ever asks for the latest send per conversation,
//! but the full history is kept so `/stats` can report totals.

use crate::{
    entities::{AutoResponse, auto_response},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};
use tracing::debug;

/// Aggregate numbers reported by `/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerStats {
    /// Number of automatic replies ever recorded
    pub total_responses: u64,
    /// Number of distinct conversations replied to
    pub unique_conversations: u64,
    /// Most recent reply, if any
    pub last_sent_at: Option<DateTime<Utc>>,
}

/// Appends a record for a reply that was delivered to `conversation_id` at `sent_at`.
pub async fn record_send<C>(
    db: &C,
    conversation_id: &str,
    sent_at: DateTime<Utc>,
) -> Result<auto_response::Model>
where
    C: ConnectionTrait,
{
    let record = auto_response::ActiveModel {
        conversation_id: Set(conversation_id.to_string()),
        sent_at: Set(sent_at),
        ..Default::default()
    };
    let model = record.insert(db).await?;
    debug!(conversation_id, %sent_at, "Recorded auto-response");
    Ok(model)
}

/// Latest send time for `conversation_id`, or `None` if it was never replied to.
pub async fn last_send_time<C>(db: &C, conversation_id: &str) -> Result<Option<DateTime<Utc>>>
where
    C: ConnectionTrait,
{
    let last = AutoResponse::find()
        .filter(auto_response::Column::ConversationId.eq(conversation_id))
        .order_by_desc(auto_response::Column::SentAt)
        .one(db)
        .await?
        .map(|record| record.sent_at);
    Ok(last)
}

/// Computes totals over the whole ledger.
pub async fn stats<C>(db: &C) -> Result<LedgerStats>
where
    C: ConnectionTrait,
{
    let total_responses = AutoResponse::find().count(db).await?;

    let unique_conversations = AutoResponse::find()
        .select_only()
        .column_as(
            Expr::col(auto_response::Column::ConversationId).count_distinct(),
            "unique_conversations",
        )
        .into_tuple::<i64>()
        .one(db)
        .await?
        .map_or(0, |count| u64::try_from(count).unwrap_or_default());

    let last_sent_at = AutoResponse::find()
        .order_by_desc(auto_response::Column::SentAt)
        .one(db)
        .await?
        .map(|record| record.sent_at);

    Ok(LedgerStats {
        total_responses,
        unique_conversations,
        last_sent_at,
    })
}
