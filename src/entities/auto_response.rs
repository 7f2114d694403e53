//! Auto-response entity - The dedup ledger.
//!
//! One row is appended for every automatic reply that was actually delivered.
//! Rows are never updated; the policy only needs the latest `sent_at` per
//! `conversation_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Auto-response database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auto_responses")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Conversation (channel) the reply went to
    pub conversation_id: String,
    /// When the reply was sent
    pub sent_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
