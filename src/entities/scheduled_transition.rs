//! Scheduled transition entity - Pending enable/disable flips.
//!
//! The primary key is the transition id (`"activate"` or `"deactivate"`), so
//! there is at most one pending transition of each kind. Rows survive restarts
//! and are re-armed by the activation scheduler at startup.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Scheduled transition database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scheduled_transitions")]
pub struct Model {
    /// Transition id: `"activate"` or `"deactivate"`
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Wall-clock instant the transition fires at
    pub effective_at: DateTimeUtc,
    /// Value written to the `enabled` setting when fired
    pub target_enabled: bool,
    /// When this transition was scheduled
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
