//! Template entity - Named, reusable reply bodies.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Template database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "templates")]
pub struct Model {
    /// Unique template name
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    /// Reply body copied into `default_message` by `/usetemplate`
    pub message: String,
    /// When the template was created or last overwritten
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
