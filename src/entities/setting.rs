//! Setting entity - Stores the live autoresponder configuration as key-value pairs.
//! Known keys are described by `core::settings::SettingKey`; unknown keys are
//! kept but never interpreted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Setting database model - one configuration value per key
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    /// Configuration key (e.g. `"default_message"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Configuration value stored as string
    pub value: String,
    /// When this value was last written
    pub updated_at: DateTimeUtc,
}

/// `Setting` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
