//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod auto_response;
pub mod scheduled_transition;
pub mod setting;
pub mod template;

// Re-export specific types to avoid conflicts
pub use auto_response::{
    Column as AutoResponseColumn, Entity as AutoResponse, Model as AutoResponseModel,
};
pub use scheduled_transition::{
    Column as ScheduledTransitionColumn, Entity as ScheduledTransition,
    Model as ScheduledTransitionModel,
};
pub use setting::{Column as SettingColumn, Entity as Setting, Model as SettingModel};
pub use template::{Column as TemplateColumn, Entity as Template, Model as TemplateModel};
