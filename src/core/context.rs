//! Application context - Explicit wiring of the core components.

use crate::core::{gateway::MessageGateway, scheduler::ActivationScheduler, store::ConfigStore};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Everything the responder and command interpreter need, passed in rather
/// than reached through globals.
#[derive(Clone)]
pub struct AppContext {
    /// Settings and templates
    pub store: ConfigStore,
    /// Pending activation windows
    pub scheduler: Arc<ActivationScheduler>,
    /// Outbound messages
    pub gateway: Arc<dyn MessageGateway>,
}

impl AppContext {
    /// Bundles the components.
    #[must_use]
    pub fn new(
        store: ConfigStore,
        scheduler: Arc<ActivationScheduler>,
        gateway: Arc<dyn MessageGateway>,
    ) -> Self {
        Self {
            store,
            scheduler,
            gateway,
        }
    }

    /// Database shared by the store and the dedup ledger.
    #[must_use]
    pub const fn database(&self) -> &DatabaseConnection {
        self.store.database()
    }
}
