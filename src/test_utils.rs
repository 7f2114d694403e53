//! Shared test utilities for the autoresponder.
//!
//! Every helper builds on an in-memory `SQLite` database so tests are isolated
//! from each other and from the on-disk store.

#![allow(clippy::expect_used)]

use crate::{
    core::{
        commands::CommandInterpreter,
        context::AppContext,
        gateway::{IncomingMessage, MessageGateway},
        scheduler::ActivationScheduler,
        settings::ConversationKind,
        store::ConfigStore,
    },
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// No settings are written.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a [`ConfigStore`] over a fresh database, populated with defaults.
pub async fn setup_test_store() -> Result<ConfigStore> {
    let store = ConfigStore::new(setup_test_db().await?);
    store.ensure_defaults().await?;
    Ok(store)
}

/// Creates an interpreter plus the store it writes to.
pub async fn setup_test_interpreter() -> Result<(CommandInterpreter, ConfigStore)> {
    let store = setup_test_store().await?;
    let scheduler = Arc::new(ActivationScheduler::new(store.clone()));
    Ok((CommandInterpreter::new(store.clone(), scheduler), store))
}

/// Creates a full [`AppContext`] whose gateway records every send.
pub async fn setup_test_context() -> Result<(AppContext, Arc<RecordingGateway>)> {
    let store = setup_test_store().await?;
    let scheduler = Arc::new(ActivationScheduler::new(store.clone()));
    let gateway = Arc::new(RecordingGateway::default());
    let context = AppContext::new(store, scheduler, Arc::clone(&gateway) as Arc<dyn MessageGateway>);
    Ok((context, gateway))
}

/// Parses an RFC 3339 timestamp, panicking on bad test input.
#[must_use]
pub fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("test timestamp must be RFC 3339")
        .with_timezone(&Utc)
}

/// Builds an inbound message.
#[must_use]
pub fn incoming(
    conversation_id: &str,
    sender_is_self: bool,
    kind: ConversationKind,
    text: &str,
    timestamp: DateTime<Utc>,
) -> IncomingMessage {
    IncomingMessage {
        conversation_id: conversation_id.to_string(),
        sender_is_self,
        kind,
        text: text.to_string(),
        timestamp,
    }
}

/// Gateway that stores sent messages instead of delivering them. It can be
/// switched into a failing mode or made to take time for every send.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
    send_delay: Mutex<Duration>,
}

impl RecordingGateway {
    /// `(conversation_id, text)` pairs in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Makes subsequent sends fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes every subsequent send wait `delay` before it completes.
    pub fn set_send_delay(&self, delay: Duration) {
        *self
            .send_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = delay;
    }
}

#[async_trait]
impl MessageGateway for RecordingGateway {
    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<()> {
        let delay = *self
            .send_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::GatewaySend {
                message: "recording gateway set to fail".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((conversation_id.to_string(), text.to_string()));
        Ok(())
    }
}
