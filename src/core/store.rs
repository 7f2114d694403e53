//! Configuration store - Settings and templates behind a single write lock.
//!
//! Reads go straight to the database. Every write takes the store's
//! `tokio::sync::Mutex` first, so a scheduled transition flipping `enabled`
//! can never interleave with an operator command doing the same. Callers that
//! need several writes to land together (the activation scheduler) hold the
//! guard from [`ConfigStore::lock_writes`] and run their own transaction.

use crate::{
    config::templates::TemplateConfig,
    core::{
        settings::{self, PolicySettings, SettingKey},
        templates,
    },
    entities::{setting, template},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Shared handle to the persisted configuration.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    database: DatabaseConnection,
    write_lock: Arc<Mutex<()>>,
}

impl ConfigStore {
    /// Wraps a connection whose tables already exist.
    #[must_use]
    pub fn new(database: DatabaseConnection) -> Self {
        Self {
            database,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The underlying connection, for reads and for transactions run under
    /// [`ConfigStore::lock_writes`].
    #[must_use]
    pub const fn database(&self) -> &DatabaseConnection {
        &self.database
    }

    /// Acquires the store-wide write lock.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Reads one setting.
    pub async fn get(&self, key: SettingKey) -> Result<Option<String>> {
        settings::get_setting(&self.database, key).await
    }

    /// Writes one setting.
    pub async fn set(&self, key: SettingKey, value: &str) -> Result<()> {
        let _guard = self.lock_writes().await;
        settings::set_setting(&self.database, key, value).await
    }

    /// Every stored setting ordered by key.
    pub async fn all_settings(&self) -> Result<Vec<setting::Model>> {
        settings::get_all_settings(&self.database).await
    }

    /// Typed snapshot for the policy evaluator.
    pub async fn policy_settings(&self) -> Result<PolicySettings> {
        settings::load_policy_settings(&self.database).await
    }

    /// Restores every known setting to its built-in default.
    pub async fn reset_to_defaults(&self) -> Result<()> {
        let _guard = self.lock_writes().await;
        settings::reset_to_defaults(&self.database).await
    }

    /// Initializes defaults on first boot.
    pub async fn ensure_defaults(&self) -> Result<bool> {
        let _guard = self.lock_writes().await;
        settings::ensure_defaults(&self.database).await
    }

    /// Creates or overwrites a template.
    pub async fn upsert_template(&self, name: &str, message: &str) -> Result<()> {
        let _guard = self.lock_writes().await;
        templates::upsert_template(&self.database, name, message).await
    }

    /// Looks a template up by name.
    pub async fn get_template(&self, name: &str) -> Result<Option<template::Model>> {
        templates::get_template(&self.database, name).await
    }

    /// Deletes a template.
    pub async fn delete_template(&self, name: &str) -> Result<()> {
        let _guard = self.lock_writes().await;
        templates::delete_template(&self.database, name).await
    }

    /// Template names in alphabetical order.
    pub async fn template_names(&self) -> Result<Vec<String>> {
        templates::list_template_names(&self.database).await
    }

    /// Seeds templates from `config.toml` without overwriting existing ones.
    pub async fn seed_templates(&self, seeds: &[TemplateConfig]) -> Result<usize> {
        let _guard = self.lock_writes().await;
        templates::seed_templates(&self.database, seeds).await
    }
}
