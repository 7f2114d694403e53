//! Database configuration module for the autoresponder.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`
//! so the schema always matches the Rust structs. Creation is idempotent: every statement
//! carries `IF NOT EXISTS`, which lets the same function run on each startup.

use crate::entities::{AutoResponse, ScheduledTransition, Setting, Template};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Default `SQLite` location used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/autoresponder.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the default path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// File path of a `sqlite://` URL, without query parameters.
/// Returns `None` for in-memory databases and non-`SQLite` URLs.
#[must_use]
pub fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        None
    } else {
        Some(Path::new(path))
    }
}

/// Establishes a connection to the database at `database_url`, creating the
/// parent directory of an on-disk `SQLite` file first.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(parent) = sqlite_file_path(database_url).and_then(Path::parent)
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    debug!("Connecting to database at {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables used by the autoresponder if they do not exist yet:
/// settings, templates, the auto-response ledger and scheduled transitions.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Setting).await?;
    create_table(db, &schema, Template).await?;
    create_table(db, &schema, AutoResponse).await?;
    create_table(db, &schema, ScheduledTransition).await?;

    info!("Database tables ensured.");
    Ok(())
}
