//! Application configuration loaded from environment variables.
//!
//! The bot token is not part of [`AppConfig`]; `main` reads it
//! right before connecting so it is never kept around in shared state.

use crate::config::database;
use crate::errors::{Error, Result};
use std::path::PathBuf;
use tracing::info;

/// Default location of the optional seed file.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Runtime settings that do not live in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `SeaORM` connection string
    pub database_url: String,
    /// Discord user id of the operator; their messages count as "self"
    pub operator_user_id: u64,
    /// Path of the optional `config.toml` holding template seeds
    pub config_path: PathBuf,
}

/// Parses an operator id as given in `OPERATOR_USER_ID`.
pub fn parse_operator_id(raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|e| Error::Config {
        message: format!("OPERATOR_USER_ID must be a numeric Discord user id: {e}"),
    })
}

/// Builds the [`AppConfig`] from `DATABASE_URL`, `OPERATOR_USER_ID` and
/// `AUTORESPONDER_CONFIG`.
pub fn load_app_config() -> Result<AppConfig> {
    let operator_raw = std::env::var("OPERATOR_USER_ID").map_err(|e| Error::Config {
        message: format!("OPERATOR_USER_ID not set: {e}"),
    })?;
    let operator_user_id = parse_operator_id(&operator_raw)?;

    let config_path = std::env::var("AUTORESPONDER_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    let app_config = AppConfig {
        database_url: database::get_database_url(),
        operator_user_id,
        config_path,
    };
    info!(
        operator = app_config.operator_user_id,
        config_path = ?app_config.config_path,
        "Application configuration loaded"
    );
    Ok(app_config)
}
