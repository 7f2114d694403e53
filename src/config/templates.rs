//! Template seed loading from config.toml
//!
//! Templates listed in the configuration file are inserted at startup when no
//! template of the same name exists. A missing file simply means "no seeds".

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Templates to seed
    #[serde(default)]
    pub templates: Vec<TemplateConfig>,
}

/// Configuration for a single template
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TemplateConfig {
    /// Template name used with `/usetemplate`
    pub name: String,
    /// Reply body
    pub message: String,
}

/// Loads template seeds from a TOML file
///
/// # Errors
/// Returns an error if the file exists but cannot be read, or if the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("No seed file at {:?}, skipping template seeding", path);
        return Ok(Config::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;

    let config: Config = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.display()),
    })?;
    info!("Loaded {} template seed(s) from {:?}", config.templates.len(), path);
    Ok(config)
}
