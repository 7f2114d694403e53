//! Unified error type for the autoresponder.
//!
//! Every fallible operation in the crate returns [`Result`]. Command-level
//! variants (`MalformedCommand`, `UnknownCommand`, `TemplateNotFound`) are
//! turned into operator replies by the interpreter; the rest are logged.

use thiserror::Error;

/// All errors produced by the autoresponder.
#[derive(Debug, Error)]
pub enum Error {
    /// Startup configuration is missing or invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// The persistent store failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// An operator command had bad or missing arguments
    #[error("{message}")]
    MalformedCommand {
        /// Human-readable explanation, shown to the operator as-is
        message: String,
    },

    /// The operator sent a command name nobody handles
    #[error("Unknown command: {name}")]
    UnknownCommand {
        /// Command name as typed
        name: String,
    },

    /// A template lookup missed
    #[error("Template '{name}' not found")]
    TemplateNotFound {
        /// Requested template name
        name: String,
    },

    /// The messaging gateway could not deliver a reply
    #[error("Failed to send message: {message}")]
    GatewaySend {
        /// Transport-level failure description
        message: String,
    },

    /// I/O failure, e.g. reading `config.toml`
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required environment variable is missing
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Serenity/Poise framework failure
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl Error {
    /// Shorthand for a [`Error::MalformedCommand`] with the given message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedCommand {
            message: message.into(),
        }
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
