//! Discord slash commands.
//!
//! Operator configuration happens through plain `/`-prefixed direct messages
//! handled by the core interpreter; the slash commands here are utilities.

/// General utility commands
pub mod general;

// Export commands
pub use general::*;
