//! Discord event handlers
//!
//! This module turns gateway events into calls on the framework-agnostic core.

/// Message events routed to the responder
pub mod message;

pub use message::event_handler;
