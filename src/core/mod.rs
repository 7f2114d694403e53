//! Core logic - framework-agnostic reply policy, configuration store,
//! scheduling and operator commands. Nothing in here knows about Discord.

/// Operator command parsing and execution
pub mod commands;
/// Explicit wiring of store, scheduler and gateway
pub mod context;
/// Inbound message type and outbound gateway trait
pub mod gateway;
/// Auto-response ledger used for de-duplication and statistics
pub mod ledger;
/// Reply decision rules
pub mod policy;
/// Inbound message routing
pub mod responder;
/// Time-triggered activation and deactivation
pub mod scheduler;
/// Setting keys, defaults and typed views over stored values
pub mod settings;
/// Serialized access to settings and templates
pub mod store;
/// Named reply templates
pub mod templates;
