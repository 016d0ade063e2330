// Discord layer - commands, component handlers and the caller adapter.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "ledger/mod.rs"]
pub mod ledger;

// Re-export command types for convenience
pub use commands::economy::{Context, Data, Error};
