// Ledger infra layer.
// - `json_store.rs` keeps one JSON file per guild on disk.
// - `in_memory.rs` backs the service tests.

pub mod json_store;

#[cfg(test)]
pub mod in_memory;

pub use json_store::JsonLedgerStore;

#[cfg(test)]
pub use in_memory::InMemoryLedgerStore;
