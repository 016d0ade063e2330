// Glue between Discord interactions and the ledger core.
// - `caller.rs` turns a guild member into the core's `Caller`.
// - `manage_buttons.rs` owns the credit/debit buttons and their amount modals.

pub mod caller;
pub mod manage_buttons;

pub use caller::{caller_from_context, caller_from_member};
