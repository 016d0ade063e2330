// Ledger domain: records, authorization, storage contract and the service.
#![allow(unused_imports)]

pub mod authorization;
pub mod ledger_models;
pub mod ledger_service;
pub mod ledger_store;

pub use authorization::can_manage;
pub use ledger_models::{BalanceUpdate, Caller, GuildRecord, Holder, DEFAULT_CURRENCY_NAME};
pub use ledger_service::{LedgerError, LedgerService};
pub use ledger_store::{GuildLedgerStore, StoreError};
