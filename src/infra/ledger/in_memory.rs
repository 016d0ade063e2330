// In-memory GuildLedgerStore for tests.
//
// Records are cloned in and out so the service sees the same whole-record
// replace semantics it gets from the JSON store.

use crate::core::ledger::{GuildLedgerStore, GuildRecord, StoreError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct InMemoryLedgerStore {
    /// guild_id -> last saved record
    records: DashMap<u64, GuildRecord>,
    /// Yield to the scheduler inside load/save to widen race windows.
    yield_on_io: bool,
    /// When set, every save fails like a full disk would.
    fail_saves: AtomicBool,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            yield_on_io: false,
            fail_saves: AtomicBool::new(false),
        }
    }

    pub fn with_yielding_io() -> Self {
        Self {
            records: DashMap::new(),
            yield_on_io: true,
            fail_saves: AtomicBool::new(false),
        }
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of guilds that have been written at least once.
    pub fn saved_guilds(&self) -> usize {
        self.records.len()
    }

    pub fn stored_record(&self, guild_id: u64) -> Option<GuildRecord> {
        self.records.get(&guild_id).map(|entry| entry.value().clone())
    }

    async fn maybe_yield(&self) {
        if self.yield_on_io {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl GuildLedgerStore for InMemoryLedgerStore {
    async fn load(&self, guild_id: u64) -> Result<GuildRecord, StoreError> {
        let record = self
            .records
            .get(&guild_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        self.maybe_yield().await;
        Ok(record)
    }

    async fn save(&self, guild_id: u64, record: &GuildRecord) -> Result<(), StoreError> {
        self.maybe_yield().await;
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full").into());
        }
        self.records.insert(guild_id, record.clone());
        Ok(())
    }
}
