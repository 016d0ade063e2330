// Ledger service - balances, currency name and admin role for each guild.
//
// Like the rest of `core/`, nothing here knows about Discord. Callers hand us
// plain IDs and a `Caller` describing who is asking.
//
// Every mutation is a full read-modify-write against the store. Two commands
// hitting the same guild at once would otherwise both read balance N and the
// second write would clobber the first, so mutations hold a per-guild lock
// for the whole load -> mutate -> save cycle. Reads skip the lock.

use super::authorization::can_manage;
use super::ledger_models::{BalanceUpdate, Caller, GuildRecord, Holder};
use super::ledger_store::{GuildLedgerStore, StoreError};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Caller is neither an admin-role holder nor (when no role is set) an administrator.
    #[error("Caller is not allowed to manage this guild's ledger")]
    Forbidden,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Generic over S: GuildLedgerStore so tests can run against memory.
pub struct LedgerService<S: GuildLedgerStore> {
    store: S,
    /// guild_id -> lock serializing that guild's mutations.
    /// Entries are created on first use and never replaced.
    guild_locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl<S: GuildLedgerStore> LedgerService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            guild_locks: DashMap::new(),
        }
    }

    /// A member's balance and the guild's currency name. Unknown members have 0.
    pub async fn get_balance(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<(i64, String), LedgerError> {
        let record = self.store.load(guild_id).await?;
        Ok((record.balance_of(user_id), record.currency_name))
    }

    /// Members with a nonzero balance, richest first, with the currency name
    /// from the same snapshot.
    ///
    /// Equal balances are ordered by user ID so the list is stable across calls.
    pub async fn list_holders(
        &self,
        guild_id: u64,
    ) -> Result<(Vec<Holder>, String), LedgerError> {
        let record = self.store.load(guild_id).await?;
        let mut holders: Vec<Holder> = record
            .balances
            .iter()
            .filter(|(_, balance)| **balance != 0)
            .map(|(user_id, balance)| Holder {
                user_id: *user_id,
                balance: *balance,
            })
            .collect();

        holders.sort_by(|a, b| {
            b.balance
                .cmp(&a.balance)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok((holders, record.currency_name))
    }

    /// Check `caller` against the guild's current settings without changing anything.
    ///
    /// Used by the Discord layer before it opens an amount prompt. The mutating
    /// call checks again under the lock, so a stale answer here is harmless.
    pub async fn check_manage(&self, guild_id: u64, caller: &Caller) -> Result<(), LedgerError> {
        let record = self.store.load(guild_id).await?;
        if can_manage(&record, caller) {
            Ok(())
        } else {
            Err(LedgerError::Forbidden)
        }
    }

    pub async fn set_currency_name(
        &self,
        guild_id: u64,
        name: String,
        caller: &Caller,
    ) -> Result<(), LedgerError> {
        self.mutate(guild_id, caller, move |record| {
            record.currency_name = name;
            Ok(())
        })
        .await
    }

    /// Point the admin role at `role_id`.
    ///
    /// Authorization uses the configuration in place *before* the change, so the
    /// current role holders can hand it over, and an administrator can set it
    /// the first time.
    pub async fn set_admin_role(
        &self,
        guild_id: u64,
        role_id: u64,
        caller: &Caller,
    ) -> Result<(), LedgerError> {
        self.mutate(guild_id, caller, move |record| {
            record.admin_role_id = Some(role_id);
            Ok(())
        })
        .await
    }

    /// Apply a signed delta to a member's balance.
    ///
    /// Positive deltas credit, negative ones debit. Balances may go below zero.
    /// A balance that lands on exactly 0 stays in the record.
    pub async fn adjust_balance(
        &self,
        guild_id: u64,
        user_id: u64,
        delta: i64,
        caller: &Caller,
    ) -> Result<BalanceUpdate, LedgerError> {
        let update = self
            .mutate(guild_id, caller, move |record| {
                let old = record.balance_of(user_id);
                let new_balance = old.checked_add(delta).ok_or_else(|| {
                    LedgerError::InvalidInput(format!(
                        "adjusting {} by {} overflows the balance",
                        old, delta
                    ))
                })?;
                record.balances.insert(user_id, new_balance);

                Ok(BalanceUpdate {
                    new_balance,
                    currency_name: record.currency_name.clone(),
                })
            })
            .await?;

        tracing::debug!(
            guild_id,
            user_id,
            delta,
            new_balance = update.new_balance,
            "Balance adjusted"
        );
        Ok(update)
    }

    /// Lock the guild, load, authorize, apply `change`, save.
    ///
    /// Nothing is written when authorization or `change` fails.
    async fn mutate<T, F>(&self, guild_id: u64, caller: &Caller, change: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut GuildRecord) -> Result<T, LedgerError>,
    {
        let lock = self.guild_lock(guild_id);
        let _guard = lock.lock().await;

        let mut record = self.store.load(guild_id).await?;
        if !can_manage(&record, caller) {
            return Err(LedgerError::Forbidden);
        }

        let value = change(&mut record)?;
        if let Err(e) = self.store.save(guild_id, &record).await {
            tracing::error!(guild_id, "Failed to persist guild record: {}", e);
            return Err(e.into());
        }
        Ok(value)
    }

    fn guild_lock(&self, guild_id: u64) -> Arc<Mutex<()>> {
        // Clone the Arc out so the DashMap shard guard is released before we await.
        Arc::clone(self.guild_locks.entry(guild_id).or_default().value())
    }
}

// ============================================================================
// TESTS
// ============================================================================
