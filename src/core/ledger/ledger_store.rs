use super::ledger_models::GuildRecord;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable storage for guild records. No business logic lives here.
///
/// `load` never fails because of missing or damaged data; it hands back
/// `GuildRecord::default()` instead. Only real I/O problems are errors.
///
/// `save` replaces the whole record. Implementations must tolerate concurrent
/// saves for different guilds; callers serialize saves for the same guild.
#[async_trait]
pub trait GuildLedgerStore: Send + Sync {
    async fn load(&self, guild_id: u64) -> Result<GuildRecord, StoreError>;
    async fn save(&self, guild_id: u64, record: &GuildRecord) -> Result<(), StoreError>;
}
