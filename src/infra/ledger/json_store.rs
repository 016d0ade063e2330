use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::core::ledger::{GuildLedgerStore, GuildRecord, StoreError};

/// One JSON file per guild: `<dir>/<guild_id>.json`.
///
/// Nothing is cached; every call goes to disk. Writes land in a sibling
/// `.tmp` file first and are renamed into place, so a reader sees either the
/// old record or the new one, never a truncated file.
pub struct JsonLedgerStore {
    dir: PathBuf,
}

impl JsonLedgerStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn record_path(&self, guild_id: u64) -> PathBuf {
        self.dir.join(format!("{}.json", guild_id))
    }

    fn temp_path(&self, guild_id: u64) -> PathBuf {
        self.dir.join(format!("{}.json.tmp", guild_id))
    }
}

#[async_trait]
impl GuildLedgerStore for JsonLedgerStore {
    async fn load(&self, guild_id: u64) -> Result<GuildRecord, StoreError> {
        let bytes = match fs::read(self.record_path(guild_id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(GuildRecord::default()),
            Err(e) => return Err(e.into()),
        };

        // A damaged file must not take the guild offline. Start over from defaults;
        // the next successful write replaces it.
        match serde_json::from_slice(&bytes) {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::warn!(guild_id, "Unreadable ledger file, using defaults: {}", e);
                Ok(GuildRecord::default())
            }
        }
    }

    async fn save(&self, guild_id: u64, record: &GuildRecord) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;

        let bytes = serde_json::to_vec(record)?;
        let temp_path = self.temp_path(guild_id);

        let written = match write_synced(&temp_path, &bytes).await {
            Ok(()) => fs::rename(&temp_path, self.record_path(guild_id)).await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            // The previous record is untouched; only the temp file needs cleaning up.
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                tracing::debug!(guild_id, "Could not remove temp ledger file: {}", cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_default() {
        let dir = TempDir::new().unwrap();
        let store = JsonLedgerStore::new(dir.path());

        let record = store.load(1).await.unwrap();
        assert_eq!(record, GuildRecord::default());
        assert!(!dir.path().join("1.json").exists());
    }

    #[tokio::test]
    async fn test_save_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = JsonLedgerStore::new(dir.path());

        let mut record = GuildRecord::default();
        record.currency_name = "金幣".to_string();
        record.admin_role_id = Some(1_234_567_890_123_456_789);
        record.balances.insert(42, 9_007_199_254_740_993); // beyond f64 precision
        record.balances.insert(43, 0);
        store.save(7, &record).await.unwrap();

        // Fresh store over the same directory.
        let reloaded = JsonLedgerStore::new(dir.path()).load(7).await.unwrap();
        assert_eq!(reloaded, record);

        // Saving what we loaded changes nothing.
        store.save(7, &reloaded).await.unwrap();
        assert_eq!(store.load(7).await.unwrap(), record);
        assert!(!dir.path().join("7.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_default() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("3.json"), b"{\"name\": \"broken").unwrap();
        let store = JsonLedgerStore::new(dir.path());

        assert_eq!(store.load(3).await.unwrap(), GuildRecord::default());
    }

    #[tokio::test]
    async fn test_reads_file_written_by_older_bot() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("5.json"),
            r#"{"name":"點數","admin":null,"users":{"10":3,"11":-1}}"#,
        )
        .unwrap();
        let store = JsonLedgerStore::new(dir.path());

        let record = store.load(5).await.unwrap();
        assert_eq!(record.currency_name, "點數");
        assert_eq!(record.admin_role_id, None);
        assert_eq!(record.balance_of(10), 3);
        assert_eq!(record.balance_of(11), -1);
    }

    #[tokio::test]
    async fn test_save_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("ledger").join("guilds");
        let store = JsonLedgerStore::new(&nested);

        store.save(9, &GuildRecord::default()).await.unwrap();
        assert!(nested.join("9.json").exists());
    }

    #[tokio::test]
    async fn test_concurrent_saves_for_different_guilds() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(JsonLedgerStore::new(dir.path()));

        let mut handles = Vec::new();
        for guild_id in 0..16u64 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let mut record = GuildRecord::default();
                record.balances.insert(guild_id, guild_id as i64 * 10);
                store.save(guild_id, &record).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        for guild_id in 0..16u64 {
            let record = store.load(guild_id).await.unwrap();
            assert_eq!(record.balance_of(guild_id), guild_id as i64 * 10);
        }
    }

    #[tokio::test]
    async fn test_failed_save_keeps_previous_record() {
        let dir = TempDir::new().unwrap();
        let store = JsonLedgerStore::new(dir.path());

        let mut record = GuildRecord::default();
        record.balances.insert(1, 5);
        store.save(1, &record).await.unwrap();

        // A directory squatting on the temp path makes the write fail.
        std::fs::create_dir(dir.path().join("1.json.tmp")).unwrap();
        record.balances.insert(1, 99);
        assert!(matches!(store.save(1, &record).await, Err(StoreError::Io(_))));

        assert_eq!(store.load(1).await.unwrap().balance_of(1), 5);
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonLedgerStore::new(dir.path());

        // A non-empty directory where the record should go cannot be replaced.
        let target = dir.path().join("2.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        assert!(store.save(2, &GuildRecord::default()).await.is_err());
        assert!(!dir.path().join("2.json.tmp").exists());
    }
}
