use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Currency name used until a guild picks its own.
pub const DEFAULT_CURRENCY_NAME: &str = "貨幣";

/// Everything we persist for one guild.
///
/// The serde names match the files written by earlier versions of the bot,
/// so an existing `data/` directory keeps working:
/// `{"name": "貨幣", "admin": null, "users": {"1234": 50}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRecord {
    #[serde(rename = "name")]
    pub currency_name: String,
    /// Role allowed to manage balances. `None` falls back to the
    /// platform administrator permission.
    #[serde(rename = "admin")]
    pub admin_role_id: Option<u64>,
    /// user_id -> balance. Zero entries are kept and filtered on read.
    #[serde(rename = "users")]
    pub balances: BTreeMap<u64, i64>,
}

impl Default for GuildRecord {
    fn default() -> Self {
        Self {
            currency_name: DEFAULT_CURRENCY_NAME.to_string(),
            admin_role_id: None,
            balances: BTreeMap::new(),
        }
    }
}

impl GuildRecord {
    pub fn balance_of(&self, user_id: u64) -> i64 {
        self.balances.get(&user_id).copied().unwrap_or(0)
    }
}

/// What the authorization check needs to know about whoever invoked a command.
///
/// The Discord layer builds this from a `Member`; the core never sees
/// platform user objects.
#[derive(Debug, Clone, Default)]
pub struct Caller {
    pub role_ids: HashSet<u64>,
    pub is_administrator: bool,
}

impl Caller {
    pub fn new(role_ids: impl IntoIterator<Item = u64>, is_administrator: bool) -> Self {
        Self {
            role_ids: role_ids.into_iter().collect(),
            is_administrator,
        }
    }
}

/// A member with a nonzero balance, as shown on the holder list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Holder {
    pub user_id: u64,
    pub balance: i64,
}

/// Result of a successful balance adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceUpdate {
    pub new_balance: i64,
    pub currency_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_legacy_file_layout() {
        let raw = r#"{"name":"金幣","admin":987654321098765432,"users":{"123":50,"456":-3}}"#;
        let record: GuildRecord = serde_json::from_str(raw).unwrap();

        assert_eq!(record.currency_name, "金幣");
        assert_eq!(record.admin_role_id, Some(987654321098765432));
        assert_eq!(record.balance_of(123), 50);
        assert_eq!(record.balance_of(456), -3);
        assert_eq!(record.balance_of(789), 0);
    }

    #[test]
    fn test_writes_string_keys_and_exact_integers() {
        let mut record = GuildRecord::default();
        record.balances.insert(u64::MAX, i64::MIN);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "貨幣");
        assert!(json["admin"].is_null());
        assert_eq!(json["users"][u64::MAX.to_string()], i64::MIN);
    }
}
