use super::ledger_models::{Caller, GuildRecord};

/// Decide whether `caller` may change balances or settings in this guild.
///
/// A configured admin role is authoritative: only its holders pass, and the
/// administrator permission does not matter. Without one, the administrator
/// permission decides.
pub fn can_manage(record: &GuildRecord, caller: &Caller) -> bool {
    match record.admin_role_id {
        Some(role_id) => caller.role_ids.contains(&role_id),
        None => caller.is_administrator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLE: u64 = 42;

    fn record_with_role(role: Option<u64>) -> GuildRecord {
        GuildRecord {
            admin_role_id: role,
            ..GuildRecord::default()
        }
    }

    #[test]
    fn test_role_holder_without_admin_permission_passes() {
        let caller = Caller::new([ROLE], false);
        assert!(can_manage(&record_with_role(Some(ROLE)), &caller));
    }

    #[test]
    fn test_administrator_without_role_is_denied_when_role_set() {
        let caller = Caller::new([7], true);
        assert!(!can_manage(&record_with_role(Some(ROLE)), &caller));
    }

    #[test]
    fn test_falls_back_to_administrator_permission() {
        let record = record_with_role(None);
        assert!(can_manage(&record, &Caller::new([], true)));
        assert!(!can_manage(&record, &Caller::new([ROLE], false)));
    }
}
