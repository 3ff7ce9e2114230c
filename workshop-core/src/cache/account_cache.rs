use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use workshop_common::models::Account;

#[derive(Debug, Clone)]
struct CachedAccount {
    account: Account,
    last_access: DateTime<Utc>,
}

const CACHE_MAX_AGE_SECS: i64 = 24 * 3600;

/// Session-side copies of accounts for display. Services refresh an entry
/// after every commit that moves its points; ledger decisions always re-read
/// the store instead.
#[derive(Default)]
pub struct AccountCache {
    entries: DashMap<String, CachedAccount>,
}

impl AccountCache {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    pub fn insert(&self, account: &Account) {
        self.prune();
        self.entries.insert(
            account.id.clone(),
            CachedAccount { account: account.redacted(), last_access: Utc::now() },
        );
    }

    pub fn get(&self, account_id: &str) -> Option<Account> {
        let mut entry = self.entries.get_mut(account_id)?;
        entry.last_access = Utc::now();
        Some(entry.account.clone())
    }

    /// Replaces an entry only if the account is already cached.
    pub fn refresh(&self, account: &Account) {
        if let Some(mut entry) = self.entries.get_mut(&account.id) {
            entry.account = account.redacted();
            entry.last_access = Utc::now();
        }
    }

    pub fn invalidate(&self, account_id: &str) {
        self.entries.remove(account_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn prune(&self) {
        let now = Utc::now();
        self.entries
            .retain(|_, cached| now.signed_duration_since(cached.last_access).num_seconds() < CACHE_MAX_AGE_SECS);
    }

    /// Test helper
    pub fn force_last_access(&self, account_id: &str, hours_ago: i64) -> bool {
        if let Some(mut entry) = self.entries.get_mut(account_id) {
            entry.last_access = Utc::now() - Duration::hours(hours_ago);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use workshop_common::models::RoleAccount;

    fn student(id: &str) -> Account {
        let mut account = RoleAccount::Guest.account();
        account.id = id.to_string();
        account.password_hash = Some("secret".into());
        account
    }

    #[test]
    fn cached_copies_are_redacted() {
        let cache = AccountCache::new();
        cache.insert(&student("user_1"));
        assert!(cache.get("user_1").unwrap().password_hash.is_none());
    }

    #[test]
    fn refresh_ignores_uncached_accounts() {
        let cache = AccountCache::new();
        cache.refresh(&student("user_2"));
        assert!(cache.is_empty());
    }

    #[test]
    fn stale_entries_are_pruned() {
        let cache = AccountCache::new();
        cache.insert(&student("old"));
        assert!(cache.force_last_access("old", 25));
        cache.insert(&student("new"));
        assert!(cache.get("old").is_none());
        assert_eq!(cache.len(), 1);
    }
}
