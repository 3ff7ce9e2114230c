use std::sync::Arc;

use chrono::{DateTime, Utc};
use workshop_common::models::{Account, ReadKey};
use workshop_common::traits::LedgerStore;

use crate::cache::AccountCache;
use crate::config::WorkshopConfig;
use crate::repositories::{run_transaction, Transaction};
use crate::utils::time::{start_of_day, Clock};
use crate::Error;

/// What every service needs: the store, a clock, settings and the session cache.
pub struct LedgerContext {
    pub store: Arc<dyn LedgerStore>,
    pub clock: Arc<dyn Clock>,
    pub config: WorkshopConfig,
    pub cache: Arc<AccountCache>,
}

impl LedgerContext {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>, config: WorkshopConfig) -> Self {
        Self { store, clock, config, cache: Arc::new(AccountCache::new()) }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Local midnight of the current day in the configured time zone.
    pub fn start_of_today(&self) -> DateTime<Utc> {
        start_of_day(self.now(), self.config.timezone)
    }

    pub async fn transact<T, F>(&self, read_set: &[ReadKey], body: F) -> Result<T, Error>
    where
        F: FnMut(&mut Transaction) -> Result<T, Error>,
    {
        run_transaction(self.store.as_ref(), &self.config.transaction, read_set, body).await
    }

    /// Pushes a freshly committed account into the session cache.
    pub fn refresh_cached(&self, account: &Account) {
        self.cache.refresh(account);
    }
}
