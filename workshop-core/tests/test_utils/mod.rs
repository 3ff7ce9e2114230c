// File: workshop-core/tests/test_utils/mod.rs
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use workshop_common::models::{
    Account, Collection, CollectionSnapshot, Expectation, Product, ProductDraft, ReadKey, ReadResult,
    StoreWrite, Subscription, VersionedDocument,
};
use workshop_common::traits::LedgerStore;
use workshop_core::repositories::MemoryLedgerStore;
use workshop_core::services::WorkshopServices;
use workshop_core::utils::time::ManualClock;
use workshop_core::{Error, WorkshopConfig};

pub struct Harness {
    pub services: Arc<WorkshopServices>,
    pub store: Arc<MemoryLedgerStore>,
    pub clock: Arc<ManualClock>,
}

/// 2024-06-03 10:00 in Taipei.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 2, 0, 0).unwrap()
}

pub fn test_config() -> WorkshopConfig {
    WorkshopConfig {
        admin_password: Some("mentor-pass".to_string()),
        ..WorkshopConfig::default()
    }
}

pub fn harness() -> Harness {
    harness_with(test_config())
}

pub fn harness_with(config: WorkshopConfig) -> Harness {
    let store = Arc::new(MemoryLedgerStore::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let services = Arc::new(WorkshopServices::new(store.clone(), clock.clone(), config));
    Harness { services, store, clock }
}

/// Memory store that pauses after every transaction read, so concurrent
/// transactions overlap between read and commit.
pub struct SlowStore {
    inner: Arc<MemoryLedgerStore>,
    delay: Duration,
}

#[async_trait]
impl LedgerStore for SlowStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<VersionedDocument>, Error> {
        self.inner.get(collection, id).await
    }

    async fn put(&self, collection: Collection, id: &str, body: Value) -> Result<u64, Error> {
        self.inner.put(collection, id, body).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, Error> {
        self.inner.delete(collection, id).await
    }

    async fn list_all(&self, collection: Collection) -> Result<CollectionSnapshot, Error> {
        self.inner.list_all(collection).await
    }

    async fn read(&self, keys: &[ReadKey]) -> Result<Vec<(ReadKey, ReadResult)>, Error> {
        let results = self.inner.read(keys).await?;
        tokio::time::sleep(self.delay).await;
        Ok(results)
    }

    async fn commit(&self, expectations: Vec<Expectation>, writes: Vec<StoreWrite>) -> Result<(), Error> {
        self.inner.commit(expectations, writes).await
    }

    async fn subscribe(&self, collection: Collection) -> Result<Subscription, Error> {
        self.inner.subscribe(collection).await
    }

    fn close_subscriptions(&self) {
        self.inner.close_subscriptions()
    }
}

/// Like `harness`, but every transaction read takes `delay`.
pub fn slow_harness(delay: Duration) -> Harness {
    let store = Arc::new(MemoryLedgerStore::new());
    let slow = Arc::new(SlowStore { inner: store.clone(), delay });
    let clock = Arc::new(ManualClock::new(t0()));
    let services = Arc::new(WorkshopServices::new(slow, clock.clone(), test_config()));
    Harness { services, store, clock }
}

impl Harness {
    /// Registers, approves and funds a student.
    pub async fn student(&self, name: &str, points: i64) -> Result<Account, Error> {
        let account = self.services.accounts.register(name, "pw", Some("國一")).await?;
        let account = self.services.accounts.approve(&account.id).await?;
        if points > 0 {
            return self.services.accounts.grant_points(&account.id, points, Some("setup")).await;
        }
        Ok(account)
    }

    pub async fn product(&self, name: &str, price: i64, stock: i64) -> Result<Product, Error> {
        self.services
            .catalog
            .add_product(ProductDraft {
                name: name.to_string(),
                category: "food".to_string(),
                price,
                stock,
                description: String::new(),
                image_url: String::new(),
            })
            .await
    }

    pub async fn account(&self, id: &str) -> Result<Account, Error> {
        self.services.accounts.get_account(id).await
    }
}
