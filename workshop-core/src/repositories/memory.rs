// File: workshop-core/src/repositories/memory.rs

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, trace};

use workshop_common::models::{
    Collection, CollectionSnapshot, DocKey, Expectation, ReadKey, ReadResult, StoreWrite,
    Subscription, VersionedDocument,
};
use workshop_common::traits::LedgerStore;

use crate::eventbus::ChangeFeed;
use crate::Error;

#[derive(Default)]
struct Tables {
    documents: HashMap<Collection, BTreeMap<String, VersionedDocument>>,
    collection_versions: HashMap<Collection, u64>,
    /// Store-wide version sequence; every write takes the next value.
    last_version: u64,
}

impl Tables {
    fn snapshot(&self, collection: Collection) -> CollectionSnapshot {
        CollectionSnapshot {
            collection,
            version: self.collection_version(collection),
            documents: self
                .documents
                .get(&collection)
                .map(|docs| docs.values().cloned().collect())
                .unwrap_or_default(),
        }
    }

    fn collection_version(&self, collection: Collection) -> u64 {
        self.collection_versions.get(&collection).copied().unwrap_or(0)
    }

    fn document(&self, key: &DocKey) -> Option<&VersionedDocument> {
        self.documents.get(&key.collection).and_then(|docs| docs.get(&key.id))
    }

    fn check(&self, expectation: &Expectation) -> Result<(), Error> {
        match expectation {
            Expectation::Document { key, version } => {
                let actual = self.document(key).map(|d| d.version);
                if actual != *version {
                    return Err(Error::Conflict(format!(
                        "{}/{} changed (expected {:?}, found {:?})",
                        key.collection, key.id, version, actual
                    )));
                }
            }
            Expectation::Collection { collection, version } => {
                let actual = self.collection_version(*collection);
                if actual != *version {
                    return Err(Error::Conflict(format!(
                        "{} changed (expected v{}, found v{})",
                        collection, version, actual
                    )));
                }
            }
        }
        Ok(())
    }

    /// Applies one write and returns whether anything changed.
    fn apply(&mut self, write: StoreWrite) -> bool {
        let collection = write.key().collection;
        let changed = match write {
            StoreWrite::Put { key, body } => {
                self.last_version += 1;
                let doc = VersionedDocument { id: key.id.clone(), version: self.last_version, body };
                self.documents.entry(collection).or_default().insert(key.id, doc);
                true
            }
            StoreWrite::Delete { key } => {
                let removed = self
                    .documents
                    .get_mut(&collection)
                    .and_then(|docs| docs.remove(&key.id))
                    .is_some();
                if removed {
                    self.last_version += 1;
                }
                removed
            }
        };
        if changed {
            self.collection_versions.insert(collection, self.last_version);
        }
        changed
    }
}

/// Process-local ledger store. Each operation holds the table lock for its
/// whole duration, so `commit` is trivially atomic.
pub struct MemoryLedgerStore {
    tables: RwLock<Tables>,
    feed: ChangeFeed,
    offline: AtomicBool,
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            feed: ChangeFeed::new(),
            offline: AtomicBool::new(false),
        }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Makes every call fail with `Error::Unavailable` until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Unavailable("ledger store is offline".into()));
        }
        Ok(())
    }

    /// Checks and applies under one lock. Returns the last version assigned,
    /// or `None` when no write changed anything.
    fn write(&self, writes: Vec<StoreWrite>, expectations: &[Expectation]) -> Result<Option<u64>, Error> {
        let (assigned, snapshots) = {
            let mut tables = self.tables.write();
            for expectation in expectations {
                tables.check(expectation)?;
            }
            let mut assigned = None;
            let mut touched = Vec::new();
            for write in writes {
                let collection = write.key().collection;
                if tables.apply(write) {
                    assigned = Some(tables.last_version);
                    if !touched.contains(&collection) {
                        touched.push(collection);
                    }
                }
            }
            let snapshots = touched.into_iter().map(|c| tables.snapshot(c)).collect::<Vec<_>>();
            (assigned, snapshots)
        };

        for snapshot in snapshots {
            self.feed.publish(snapshot);
        }
        Ok(assigned)
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<VersionedDocument>, Error> {
        self.ensure_online()?;
        let tables = self.tables.read();
        Ok(tables.document(&DocKey::new(collection, id)).cloned())
    }

    async fn put(&self, collection: Collection, id: &str, body: Value) -> Result<u64, Error> {
        self.ensure_online()?;
        let version = self.write(vec![StoreWrite::Put { key: DocKey::new(collection, id), body }], &[])?;
        Ok(version.unwrap_or_default())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, Error> {
        self.ensure_online()?;
        let version = self.write(vec![StoreWrite::Delete { key: DocKey::new(collection, id) }], &[])?;
        Ok(version.is_some())
    }

    async fn list_all(&self, collection: Collection) -> Result<CollectionSnapshot, Error> {
        self.ensure_online()?;
        Ok(self.tables.read().snapshot(collection))
    }

    async fn read(&self, keys: &[ReadKey]) -> Result<Vec<(ReadKey, ReadResult)>, Error> {
        self.ensure_online()?;
        let tables = self.tables.read();
        let results = keys
            .iter()
            .map(|key| {
                let result = match key {
                    ReadKey::Document(k) => ReadResult::Document(tables.document(k).cloned()),
                    ReadKey::Collection(c) => ReadResult::Collection(tables.snapshot(*c)),
                };
                (key.clone(), result)
            })
            .collect();
        trace!("read {} key(s)", keys.len());
        Ok(results)
    }

    async fn commit(&self, expectations: Vec<Expectation>, writes: Vec<StoreWrite>) -> Result<(), Error> {
        self.ensure_online()?;
        let count = writes.len();
        self.write(writes, &expectations)?;
        debug!("committed {} write(s) against {} expectation(s)", count, expectations.len());
        Ok(())
    }

    async fn subscribe(&self, collection: Collection) -> Result<Subscription, Error> {
        self.ensure_online()?;
        let current = self.tables.read().snapshot(collection);
        Ok(self.feed.subscribe(current))
    }

    fn close_subscriptions(&self) {
        self.feed.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_versions_never_repeat_after_delete() {
        let store = MemoryLedgerStore::new();
        store.put(Collection::Products, "p1", json!({"n": 1})).await.unwrap();
        let first = store.get(Collection::Products, "p1").await.unwrap().unwrap().version;

        assert!(store.delete(Collection::Products, "p1").await.unwrap());
        store.put(Collection::Products, "p1", json!({"n": 1})).await.unwrap();
        let second = store.get(Collection::Products, "p1").await.unwrap().unwrap().version;

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_deleting_missing_document_is_not_a_change() {
        let store = MemoryLedgerStore::new();
        let before = store.list_all(Collection::Wishes).await.unwrap().version;
        assert!(!store.delete(Collection::Wishes, "nope").await.unwrap());
        let after = store.list_all(Collection::Wishes).await.unwrap().version;
        assert_eq!(before, after);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_put_reports_its_own_version() {
        let store = std::sync::Arc::new(MemoryLedgerStore::new());
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("p{}", i);
                let version = store.put(Collection::Products, &id, json!({ "n": i })).await.unwrap();
                (id, version)
            }));
        }
        for handle in handles {
            let (id, version) = handle.await.unwrap();
            let stored = store.get(Collection::Products, &id).await.unwrap().unwrap();
            assert_eq!(stored.version, version);
        }
    }

    #[tokio::test]
    async fn test_offline_store_reports_unavailable() {
        let store = MemoryLedgerStore::new();
        store.set_offline(true);
        let err = store.get(Collection::Accounts, "x").await.unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
    }
}
