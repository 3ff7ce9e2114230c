// File: workshop-common/src/models/ledger.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

/// The typed collections that make up the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Accounts,
    Products,
    ProductCategories,
    Missions,
    MissionSubmissions,
    CompletionRecords,
    Redemptions,
    Wishes,
    PointReasons,
    Banners,
    MissionClaims,
    AccountNames,
}

impl Collection {
    pub const ALL: [Collection; 12] = [
        Collection::Accounts,
        Collection::Products,
        Collection::ProductCategories,
        Collection::Missions,
        Collection::MissionSubmissions,
        Collection::CompletionRecords,
        Collection::Redemptions,
        Collection::Wishes,
        Collection::PointReasons,
        Collection::Banners,
        Collection::MissionClaims,
        Collection::AccountNames,
    ];

    /// Storage name of the collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Accounts => "students",
            Collection::Products => "products",
            Collection::ProductCategories => "productCategories",
            Collection::Missions => "missions",
            Collection::MissionSubmissions => "missionSubmissions",
            Collection::CompletionRecords => "challengeHistory",
            Collection::Redemptions => "redemptions",
            Collection::Wishes => "wishes",
            Collection::PointReasons => "pointReasons",
            Collection::Banners => "banners",
            Collection::MissionClaims => "missionClaims",
            Collection::AccountNames => "accountNames",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocKey {
    pub collection: Collection,
    pub id: String,
}

impl DocKey {
    pub fn new(collection: Collection, id: impl Into<String>) -> Self {
        Self { collection, id: id.into() }
    }
}

/// One entry of a transaction's read set. Reading a whole collection pins the
/// collection version, so any write into it invalidates the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReadKey {
    Document(DocKey),
    Collection(Collection),
}

/// A stored document. `version` is drawn from a store-wide sequence, so a
/// deleted-then-recreated document never reuses an earlier version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedDocument {
    pub id: String,
    pub version: u64,
    pub body: Value,
}

/// Full current contents of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    pub collection: Collection,
    pub version: u64,
    pub documents: Vec<VersionedDocument>,
}

impl CollectionSnapshot {
    pub fn empty(collection: Collection) -> Self {
        Self { collection, version: 0, documents: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadResult {
    Document(Option<VersionedDocument>),
    Collection(CollectionSnapshot),
}

/// Commit-time check. `version: None` on a document means "must not exist".
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    Document { key: DocKey, version: Option<u64> },
    Collection { collection: Collection, version: u64 },
}

impl Expectation {
    /// The expectation that re-validates a value previously read.
    pub fn from_read(key: &ReadKey, result: &ReadResult) -> Self {
        match (key, result) {
            (ReadKey::Document(k), ReadResult::Document(doc)) => Expectation::Document {
                key: k.clone(),
                version: doc.as_ref().map(|d| d.version),
            },
            (ReadKey::Collection(c), ReadResult::Collection(snap)) => Expectation::Collection {
                collection: *c,
                version: snap.version,
            },
            (ReadKey::Document(k), ReadResult::Collection(_)) => Expectation::Document {
                key: k.clone(),
                version: None,
            },
            (ReadKey::Collection(c), ReadResult::Document(_)) => Expectation::Collection {
                collection: *c,
                version: 0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreWrite {
    Put { key: DocKey, body: Value },
    Delete { key: DocKey },
}

impl StoreWrite {
    pub fn key(&self) -> &DocKey {
        match self {
            StoreWrite::Put { key, .. } => key,
            StoreWrite::Delete { key } => key,
        }
    }
}

/// Live view of one collection. The first `next()` yields the snapshot current
/// at subscription time; later calls wait for the next committed change.
/// Dropping the subscription (or calling `unsubscribe`) stops delivery, and so
/// does closing the feed it came from.
pub struct Subscription {
    collection: Collection,
    receiver: watch::Receiver<CollectionSnapshot>,
    closed: watch::Receiver<bool>,
}

impl Subscription {
    pub fn new(
        collection: Collection,
        mut receiver: watch::Receiver<CollectionSnapshot>,
        closed: watch::Receiver<bool>,
    ) -> Self {
        receiver.mark_changed();
        Self { collection, receiver, closed }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Waits for the next snapshot. Returns `None` once the feed is closed or
    /// the store is gone.
    pub async fn next(&mut self) -> Option<CollectionSnapshot> {
        if *self.closed.borrow() {
            return None;
        }
        tokio::select! {
            changed = self.receiver.changed() => changed.ok()?,
            _ = self.closed.changed() => return None,
        }
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Latest snapshot without waiting.
    pub fn current(&self) -> CollectionSnapshot {
        self.receiver.borrow().clone()
    }

    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_names_resolve_back() {
        for c in Collection::ALL {
            assert_eq!(Collection::from_name(c.as_str()), Some(c));
        }
        assert_eq!(Collection::from_name("STUDENTS"), Some(Collection::Accounts));
        assert_eq!(Collection::from_name("nope"), None);
    }

    #[test]
    fn expectation_mirrors_what_was_read() {
        let key = ReadKey::Document(DocKey::new(Collection::Products, "p1"));
        let missing = Expectation::from_read(&key, &ReadResult::Document(None));
        assert_eq!(
            missing,
            Expectation::Document { key: DocKey::new(Collection::Products, "p1"), version: None }
        );

        let snapshot = CollectionSnapshot { collection: Collection::Wishes, version: 9, documents: vec![] };
        let pinned = Expectation::from_read(&ReadKey::Collection(Collection::Wishes), &ReadResult::Collection(snapshot));
        assert_eq!(pinned, Expectation::Collection { collection: Collection::Wishes, version: 9 });
    }
}
