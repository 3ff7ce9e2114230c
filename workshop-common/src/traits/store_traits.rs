use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;
use crate::models::{
    Account, AccountName, Banner, Collection, CollectionSnapshot, CompletionRecord, DocKey, Expectation,
    Mission, MissionClaim, MissionSubmission, PointReason, Product, ProductCategory, ReadKey, ReadResult,
    Redemption, StoreWrite, Subscription, VersionedDocument, Wish,
};

/// Persistent collection store shared by every service.
///
/// `commit` is the only multi-document primitive: it checks every expectation
/// and applies every write as one unit, or fails with `Error::Conflict` and
/// applies nothing.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<VersionedDocument>, Error>;

    /// Unconditional upsert. Returns the new version.
    async fn put(&self, collection: Collection, id: &str, body: Value) -> Result<u64, Error>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, Error>;

    async fn list_all(&self, collection: Collection) -> Result<CollectionSnapshot, Error>;

    /// Consistent versioned read of a whole read set.
    async fn read(&self, keys: &[ReadKey]) -> Result<Vec<(ReadKey, ReadResult)>, Error>;

    async fn commit(&self, expectations: Vec<Expectation>, writes: Vec<StoreWrite>) -> Result<(), Error>;

    async fn subscribe(&self, collection: Collection) -> Result<Subscription, Error>;

    /// Ends every live subscription; used on shutdown.
    fn close_subscriptions(&self);
}

/// A type stored as a JSON body in one collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn key(&self) -> DocKey {
        DocKey::new(Self::COLLECTION, self.id())
    }

    fn key_for(id: &str) -> DocKey {
        DocKey::new(Self::COLLECTION, id)
    }

    /// Read-set entry for one document of this type.
    fn read_key(id: &str) -> ReadKey {
        ReadKey::Document(Self::key_for(id))
    }

    fn from_stored(doc: &VersionedDocument) -> Result<Self, Error> {
        Ok(serde_json::from_value(doc.body.clone())?)
    }

    fn to_body(&self) -> Result<Value, Error> {
        Ok(serde_json::to_value(self)?)
    }
}

macro_rules! document {
    ($ty:ty, $collection:expr) => {
        impl Document for $ty {
            const COLLECTION: Collection = $collection;
            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

document!(Account, Collection::Accounts);
document!(Product, Collection::Products);
document!(ProductCategory, Collection::ProductCategories);
document!(Mission, Collection::Missions);
document!(MissionSubmission, Collection::MissionSubmissions);
document!(CompletionRecord, Collection::CompletionRecords);
document!(Redemption, Collection::Redemptions);
document!(Wish, Collection::Wishes);
document!(PointReason, Collection::PointReasons);
document!(Banner, Collection::Banners);
document!(MissionClaim, Collection::MissionClaims);
document!(AccountName, Collection::AccountNames);

/// Typed convenience layer over any `LedgerStore`.
#[async_trait]
pub trait LedgerStoreExt: LedgerStore {
    async fn fetch<T: Document>(&self, id: &str) -> Result<Option<T>, Error> {
        match self.get(T::COLLECTION, id).await? {
            Some(doc) => Ok(Some(T::from_stored(&doc)?)),
            None => Ok(None),
        }
    }

    async fn fetch_required<T: Document>(&self, id: &str) -> Result<T, Error> {
        self.fetch::<T>(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("{} '{}'", T::COLLECTION, id)))
    }

    async fn save<T: Document>(&self, doc: &T) -> Result<u64, Error> {
        let body = doc.to_body()?;
        self.put(T::COLLECTION, doc.id(), body).await
    }

    async fn remove<T: Document>(&self, id: &str) -> Result<bool, Error> {
        self.delete(T::COLLECTION, id).await
    }

    async fn list<T: Document>(&self) -> Result<Vec<T>, Error> {
        let snapshot = self.list_all(T::COLLECTION).await?;
        decode_all(&snapshot)
    }
}

impl<S: LedgerStore + ?Sized> LedgerStoreExt for S {}

pub fn decode_all<T: Document>(snapshot: &CollectionSnapshot) -> Result<Vec<T>, Error> {
    snapshot.documents.iter().map(T::from_stored).collect()
}
