// File: workshop-core/src/repositories/transaction.rs

use std::collections::HashMap;

use tracing::{debug, warn};

use workshop_common::models::{
    Collection, DocKey, Expectation, ReadKey, ReadResult, StoreWrite, VersionedDocument,
};
use workshop_common::traits::{Document, LedgerStore};

use crate::Error;

/// How hard `run_transaction` tries before giving up on a contended read set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionPolicy {
    /// Total attempts including the first; 2 means one retry.
    pub max_attempts: u32,
}

impl Default for TransactionPolicy {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

/// One attempt's view of the store: the versioned read set plus the writes
/// staged so far. Staged writes are visible to later reads in the same body.
pub struct Transaction {
    reads: HashMap<ReadKey, ReadResult>,
    writes: Vec<StoreWrite>,
}

impl Transaction {
    fn new(reads: Vec<(ReadKey, ReadResult)>) -> Self {
        Self { reads: reads.into_iter().collect(), writes: Vec::new() }
    }

    fn staged(&self, key: &DocKey) -> Option<Option<&serde_json::Value>> {
        self.writes.iter().rev().find(|w| w.key() == key).map(|w| match w {
            StoreWrite::Put { body, .. } => Some(body),
            StoreWrite::Delete { .. } => None,
        })
    }

    fn snapshot_doc(&self, key: &DocKey) -> Result<Option<&VersionedDocument>, Error> {
        if let Some(ReadResult::Document(doc)) = self.reads.get(&ReadKey::Document(key.clone())) {
            return Ok(doc.as_ref());
        }
        if let Some(ReadResult::Collection(snapshot)) = self.reads.get(&ReadKey::Collection(key.collection)) {
            return Ok(snapshot.documents.iter().find(|d| d.id == key.id));
        }
        Err(Error::Validation(format!(
            "{}/{} is outside the transaction read set",
            key.collection, key.id
        )))
    }

    pub fn get<T: Document>(&self, id: &str) -> Result<Option<T>, Error> {
        let key = DocKey::new(T::COLLECTION, id);
        if let Some(staged) = self.staged(&key) {
            return match staged {
                Some(body) => Ok(Some(serde_json::from_value(body.clone())?)),
                None => Ok(None),
            };
        }
        match self.snapshot_doc(&key)? {
            Some(doc) => Ok(Some(T::from_stored(doc)?)),
            None => Ok(None),
        }
    }

    pub fn require<T: Document>(&self, id: &str) -> Result<T, Error> {
        self.get::<T>(id)?
            .ok_or_else(|| Error::NotFound(format!("{} '{}'", T::COLLECTION, id)))
    }

    /// Every document of a collection that was read whole, with staged writes applied.
    pub fn list<T: Document>(&self) -> Result<Vec<T>, Error> {
        let collection = T::COLLECTION;
        let Some(ReadResult::Collection(snapshot)) = self.reads.get(&ReadKey::Collection(collection)) else {
            return Err(Error::Validation(format!(
                "collection {} is outside the transaction read set",
                collection
            )));
        };

        let mut items = Vec::with_capacity(snapshot.documents.len());
        for doc in &snapshot.documents {
            if let Some(item) = self.get::<T>(&doc.id)? {
                items.push(item);
            }
        }
        for write in &self.writes {
            if let StoreWrite::Put { key, body } = write {
                let is_new = key.collection == collection
                    && !snapshot.documents.iter().any(|d| d.id == key.id)
                    && !items.iter().any(|i: &T| i.id() == key.id);
                if is_new {
                    items.push(serde_json::from_value(body.clone())?);
                }
            }
        }
        Ok(items)
    }

    pub fn put<T: Document>(&mut self, doc: &T) -> Result<(), Error> {
        let body = doc.to_body()?;
        self.writes.push(StoreWrite::Put { key: doc.key(), body });
        Ok(())
    }

    pub fn delete<T: Document>(&mut self, id: &str) {
        self.writes.push(StoreWrite::Delete { key: DocKey::new(T::COLLECTION, id) });
    }

    pub fn touched(&self) -> Vec<Collection> {
        let mut out: Vec<Collection> = Vec::new();
        for w in &self.writes {
            if !out.contains(&w.key().collection) {
                out.push(w.key().collection);
            }
        }
        out
    }

    fn into_commit(self) -> (Vec<Expectation>, Vec<StoreWrite>) {
        let expectations = self
            .reads
            .iter()
            .map(|(key, result)| Expectation::from_read(key, result))
            .collect();
        (expectations, self.writes)
    }
}

/// Reads `read_set`, runs `body` on the snapshot and commits the staged
/// writes with every read version as a precondition.
///
/// A `Conflict` re-runs the whole read/body/commit cycle up to
/// `policy.max_attempts` times. Any other error from the body or the store
/// ends the transaction immediately with nothing applied.
pub async fn run_transaction<S, T, F>(
    store: &S,
    policy: &TransactionPolicy,
    read_set: &[ReadKey],
    mut body: F,
) -> Result<T, Error>
where
    S: LedgerStore + ?Sized,
    F: FnMut(&mut Transaction) -> Result<T, Error>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let reads = store.read(read_set).await?;
        let mut tx = Transaction::new(reads);
        let value = body(&mut tx)?;

        if tx.writes.is_empty() {
            return Ok(value);
        }

        let touched = tx.touched();
        let (expectations, writes) = tx.into_commit();
        match store.commit(expectations, writes).await {
            Ok(()) => {
                debug!("transaction committed on attempt {} touching {:?}", attempt, touched);
                return Ok(value);
            }
            Err(e) if e.is_conflict() && attempt < max_attempts => {
                warn!("transaction conflict on attempt {}/{}: {}; retrying", attempt, max_attempts, e);
                attempt += 1;
            }
            Err(e) => {
                if e.is_conflict() {
                    warn!("transaction gave up after {} attempt(s): {}", attempt, e);
                }
                return Err(e);
            }
        }
    }
}
