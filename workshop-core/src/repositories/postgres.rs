// File: workshop-core/src/repositories/postgres.rs

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Pool, Postgres, Row, Transaction as PgTransaction};
use tracing::{debug, error};

use workshop_common::models::{
    Collection, CollectionSnapshot, DocKey, Expectation, ReadKey, ReadResult, StoreWrite,
    Subscription, VersionedDocument,
};
use workshop_common::traits::LedgerStore;

use crate::eventbus::ChangeFeed;
use crate::Error;

/// Ledger store over the `ledger_documents` / `ledger_collections` tables.
///
/// Writers lock the `ledger_collections` rows of every collection they read
/// or write (in name order), so version checks and writes are serialized per
/// collection. Versions come from `ledger_version_seq`.
pub struct PostgresLedgerStore {
    pool: Pool<Postgres>,
    feed: ChangeFeed,
}

impl PostgresLedgerStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool, feed: ChangeFeed::new() }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    async fn begin(&self) -> Result<PgTransaction<'_, Postgres>, Error> {
        self.pool.begin().await.map_err(|e| {
            error!("ledger database unreachable: {}", e);
            Error::Unavailable(format!("ledger database unreachable: {}", e))
        })
    }

    async fn snapshot_in(
        conn: &mut PgTransaction<'_, Postgres>,
        collection: Collection,
    ) -> Result<CollectionSnapshot, Error> {
        let version_row = sqlx::query(
            r#"
            SELECT version
            FROM ledger_collections
            WHERE collection = $1
            "#,
        )
            .bind(collection.as_str())
            .fetch_optional(&mut **conn)
            .await?;
        let version: i64 = match version_row {
            Some(r) => r.try_get("version")?,
            None => 0,
        };

        let rows = sqlx::query(
            r#"
            SELECT id, version, body
            FROM ledger_documents
            WHERE collection = $1
            ORDER BY id
            "#,
        )
            .bind(collection.as_str())
            .fetch_all(&mut **conn)
            .await?;

        let mut documents = Vec::with_capacity(rows.len());
        for r in rows {
            documents.push(row_to_document(&r)?);
        }

        Ok(CollectionSnapshot { collection, version: version as u64, documents })
    }

    async fn document_in(
        conn: &mut PgTransaction<'_, Postgres>,
        key: &DocKey,
    ) -> Result<Option<VersionedDocument>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT id, version, body
            FROM ledger_documents
            WHERE collection = $1 AND id = $2
            "#,
        )
            .bind(key.collection.as_str())
            .bind(&key.id)
            .fetch_optional(&mut **conn)
            .await?;

        match row_opt {
            Some(r) => Ok(Some(row_to_document(&r)?)),
            None => Ok(None),
        }
    }

    /// Checks `expectations` and applies `writes` in one SQL transaction.
    /// Returns the last version assigned, if any write changed something.
    async fn apply(&self, expectations: &[Expectation], writes: Vec<StoreWrite>) -> Result<Option<u64>, Error> {
        let mut locked: BTreeSet<&'static str> = BTreeSet::new();
        for e in expectations {
            locked.insert(match e {
                Expectation::Document { key, .. } => key.collection.as_str(),
                Expectation::Collection { collection, .. } => collection.as_str(),
            });
        }
        for w in &writes {
            locked.insert(w.key().collection.as_str());
        }

        let mut tx = self.begin().await?;

        let names: Vec<String> = locked.iter().map(|s| s.to_string()).collect();
        let rows = sqlx::query(
            r#"
            SELECT collection, version
            FROM ledger_collections
            WHERE collection = ANY($1)
            ORDER BY collection
            FOR UPDATE
            "#,
        )
            .bind(&names)
            .fetch_all(&mut *tx)
            .await?;

        let mut collection_versions = std::collections::HashMap::new();
        for r in &rows {
            let name: String = r.try_get("collection")?;
            let version: i64 = r.try_get("version")?;
            collection_versions.insert(name, version as u64);
        }

        for expectation in expectations {
            match expectation {
                Expectation::Document { key, version } => {
                    let actual = Self::document_in(&mut tx, key).await?.map(|d| d.version);
                    if actual != *version {
                        return Err(Error::Conflict(format!(
                            "{}/{} changed (expected {:?}, found {:?})",
                            key.collection, key.id, version, actual
                        )));
                    }
                }
                Expectation::Collection { collection, version } => {
                    let actual = collection_versions.get(collection.as_str()).copied().unwrap_or(0);
                    if actual != *version {
                        return Err(Error::Conflict(format!(
                            "{} changed (expected v{}, found v{})",
                            collection, version, actual
                        )));
                    }
                }
            }
        }

        let mut last_version = None;
        let mut touched: Vec<Collection> = Vec::new();
        for write in writes {
            let collection = write.key().collection;
            let assigned: Option<i64> = match write {
                StoreWrite::Put { key, body } => {
                    let r = sqlx::query(
                        r#"
                        INSERT INTO ledger_documents (collection, id, version, body, updated_at)
                        VALUES ($1, $2, nextval('ledger_version_seq'), $3, now())
                        ON CONFLICT (collection, id) DO UPDATE
                            SET version = EXCLUDED.version,
                                body = EXCLUDED.body,
                                updated_at = EXCLUDED.updated_at
                        RETURNING version
                        "#,
                    )
                        .bind(key.collection.as_str())
                        .bind(&key.id)
                        .bind(&body)
                        .fetch_one(&mut *tx)
                        .await?;
                    Some(r.try_get("version")?)
                }
                StoreWrite::Delete { key } => {
                    let r = sqlx::query(
                        r#"
                        WITH removed AS (
                            DELETE FROM ledger_documents
                            WHERE collection = $1 AND id = $2
                            RETURNING id
                        )
                        SELECT CASE WHEN EXISTS (SELECT 1 FROM removed)
                               THEN nextval('ledger_version_seq') END AS version
                        "#,
                    )
                        .bind(key.collection.as_str())
                        .bind(&key.id)
                        .fetch_one(&mut *tx)
                        .await?;
                    r.try_get("version")?
                }
            };

            if let Some(version) = assigned {
                sqlx::query(
                    r#"
                    INSERT INTO ledger_collections (collection, version)
                    VALUES ($1, $2)
                    ON CONFLICT (collection) DO UPDATE SET version = EXCLUDED.version
                    "#,
                )
                    .bind(collection.as_str())
                    .bind(version)
                    .execute(&mut *tx)
                    .await?;
                last_version = Some(version as u64);
                if !touched.contains(&collection) {
                    touched.push(collection);
                }
            }
        }

        tx.commit().await?;

        for collection in touched {
            match self.list_all(collection).await {
                Ok(snapshot) => self.feed.publish(snapshot),
                Err(e) => error!("failed to publish {} snapshot: {}", collection, e),
            }
        }

        Ok(last_version)
    }
}

fn row_to_document(r: &sqlx::postgres::PgRow) -> Result<VersionedDocument, Error> {
    let version: i64 = r.try_get("version")?;
    Ok(VersionedDocument {
        id: r.try_get("id")?,
        version: version as u64,
        body: r.try_get::<Value, _>("body")?,
    })
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<VersionedDocument>, Error> {
        let mut tx = self.begin().await?;
        let doc = Self::document_in(&mut tx, &DocKey::new(collection, id)).await?;
        tx.commit().await?;
        Ok(doc)
    }

    async fn put(&self, collection: Collection, id: &str, body: Value) -> Result<u64, Error> {
        let version = self
            .apply(&[], vec![StoreWrite::Put { key: DocKey::new(collection, id), body }])
            .await?;
        Ok(version.unwrap_or_default())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, Error> {
        let version = self
            .apply(&[], vec![StoreWrite::Delete { key: DocKey::new(collection, id) }])
            .await?;
        Ok(version.is_some())
    }

    async fn list_all(&self, collection: Collection) -> Result<CollectionSnapshot, Error> {
        let mut tx = self.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;
        let snapshot = Self::snapshot_in(&mut tx, collection).await?;
        tx.commit().await?;
        Ok(snapshot)
    }

    async fn read(&self, keys: &[ReadKey]) -> Result<Vec<(ReadKey, ReadResult)>, Error> {
        let mut tx = self.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let result = match key {
                ReadKey::Document(k) => ReadResult::Document(Self::document_in(&mut tx, k).await?),
                ReadKey::Collection(c) => ReadResult::Collection(Self::snapshot_in(&mut tx, *c).await?),
            };
            results.push((key.clone(), result));
        }
        tx.commit().await?;
        debug!("read {} key(s) from postgres", keys.len());
        Ok(results)
    }

    async fn commit(&self, expectations: Vec<Expectation>, writes: Vec<StoreWrite>) -> Result<(), Error> {
        self.apply(&expectations, writes).await?;
        Ok(())
    }

    async fn subscribe(&self, collection: Collection) -> Result<Subscription, Error> {
        let current = self.list_all(collection).await?;
        Ok(self.feed.subscribe(current))
    }

    fn close_subscriptions(&self) {
        self.feed.close();
    }
}
