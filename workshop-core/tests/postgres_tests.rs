// File: workshop-core/tests/postgres_tests.rs
//
// Needs a scratch database: TEST_DATABASE_URL=postgres://... cargo test -- --ignored

mod test_utils;

use std::sync::Arc;

use workshop_common::models::{Collection, DocKey, Expectation, ProductDraft, StoreWrite};
use workshop_common::traits::LedgerStore;
use workshop_common::Rejection;
use workshop_core::repositories::PostgresLedgerStore;
use workshop_core::services::WorkshopServices;
use workshop_core::utils::time::ManualClock;
use workshop_core::{Database, Error};

use test_utils::{t0, test_config};

async fn fresh_store() -> Result<Arc<PostgresLedgerStore>, Error> {
    let url = std::env::var("TEST_DATABASE_URL")
        .map_err(|_| Error::Unavailable("TEST_DATABASE_URL is not set".into()))?;
    let db = Database::new(&url).await?;
    db.migrate().await?;
    sqlx::query("DELETE FROM ledger_documents").execute(db.pool()).await?;
    Ok(Arc::new(PostgresLedgerStore::new(db.pool().clone())))
}

#[tokio::test]
#[ignore]
async fn test_postgres_commit_checks_versions() -> Result<(), Error> {
    let store = fresh_store().await?;
    let key = DocKey::new(Collection::Products, "p1");

    let v1 = store.put(Collection::Products, "p1", serde_json::json!({ "stock": 1 })).await?;
    store
        .commit(
            vec![Expectation::Document { key: key.clone(), version: Some(v1) }],
            vec![StoreWrite::Put { key: key.clone(), body: serde_json::json!({ "stock": 0 }) }],
        )
        .await?;

    let stale = store
        .commit(
            vec![Expectation::Document { key: key.clone(), version: Some(v1) }],
            vec![StoreWrite::Delete { key: key.clone() }],
        )
        .await
        .unwrap_err();
    assert!(matches!(stale, Error::Conflict(_)));
    assert!(store.get(Collection::Products, "p1").await?.is_some());
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_postgres_concurrent_redemptions() -> Result<(), Error> {
    let store = fresh_store().await?;
    let clock = Arc::new(ManualClock::new(t0()));
    let services = Arc::new(WorkshopServices::new(store, clock, test_config()));

    let product = services
        .catalog
        .add_product(ProductDraft {
            name: "Last One".into(),
            category: "other".into(),
            price: 10,
            stock: 1,
            description: String::new(),
            image_url: String::new(),
        })
        .await?;

    let mut handles = Vec::new();
    for i in 0..4 {
        let account = services.accounts.register(&format!("pg-racer-{i}"), "pw", None).await?;
        services.accounts.approve(&account.id).await?;
        services.accounts.grant_points(&account.id, 10, None).await?;
        let services = services.clone();
        let product_id = product.id.clone();
        handles.push(tokio::spawn(async move {
            services.redemptions.create_redemption(&account.id, &product_id).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => winners += 1,
            Err(Error::PreconditionFailed(Rejection::OutOfStock { .. })) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(services.catalog.get_product(&product.id).await?.stock, 0);
    Ok(())
}
