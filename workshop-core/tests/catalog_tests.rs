// File: workshop-core/tests/catalog_tests.rs

mod test_utils;

use chrono::Duration;

use workshop_common::models::{BannerLayout, ProductDraft};
use workshop_common::Rejection;
use workshop_core::Error;

use test_utils::harness;

fn draft(name: &str, price: i64, stock: i64) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        category: "food".to_string(),
        price,
        stock,
        description: String::new(),
        image_url: String::new(),
    }
}

#[tokio::test]
async fn test_product_crud() -> Result<(), Error> {
    let h = harness();
    let product = h.services.catalog.add_product(draft(" 奶茶 ", 80, 10)).await?;
    assert_eq!(product.name, "奶茶");

    let updated = h.services.catalog.update_product(&product.id, draft("大杯奶茶", 90, 8)).await?;
    assert_eq!((updated.price, updated.stock), (90, 8));
    assert_eq!(h.services.catalog.get_product(&product.id).await?, updated);

    h.services.catalog.delete_product(&product.id).await?;
    assert!(h.services.catalog.list_products().await?.is_empty());
    assert!(matches!(h.services.catalog.get_product(&product.id).await, Err(Error::NotFound(_))));
    assert!(matches!(
        h.services.catalog.update_product(&product.id, draft("x", 1, 1)).await,
        Err(Error::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_product_draft_validation() -> Result<(), Error> {
    let h = harness();
    for bad in [draft("", 10, 1), draft("x", 0, 1), draft("x", 10, -1)] {
        let err = h.services.catalog.add_product(bad).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
    Ok(())
}

#[tokio::test]
async fn test_set_stock_clamps_at_zero() -> Result<(), Error> {
    let h = harness();
    let product = h.product("Pen", 10, 3).await?;
    assert_eq!(h.services.catalog.set_stock(&product.id, 7).await?.stock, 7);
    assert_eq!(h.services.catalog.set_stock(&product.id, -4).await?.stock, 0);
    Ok(())
}

#[tokio::test]
async fn test_categories_are_unique_by_name() -> Result<(), Error> {
    let h = harness();
    let cat = h.services.catalog.add_category("books").await?;
    let dup = h.services.catalog.add_category(" books ").await.unwrap_err();
    assert!(matches!(dup, Error::PreconditionFailed(Rejection::DuplicateName(_))));

    h.services.catalog.delete_category(&cat.id).await?;
    assert!(h.services.catalog.list_categories().await?.is_empty());
    h.services.catalog.add_category("books").await?;
    Ok(())
}

#[tokio::test]
async fn test_banners_default_layout_and_activation() -> Result<(), Error> {
    let h = harness();
    let first = h.services.catalog.add_banner("https://img/1.png", BannerLayout::default()).await?;
    assert_eq!(first.tag, "精選推薦");
    assert_eq!(first.object_position, "center");
    assert!(first.active);

    h.clock.advance(Duration::minutes(1));
    let second = h
        .services
        .catalog
        .add_banner(
            "https://img/2.png",
            BannerLayout { tag: Some("新品".into()), ..BannerLayout::default() },
        )
        .await?;

    let all = h.services.catalog.list_banners().await?;
    assert_eq!(all[0].id, second.id, "newest first");

    h.services.catalog.set_banner_active(&first.id, false).await?;
    let active = h.services.catalog.list_active_banners().await?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].tag, "新品");

    let blank = h.services.catalog.add_banner("  ", BannerLayout::default()).await.unwrap_err();
    assert!(matches!(blank, Error::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn test_point_reasons() -> Result<(), Error> {
    let h = harness();
    let reason = h.services.catalog.add_point_reason("上課專心").await?;
    assert_eq!(h.services.catalog.list_point_reasons().await?.len(), 1);
    h.services.catalog.delete_point_reason(&reason.id).await?;
    assert!(matches!(
        h.services.catalog.delete_point_reason(&reason.id).await,
        Err(Error::NotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_seed_defaults_fills_only_empty_collections() -> Result<(), Error> {
    let h = harness();
    h.services.seed_defaults().await?;
    let products = h.services.catalog.list_products().await?;
    assert_eq!(products.len(), 6);
    assert_eq!(h.services.catalog.list_categories().await?.len(), 4);

    h.services.catalog.delete_product("p1").await?;
    h.services.seed_defaults().await?;
    assert_eq!(h.services.catalog.list_products().await?.len(), 5);
    Ok(())
}
