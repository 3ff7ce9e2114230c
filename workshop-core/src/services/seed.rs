//! Starter catalog for an empty ledger.

use tracing::info;

use workshop_common::models::{Product, ProductCategory};
use workshop_common::traits::LedgerStoreExt;

use crate::services::LedgerContext;
use crate::Error;

const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("cat_food", "food"),
    ("cat_electronic", "electronic"),
    ("cat_ticket", "ticket"),
    ("cat_other", "other"),
];

pub fn default_products() -> Vec<Product> {
    let product = |id: &str, name: &str, category: &str, price: i64, stock: i64, description: &str, photo: &str| Product {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        price,
        stock,
        description: description.to_string(),
        image_url: format!(
            "https://images.unsplash.com/photo-{}?q=80&w=400&h=300&auto=format&fit=crop",
            photo
        ),
    };
    vec![
        product("p1", "精緻手工餅乾盒", "food", 150, 12, "酥脆可口的各種口味手工餅乾，下午茶首選。", "1558961363-fa8fdf82db35"),
        product("p2", "珍珠奶茶兌換券", "food", 80, 45, "全台連鎖手搖飲中杯珍奶兌換券一張。", "1544467316-e97029d2d47b"),
        product("p3", "最新旗艦智慧手機", "electronic", 12000, 1, "年度最強旗艦機，擁有頂級攝影效能。", "1511707171634-5f897ff02aa9"),
        product("p4", "威秀影城電影票", "ticket", 320, 8, "全台威秀影城適用，享受震撼大銀幕。", "1489599849927-2ee91cede3ba"),
        product("p5", "五星飯店下午茶券", "food", 800, 3, "知名五星級飯店雙人英式下午茶。", "1544739313-6fad02872377"),
        product("p6", "降噪藍牙耳機", "electronic", 2500, 5, "極致靜謐，享受純淨音質體驗。", "1505740420928-5e560c06d30e"),
    ]
}

/// Loads the default products and categories, but only into empty collections.
pub async fn seed_defaults(ctx: &LedgerContext) -> Result<(), Error> {
    if ctx.store.list::<Product>().await?.is_empty() {
        for product in default_products() {
            ctx.store.save(&product).await?;
        }
        info!("Seeded default products");
    }
    if ctx.store.list::<ProductCategory>().await?.is_empty() {
        for (id, name) in DEFAULT_CATEGORIES {
            ctx.store
                .save(&ProductCategory { id: id.to_string(), name: name.to_string() })
                .await?;
        }
        info!("Seeded default categories");
    }
    Ok(())
}
