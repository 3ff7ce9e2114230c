use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Loosely keyed to `ProductCategory::name`; may go stale when a category is deleted.
    pub category: String,
    pub price: i64,
    pub stock: i64,
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    pub id: String,
    pub name: String,
}

/// Storefront carousel entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: String,
    pub image_url: String,
    pub tag: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub object_position: String,
    pub mobile_height: String,
    pub desktop_height: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerLayout {
    pub tag: Option<String>,
    pub object_position: Option<String>,
    pub mobile_height: Option<String>,
    pub desktop_height: Option<String>,
}

pub const DEFAULT_BANNER_TAG: &str = "精選推薦";

/// Suggested justification for a manual point grant. Advisory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointReason {
    pub id: String,
    pub title: String,
}

/// Fields accepted when creating or editing a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub price: i64,
    pub stock: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
}

fn default_category() -> String {
    "other".to_string()
}
