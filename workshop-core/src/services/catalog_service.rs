// File: workshop-core/src/services/catalog_service.rs

use std::sync::Arc;

use tracing::info;

use workshop_common::models::catalog::DEFAULT_BANNER_TAG;
use workshop_common::models::{
    Banner, BannerLayout, Collection, PointReason, Product, ProductCategory, ProductDraft, ReadKey,
};
use workshop_common::traits::{Document, LedgerStoreExt};
use workshop_common::Rejection;

use crate::services::LedgerContext;
use crate::utils::ids::new_id;
use crate::Error;

pub struct CatalogService {
    ctx: Arc<LedgerContext>,
}

fn validate_draft(draft: &ProductDraft) -> Result<(), Error> {
    if draft.name.trim().is_empty() {
        return Err(Error::Validation("product name is required".into()));
    }
    if draft.price <= 0 {
        return Err(Error::Validation(format!("price must be positive, got {}", draft.price)));
    }
    if draft.stock < 0 {
        return Err(Error::Validation(format!("stock cannot be negative, got {}", draft.stock)));
    }
    Ok(())
}

impl CatalogService {
    pub fn new(ctx: Arc<LedgerContext>) -> Self {
        Self { ctx }
    }

    // ------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------

    pub async fn list_products(&self) -> Result<Vec<Product>, Error> {
        self.ctx.store.list::<Product>().await
    }

    pub async fn get_product(&self, product_id: &str) -> Result<Product, Error> {
        self.ctx.store.fetch_required::<Product>(product_id).await
    }

    pub async fn add_product(&self, draft: ProductDraft) -> Result<Product, Error> {
        validate_draft(&draft)?;
        let product = Product {
            id: new_id("prod"),
            name: draft.name.trim().to_string(),
            category: draft.category,
            price: draft.price,
            stock: draft.stock,
            description: draft.description,
            image_url: draft.image_url,
        };
        self.ctx.store.save(&product).await?;
        info!("Added product {} ({}) at {} points", product.id, product.name, product.price);
        Ok(product)
    }

    /// Replaces every editable field. Vouchers already issued keep their own
    /// copy of name and price.
    pub async fn update_product(&self, product_id: &str, draft: ProductDraft) -> Result<Product, Error> {
        validate_draft(&draft)?;
        let product = self
            .ctx
            .transact(&[Product::read_key(product_id)], |tx| {
                let mut product = tx.require::<Product>(product_id)?;
                product.name = draft.name.trim().to_string();
                product.category = draft.category.clone();
                product.price = draft.price;
                product.stock = draft.stock;
                product.description = draft.description.clone();
                product.image_url = draft.image_url.clone();
                tx.put(&product)?;
                Ok(product)
            })
            .await?;
        info!("Updated product {}", product.id);
        Ok(product)
    }

    pub async fn delete_product(&self, product_id: &str) -> Result<(), Error> {
        if !self.ctx.store.remove::<Product>(product_id).await? {
            return Err(Error::NotFound(format!("product '{}'", product_id)));
        }
        info!("Deleted product {}", product_id);
        Ok(())
    }

    /// Sets stock directly; negative values clamp to zero.
    pub async fn set_stock(&self, product_id: &str, stock: i64) -> Result<Product, Error> {
        let stock = stock.max(0);
        self.ctx
            .transact(&[Product::read_key(product_id)], |tx| {
                let mut product = tx.require::<Product>(product_id)?;
                if product.stock != stock {
                    product.stock = stock;
                    tx.put(&product)?;
                }
                Ok(product)
            })
            .await
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    pub async fn list_categories(&self) -> Result<Vec<ProductCategory>, Error> {
        self.ctx.store.list::<ProductCategory>().await
    }

    pub async fn add_category(&self, name: &str) -> Result<ProductCategory, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("category name is required".into()));
        }
        let id = new_id("cat");
        let category = self
            .ctx
            .transact(&[ReadKey::Collection(Collection::ProductCategories)], |tx| {
                if tx.list::<ProductCategory>()?.iter().any(|c| c.name == name) {
                    return Err(Rejection::DuplicateName(name.to_string()).into());
                }
                let category = ProductCategory { id: id.clone(), name: name.to_string() };
                tx.put(&category)?;
                Ok(category)
            })
            .await?;
        info!("Added category {}", category.name);
        Ok(category)
    }

    /// Products keep whatever category label they had.
    pub async fn delete_category(&self, category_id: &str) -> Result<(), Error> {
        if !self.ctx.store.remove::<ProductCategory>(category_id).await? {
            return Err(Error::NotFound(format!("category '{}'", category_id)));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Banners
    // ------------------------------------------------------------------

    pub async fn add_banner(&self, image_url: &str, layout: BannerLayout) -> Result<Banner, Error> {
        let image_url = image_url.trim();
        if image_url.is_empty() {
            return Err(Error::Validation("banner image is required".into()));
        }
        let banner = Banner {
            id: new_id("banner"),
            image_url: image_url.to_string(),
            tag: layout.tag.unwrap_or_else(|| DEFAULT_BANNER_TAG.to_string()),
            active: true,
            created_at: self.ctx.now(),
            object_position: layout.object_position.unwrap_or_else(|| "center".to_string()),
            mobile_height: layout.mobile_height.unwrap_or_else(|| "h-48".to_string()),
            desktop_height: layout.desktop_height.unwrap_or_else(|| "md:h-72".to_string()),
        };
        self.ctx.store.save(&banner).await?;
        Ok(banner)
    }

    pub async fn delete_banner(&self, banner_id: &str) -> Result<(), Error> {
        if !self.ctx.store.remove::<Banner>(banner_id).await? {
            return Err(Error::NotFound(format!("banner '{}'", banner_id)));
        }
        Ok(())
    }

    pub async fn set_banner_active(&self, banner_id: &str, active: bool) -> Result<Banner, Error> {
        self.ctx
            .transact(&[Banner::read_key(banner_id)], |tx| {
                let mut banner = tx.require::<Banner>(banner_id)?;
                if banner.active != active {
                    banner.active = active;
                    tx.put(&banner)?;
                }
                Ok(banner)
            })
            .await
    }

    /// Newest first.
    pub async fn list_banners(&self) -> Result<Vec<Banner>, Error> {
        let mut banners = self.ctx.store.list::<Banner>().await?;
        banners.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(banners)
    }

    pub async fn list_active_banners(&self) -> Result<Vec<Banner>, Error> {
        let banners = self.list_banners().await?;
        Ok(banners.into_iter().filter(|b| b.active).collect())
    }

    // ------------------------------------------------------------------
    // Point reasons
    // ------------------------------------------------------------------

    pub async fn list_point_reasons(&self) -> Result<Vec<PointReason>, Error> {
        self.ctx.store.list::<PointReason>().await
    }

    pub async fn add_point_reason(&self, title: &str) -> Result<PointReason, Error> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::Validation("reason title is required".into()));
        }
        let reason = PointReason { id: new_id("reason"), title: title.to_string() };
        self.ctx.store.save(&reason).await?;
        Ok(reason)
    }

    pub async fn delete_point_reason(&self, reason_id: &str) -> Result<(), Error> {
        if !self.ctx.store.remove::<PointReason>(reason_id).await? {
            return Err(Error::NotFound(format!("point reason '{}'", reason_id)));
        }
        Ok(())
    }
}
