// File: workshop-core/src/services/redemption_service.rs

use std::sync::Arc;

use tracing::{info, warn};

use workshop_common::models::{
    Account, Product, Redemption, RedemptionReceipt, RedemptionStatus, RefundPolicy,
};
use workshop_common::traits::{Document, LedgerStoreExt};
use workshop_common::Rejection;

use crate::services::{checked_credit, ensure_active_student, reject_role_account, LedgerContext};
use crate::utils::ids::{new_id, normalize_code, voucher_code};
use crate::Error;

/// Voucher lifecycle: `pending -> completed` or `pending -> cancelled`.
pub struct RedemptionService {
    ctx: Arc<LedgerContext>,
}

impl RedemptionService {
    pub fn new(ctx: Arc<LedgerContext>) -> Self {
        Self { ctx }
    }

    /// Spends points on one unit of a product and issues a pending voucher.
    ///
    /// Stock, balance and the new voucher are committed together; if another
    /// redemption wins the race for the last unit this one re-reads and fails
    /// with `OutOfStock`.
    pub async fn create_redemption(&self, account_id: &str, product_id: &str) -> Result<RedemptionReceipt, Error> {
        reject_role_account(account_id)?;

        let now = self.ctx.now();
        let id = new_id("rdm");
        let code = voucher_code(product_id, now);
        let read_set = [Account::read_key(account_id), Product::read_key(product_id)];

        let outcome = self
            .ctx
            .transact(&read_set, |tx| {
                let mut account = tx.require::<Account>(account_id)?;
                ensure_active_student(&account)?;
                let mut product = tx.require::<Product>(product_id)?;

                if product.stock <= 0 {
                    return Err(Rejection::OutOfStock { product: product.name.clone() }.into());
                }
                if account.balance < product.price {
                    return Err(Rejection::InsufficientPoints {
                        required: product.price,
                        available: account.balance,
                    }
                    .into());
                }

                product.stock -= 1;
                account.balance -= product.price;

                let redemption = Redemption {
                    id: id.clone(),
                    account_id: account.id.clone(),
                    product_id: product.id.clone(),
                    product_name: product.name.clone(),
                    points_spent: product.price,
                    created_at: now,
                    status: RedemptionStatus::Pending,
                    code: code.clone(),
                };

                tx.put(&product)?;
                tx.put(&account)?;
                tx.put(&redemption)?;
                Ok((redemption, account, product.stock))
            })
            .await;

        let (redemption, account, stock) = match outcome {
            Ok(v) => v,
            Err(e) => {
                if let Some(r) = e.rejection() {
                    warn!("Redemption of {} by {} refused: {}", product_id, account_id, r);
                }
                return Err(e);
            }
        };

        info!(
            "Account {} redeemed {} for {} point(s); voucher {}",
            account.id, redemption.product_name, redemption.points_spent, redemption.code
        );
        self.ctx.refresh_cached(&account);
        Ok(RedemptionReceipt { redemption, balance: account.balance, stock })
    }

    /// Resolves a scanned or typed code to a pending voucher. Codes of
    /// completed or cancelled vouchers are reported as not found.
    pub async fn lookup_by_code(&self, code: &str) -> Result<Redemption, Error> {
        let wanted = normalize_code(code);
        if wanted.is_empty() {
            return Err(Error::Validation("voucher code is required".into()));
        }
        self.ctx
            .store
            .list::<Redemption>()
            .await?
            .into_iter()
            .find(|r| r.status == RedemptionStatus::Pending && normalize_code(&r.code) == wanted)
            .ok_or_else(|| Error::NotFound(format!("voucher '{}'", code.trim())))
    }

    /// pending -> completed. Confirming an already completed voucher returns
    /// it unchanged.
    pub async fn confirm_redemption(&self, redemption_id: &str) -> Result<Redemption, Error> {
        let redemption = self
            .ctx
            .transact(&[Redemption::read_key(redemption_id)], |tx| {
                let mut redemption = tx.require::<Redemption>(redemption_id)?;
                match redemption.status {
                    RedemptionStatus::Completed => Ok(redemption),
                    status if status.can_transition_to(RedemptionStatus::Completed) => {
                        redemption.status = RedemptionStatus::Completed;
                        tx.put(&redemption)?;
                        Ok(redemption)
                    }
                    status => Err(invalid_transition(status, RedemptionStatus::Completed)),
                }
            })
            .await?;

        info!("Voucher {} is {}", redemption.code, redemption.status);
        Ok(redemption)
    }

    /// pending -> cancelled, applying the configured refund policy.
    pub async fn cancel_redemption(&self, redemption_id: &str) -> Result<Redemption, Error> {
        let existing = self.ctx.store.fetch_required::<Redemption>(redemption_id).await?;
        let policy = self.ctx.config.refund_policy;

        let mut read_set = vec![Redemption::read_key(redemption_id)];
        if policy == RefundPolicy::RestockAndRefund {
            read_set.push(Account::read_key(&existing.account_id));
            read_set.push(Product::read_key(&existing.product_id));
        }

        let (redemption, refunded) = self
            .ctx
            .transact(&read_set, |tx| {
                let mut redemption = tx.require::<Redemption>(redemption_id)?;
                if !redemption.status.can_transition_to(RedemptionStatus::Cancelled) {
                    return Err(invalid_transition(redemption.status, RedemptionStatus::Cancelled));
                }
                redemption.status = RedemptionStatus::Cancelled;
                tx.put(&redemption)?;

                let mut refunded = None;
                if policy == RefundPolicy::RestockAndRefund {
                    if let Some(mut product) = tx.get::<Product>(&redemption.product_id)? {
                        product.stock = checked_credit(product.stock, 1)?;
                        tx.put(&product)?;
                    }
                    if let Some(mut account) = tx.get::<Account>(&redemption.account_id)? {
                        account.balance = checked_credit(account.balance, redemption.points_spent)?;
                        tx.put(&account)?;
                        refunded = Some(account);
                    }
                }
                Ok((redemption, refunded))
            })
            .await?;

        match &refunded {
            Some(account) => {
                info!(
                    "Voucher {} cancelled; refunded {} point(s) to {}",
                    redemption.code, redemption.points_spent, account.id
                );
                self.ctx.refresh_cached(account);
            }
            None => info!("Voucher {} cancelled without refund", redemption.code),
        }
        Ok(redemption)
    }

    pub async fn get_redemption(&self, redemption_id: &str) -> Result<Redemption, Error> {
        self.ctx.store.fetch_required::<Redemption>(redemption_id).await
    }

    /// Newest first.
    pub async fn list_redemptions(&self) -> Result<Vec<Redemption>, Error> {
        let mut all = self.ctx.store.list::<Redemption>().await?;
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    pub async fn list_redemptions_for_account(&self, account_id: &str) -> Result<Vec<Redemption>, Error> {
        let all = self.list_redemptions().await?;
        Ok(all.into_iter().filter(|r| r.account_id == account_id).collect())
    }

    pub async fn list_pending(&self) -> Result<Vec<Redemption>, Error> {
        let all = self.list_redemptions().await?;
        Ok(all.into_iter().filter(|r| r.status == RedemptionStatus::Pending).collect())
    }

    /// Case-insensitive match on product name, voucher id or code.
    pub async fn search_redemptions(&self, term: &str) -> Result<Vec<Redemption>, Error> {
        let term = term.trim().to_lowercase();
        let all = self.list_redemptions().await?;
        if term.is_empty() {
            return Ok(all);
        }
        Ok(all
            .into_iter()
            .filter(|r| {
                r.product_name.to_lowercase().contains(&term)
                    || r.id.to_lowercase().contains(&term)
                    || r.code.to_lowercase().contains(&term)
            })
            .collect())
    }
}

fn invalid_transition(from: RedemptionStatus, to: RedemptionStatus) -> Error {
    Rejection::InvalidTransition { from: from.to_string(), to: to.to_string() }.into()
}
