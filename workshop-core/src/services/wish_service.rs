// File: workshop-core/src/services/wish_service.rs

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};

use workshop_common::models::{Account, LikeOutcome, Wish};
use workshop_common::traits::{Document, LedgerStoreExt};
use workshop_common::Rejection;

use crate::services::{ensure_active_student, reject_role_account, LedgerContext};
use crate::utils::ids::new_id;
use crate::Error;

/// Wish board: one wish per account per cooldown window, with a paid reset.
pub struct WishService {
    ctx: Arc<LedgerContext>,
}

impl WishService {
    pub fn new(ctx: Arc<LedgerContext>) -> Self {
        Self { ctx }
    }

    pub async fn post_wish(&self, account_id: &str, item_name: &str, description: &str) -> Result<Wish, Error> {
        let item_name = item_name.trim();
        let description = description.trim();
        if item_name.is_empty() {
            return Err(Error::Validation("wish item is required".into()));
        }
        if description.is_empty() {
            return Err(Error::Validation("wish description is required".into()));
        }

        reject_role_account(account_id)?;

        let now = self.ctx.now();
        let window = self.ctx.config.wish_cooldown;
        let id = new_id("wish");

        let (wish, account) = self
            .ctx
            .transact(&[Account::read_key(account_id)], |tx| {
                let mut account = tx.require::<Account>(account_id)?;
                ensure_active_student(&account)?;
                if let Some(until) = account.wish_cooldown_at(now) {
                    return Err(Rejection::CooldownActive { until }.into());
                }

                let wish = Wish {
                    id: id.clone(),
                    account_id: account.id.clone(),
                    account_name: account.name.clone(),
                    account_avatar: account.avatar.clone(),
                    item_name: item_name.to_string(),
                    description: description.to_string(),
                    created_at: now,
                    liked_by: Default::default(),
                };
                account.wish_cooldown_until = Some(now + window);
                tx.put(&wish)?;
                tx.put(&account)?;
                Ok((wish, account))
            })
            .await?;

        info!("Account {} wished for {}", account_id, wish.item_name);
        self.ctx.refresh_cached(&account);
        Ok(wish)
    }

    /// Adds `account_id` to the wish's like set. A repeat like changes nothing.
    pub async fn like_wish(&self, wish_id: &str, account_id: &str) -> Result<LikeOutcome, Error> {
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return Err(Error::Validation("account id is required".into()));
        }
        let outcome = self
            .ctx
            .transact(&[Wish::read_key(wish_id)], |tx| {
                let mut wish = tx.require::<Wish>(wish_id)?;
                if !wish.liked_by.insert(account_id.to_string()) {
                    return Ok(LikeOutcome::AlreadyLiked);
                }
                tx.put(&wish)?;
                Ok(LikeOutcome::Liked)
            })
            .await?;
        debug!("like on wish {} by {}: {:?}", wish_id, account_id, outcome);
        Ok(outcome)
    }

    /// Spends the reset cost to end a running cooldown early. Lifetime points
    /// are untouched; the next wish starts a fresh cooldown.
    pub async fn reset_cooldown(&self, account_id: &str) -> Result<Account, Error> {
        reject_role_account(account_id)?;
        let now = self.ctx.now();
        let cost = self.ctx.config.cooldown_reset_cost;

        let account = self
            .ctx
            .transact(&[Account::read_key(account_id)], |tx| {
                let mut account = tx.require::<Account>(account_id)?;
                ensure_active_student(&account)?;
                if account.balance < cost {
                    return Err(Rejection::InsufficientPoints { required: cost, available: account.balance }.into());
                }

                if account.wish_cooldown_at(now).is_none() {
                    return Err(Rejection::CooldownNotActive.into());
                }

                account.balance -= cost;
                account.wish_cooldown_until = None;
                tx.put(&account)?;
                Ok(account)
            })
            .await?;

        info!("Account {} paid {} to reset the wish cooldown", account.id, cost);
        self.ctx.refresh_cached(&account);
        Ok(account.redacted())
    }

    /// Time left before the account may wish again.
    pub async fn cooldown_remaining(&self, account_id: &str) -> Result<Option<Duration>, Error> {
        let account = self.ctx.store.fetch_required::<Account>(account_id).await?;
        let now = self.ctx.now();
        Ok(account.wish_cooldown_at(now).map(|until| until - now))
    }

    pub async fn delete_wish(&self, wish_id: &str) -> Result<(), Error> {
        if !self.ctx.store.remove::<Wish>(wish_id).await? {
            return Err(Error::NotFound(format!("wish '{}'", wish_id)));
        }
        Ok(())
    }

    /// Newest first.
    pub async fn list_wishes(&self) -> Result<Vec<Wish>, Error> {
        let mut wishes = self.ctx.store.list::<Wish>().await?;
        wishes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(wishes)
    }
}
