// src/services/mod.rs

pub mod account_service;
pub mod catalog_service;
pub mod context;
pub mod encouragement_service;
pub mod mission_service;
pub mod redemption_service;
pub mod seed;
pub mod wish_service;

use std::sync::Arc;

use workshop_ai::build_provider;
use workshop_common::models::account::{ADMIN_ACCOUNT_ID, GUEST_ACCOUNT_ID};
use workshop_common::models::{Account, Role, RoleAccount};
use workshop_common::traits::LedgerStore;
use workshop_common::Rejection;

use crate::auth::SessionStore;
use crate::config::WorkshopConfig;
use crate::utils::time::Clock;
use crate::Error;

pub use account_service::AccountService;
pub use catalog_service::CatalogService;
pub use context::LedgerContext;
pub use encouragement_service::EncouragementService;
pub use mission_service::MissionService;
pub use redemption_service::RedemptionService;
pub use wish_service::WishService;

pub(crate) fn role_account(account_id: &str) -> Option<RoleAccount> {
    match account_id {
        ADMIN_ACCOUNT_ID => Some(RoleAccount::Admin),
        GUEST_ACCOUNT_ID => Some(RoleAccount::Guest),
        _ => None,
    }
}

/// The shared role logins never own points, vouchers, submissions or wishes.
pub(crate) fn reject_role_account(account_id: &str) -> Result<(), Error> {
    match role_account(account_id) {
        Some(RoleAccount::Guest) => Err(Rejection::GuestForbidden.into()),
        Some(RoleAccount::Admin) => Err(Rejection::NotStudent.into()),
        None => Ok(()),
    }
}

/// Only approved students take part in the ledger.
pub(crate) fn ensure_active_student(account: &Account) -> Result<(), Error> {
    match account.role {
        Role::Guest => Err(Rejection::GuestForbidden.into()),
        Role::Admin => Err(Rejection::NotStudent.into()),
        Role::Student if !account.is_approved => Err(Rejection::NotApproved.into()),
        Role::Student => Ok(()),
    }
}

/// `current + amount` for balances and stock counts; overflow is bad input.
pub(crate) fn checked_credit(current: i64, amount: i64) -> Result<i64, Error> {
    current
        .checked_add(amount)
        .ok_or_else(|| Error::Validation(format!("adding {} to {} overflows", amount, current)))
}

/// Every service wired to one store.
pub struct WorkshopServices {
    pub context: Arc<LedgerContext>,
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub redemptions: Arc<RedemptionService>,
    pub missions: Arc<MissionService>,
    pub wishes: Arc<WishService>,
    pub encouragement: Arc<EncouragementService>,
}

impl WorkshopServices {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>, config: WorkshopConfig) -> Self {
        let generator = config.ai.as_ref().and_then(build_provider);
        let encouragement = EncouragementService::new(generator, config.ai_timeout);
        Self::with_encouragement(store, clock, config, encouragement)
    }

    pub fn with_encouragement(
        store: Arc<dyn LedgerStore>,
        clock: Arc<dyn Clock>,
        config: WorkshopConfig,
        encouragement: EncouragementService,
    ) -> Self {
        let context = Arc::new(LedgerContext::new(store, clock, config));
        Self {
            accounts: Arc::new(AccountService::new(context.clone())),
            catalog: Arc::new(CatalogService::new(context.clone())),
            redemptions: Arc::new(RedemptionService::new(context.clone())),
            missions: Arc::new(MissionService::new(context.clone())),
            wishes: Arc::new(WishService::new(context.clone())),
            encouragement: Arc::new(encouragement),
            context,
        }
    }

    /// Mirror sign-ins to a local session file.
    pub fn with_session(mut self, session: SessionStore) -> Self {
        self.accounts = Arc::new(AccountService::new(self.context.clone()).with_session(session));
        self
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.context.store
    }

    pub async fn seed_defaults(&self) -> Result<(), Error> {
        seed::seed_defaults(&self.context).await
    }
}
