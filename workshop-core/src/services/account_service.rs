// File: workshop-core/src/services/account_service.rs

use std::sync::Arc;

use tracing::{info, warn};

use workshop_common::models::account::{default_avatar, GRADES};
use workshop_common::models::rank::{standing, RankStanding};
use workshop_common::models::{Account, AccountName, Role, RoleAccount};
use workshop_common::Rejection;
use workshop_common::traits::{Document, LedgerStoreExt};

use crate::auth::{hash_password, verify_password, SessionStore};
use crate::services::{checked_credit, ensure_active_student, reject_role_account, role_account, LedgerContext};
use crate::utils::ids::new_id;
use crate::Error;

pub struct AccountService {
    ctx: Arc<LedgerContext>,
    session: Option<SessionStore>,
}

impl AccountService {
    pub fn new(ctx: Arc<LedgerContext>) -> Self {
        Self { ctx, session: None }
    }

    /// Also mirror the signed-in account to a local session file.
    pub fn with_session(mut self, session: SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    pub fn grades(&self) -> &'static [&'static str] {
        &GRADES
    }

    /// Creates an unapproved student with zero points. Names are unique.
    ///
    /// The name is reserved through its `AccountName` document, so concurrent
    /// registrations only collide when they pick the same name.
    pub async fn register(&self, name: &str, password: &str, grade: Option<&str>) -> Result<Account, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("name is required".into()));
        }
        if password.is_empty() {
            return Err(Error::Validation("password is required".into()));
        }
        let grade = grade.map(str::trim).filter(|g| !g.is_empty()).map(String::from);

        // Accounts stored before names were reserved have no AccountName.
        if self.ctx.store.list::<Account>().await?.iter().any(|a| a.name == name) {
            return Err(Rejection::DuplicateName(name.to_string()).into());
        }

        let now = self.ctx.now();
        let password_hash = hash_password(password);
        let id = new_id("user");

        let account = self
            .ctx
            .transact(&[AccountName::read_key(name)], |tx| {
                if tx.get::<AccountName>(name)?.is_some() {
                    return Err(Rejection::DuplicateName(name.to_string()).into());
                }
                let account = Account {
                    id: id.clone(),
                    name: name.to_string(),
                    role: Role::Student,
                    balance: 0,
                    total_earned: 0,
                    is_approved: false,
                    grade: grade.clone(),
                    avatar: default_avatar(name),
                    password_hash: Some(password_hash.clone()),
                    wish_cooldown_until: None,
                    created_at: now,
                };
                tx.put(&AccountName { id: name.to_string(), account_id: id.clone() })?;
                tx.put(&account)?;
                Ok(account)
            })
            .await?;

        info!("Registered account {} ({}), awaiting approval", account.id, account.name);
        Ok(account.redacted())
    }

    /// Marks a student approved. Approving twice is a no-op.
    pub async fn approve(&self, account_id: &str) -> Result<Account, Error> {
        let key = Account::read_key(account_id);
        let account = self
            .ctx
            .transact(&[key], |tx| {
                let mut account = tx.require::<Account>(account_id)?;
                if !account.is_student() {
                    return Err(Rejection::NotStudent.into());
                }
                if !account.is_approved {
                    account.is_approved = true;
                    tx.put(&account)?;
                }
                Ok(account)
            })
            .await?;

        info!("Approved account {} ({})", account.id, account.name);
        self.ctx.refresh_cached(&account);
        Ok(account.redacted())
    }

    /// Hard-removes an account and releases its name; used to turn down
    /// pending registrations.
    pub async fn delete_account(&self, account_id: &str) -> Result<(), Error> {
        let existing = self.ctx.store.fetch_required::<Account>(account_id).await?;
        let read_set = [Account::read_key(account_id), AccountName::read_key(&existing.name)];
        self.ctx
            .transact(&read_set, |tx| {
                let account = tx.require::<Account>(account_id)?;
                tx.delete::<Account>(account_id);
                let reserved = tx.get::<AccountName>(&account.name)?;
                if reserved.is_some_and(|r| r.account_id == account_id) {
                    tx.delete::<AccountName>(&account.name);
                }
                Ok(())
            })
            .await?;
        self.ctx.cache.invalidate(account_id);
        info!("Deleted account {}", account_id);
        Ok(())
    }

    /// Adds `amount` to both balance and lifetime total. `reason` is free text
    /// that only ends up in the log.
    pub async fn grant_points(&self, account_id: &str, amount: i64, reason: Option<&str>) -> Result<Account, Error> {
        if amount <= 0 {
            return Err(Error::Validation(format!("grant amount must be positive, got {}", amount)));
        }
        reject_role_account(account_id)?;

        let key = Account::read_key(account_id);
        let account = self
            .ctx
            .transact(&[key], |tx| {
                let mut account = tx.require::<Account>(account_id)?;
                ensure_active_student(&account)?;
                account.balance = checked_credit(account.balance, amount)?;
                account.total_earned = checked_credit(account.total_earned, amount)?;
                tx.put(&account)?;
                Ok(account)
            })
            .await?;

        info!(
            "Granted {} point(s) to {} (reason: {}); balance now {}",
            amount,
            account.id,
            reason.unwrap_or("-"),
            account.balance
        );
        self.ctx.refresh_cached(&account);
        Ok(account.redacted())
    }

    /// Student login by display name.
    pub async fn authenticate(&self, name: &str, password: &str) -> Result<Account, Error> {
        let name = name.trim();
        let accounts = self.ctx.store.list::<Account>().await?;
        let account = accounts
            .into_iter()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::NotFound(format!("account '{}'", name)))?;

        if !account.is_approved {
            warn!("Login refused for unapproved account {}", account.id);
            return Err(Rejection::NotApproved.into());
        }

        let valid = match account.password_hash.as_deref() {
            Some(stored) => verify_password(password, stored)?,
            None => false,
        };
        if !valid {
            return Err(Error::Auth("invalid credential".into()));
        }

        self.start_session(&account)
    }

    pub async fn login_admin(&self, password: &str) -> Result<Account, Error> {
        match self.ctx.config.admin_password.as_deref() {
            Some(expected) if expected == password => self.start_session(&RoleAccount::Admin.account()),
            Some(_) => Err(Error::Auth("invalid admin password".into())),
            None => Err(Error::Auth("admin login is not configured".into())),
        }
    }

    pub async fn login_guest(&self, code: &str) -> Result<Account, Error> {
        if code.trim().eq_ignore_ascii_case(&self.ctx.config.guest_code) {
            self.start_session(&RoleAccount::Guest.account())
        } else {
            Err(Error::Auth("invalid guest code".into()))
        }
    }

    pub fn logout(&self, account_id: &str) -> Result<(), Error> {
        self.ctx.cache.invalidate(account_id);
        if let Some(session) = &self.session {
            session.clear()?;
        }
        Ok(())
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Account, Error> {
        if let Some(role) = role_account(account_id) {
            return Ok(role.account());
        }
        Ok(self.ctx.store.fetch_required::<Account>(account_id).await?.redacted())
    }

    /// Stored accounts, oldest registration first.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, Error> {
        let mut accounts: Vec<Account> = self
            .ctx
            .store
            .list::<Account>()
            .await?
            .iter()
            .map(Account::redacted)
            .collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(accounts)
    }

    pub async fn list_pending_registrations(&self) -> Result<Vec<Account>, Error> {
        let accounts = self.list_accounts().await?;
        Ok(accounts.into_iter().filter(|a| a.is_student() && !a.is_approved).collect())
    }

    /// Re-reads the authoritative account and overwrites the cached and
    /// persisted session copies with it.
    pub async fn refresh_session(&self, account_id: &str) -> Result<Account, Error> {
        let account = self.get_account(account_id).await?;
        self.ctx.cache.insert(&account);
        if let Some(session) = &self.session {
            session.save(&account)?;
        }
        Ok(account)
    }

    pub fn cached(&self, account_id: &str) -> Option<Account> {
        self.ctx.cache.get(account_id)
    }

    pub async fn rank(&self, account_id: &str) -> Result<RankStanding, Error> {
        let account = self.get_account(account_id).await?;
        Ok(standing(account.total_earned))
    }

    fn start_session(&self, account: &Account) -> Result<Account, Error> {
        let account = account.redacted();
        self.ctx.cache.insert(&account);
        if let Some(session) = &self.session {
            session.save(&account)?;
        }
        info!("{} {} signed in", account.role, account.id);
        Ok(account)
    }
}
