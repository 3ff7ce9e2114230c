// File: src/auth/session.rs

use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use workshop_common::models::Account;

use crate::Error;

/// Key under which the signed-in account snapshot is kept.
pub const SESSION_KEY: &str = "workshop_user";

/// Local copy of the signed-in account. Advisory only: it is shown to the
/// user between launches but never trusted for balance or stock decisions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/workshop/workshop_user.json`
    pub fn default_location() -> Result<Self, Error> {
        let base = dirs::data_dir()
            .ok_or_else(|| Error::Unavailable("no data directory on this platform".into()))?;
        Ok(Self::new(base.join("workshop").join(format!("{}.json", SESSION_KEY))))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Account>, Error> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Account>(&raw) {
            Ok(account) => Ok(Some(account)),
            Err(e) => {
                warn!("Discarding unreadable session file {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    pub fn save(&self, account: &Account) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&account.redacted())?;
        fs::write(&self.path, json)?;
        debug!("Session saved for account {}", account.id);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), Error> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
