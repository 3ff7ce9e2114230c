// src/config.rs

use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use chrono_tz::Tz;
use tracing::warn;

use workshop_ai::ProviderConfig;
use workshop_common::models::RefundPolicy;

use crate::repositories::TransactionPolicy;
use crate::Error;

pub const DEFAULT_GUEST_CODE: &str = "aaa";
pub const DEFAULT_TIMEZONE: &str = "Asia/Taipei";
pub const DEFAULT_WISH_COOLDOWN_DAYS: i64 = 30;
pub const DEFAULT_COOLDOWN_RESET_COST: i64 = 1000;

/// Runtime settings for the ledger services.
#[derive(Debug, Clone)]
pub struct WorkshopConfig {
    pub database_url: Option<String>,
    /// Unset means admin login always fails.
    pub admin_password: Option<String>,
    pub guest_code: String,
    pub timezone: Tz,
    pub wish_cooldown: Duration,
    pub cooldown_reset_cost: i64,
    pub transaction: TransactionPolicy,
    pub refund_policy: RefundPolicy,
    /// `None` when no text-generation key is configured.
    pub ai: Option<ProviderConfig>,
    pub ai_timeout: StdDuration,
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            admin_password: None,
            guest_code: DEFAULT_GUEST_CODE.to_string(),
            timezone: chrono_tz::Asia::Taipei,
            wish_cooldown: Duration::days(DEFAULT_WISH_COOLDOWN_DAYS),
            cooldown_reset_cost: DEFAULT_COOLDOWN_RESET_COST,
            transaction: TransactionPolicy::default(),
            refund_policy: RefundPolicy::default(),
            ai: None,
            ai_timeout: StdDuration::from_secs(10),
        }
    }
}

impl WorkshopConfig {
    /// Reads `WORKSHOP_*` variables, after loading a `.env` file if present.
    pub fn from_env() -> Result<Self, Error> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = Self::default();

        cfg.database_url = get("WORKSHOP_DATABASE_URL");
        cfg.admin_password = get("WORKSHOP_ADMIN_PASSWORD");
        if let Some(code) = get("WORKSHOP_GUEST_CODE") {
            cfg.guest_code = code;
        }
        if let Some(tz) = get("WORKSHOP_TIMEZONE") {
            cfg.timezone = parse_timezone(&tz)?;
        }
        if let Some(days) = get("WORKSHOP_WISH_COOLDOWN_DAYS") {
            let days: i64 = parse_number("WORKSHOP_WISH_COOLDOWN_DAYS", &days)?;
            cfg.wish_cooldown = Duration::days(days);
        }
        if let Some(cost) = get("WORKSHOP_COOLDOWN_RESET_COST") {
            cfg.cooldown_reset_cost = parse_number("WORKSHOP_COOLDOWN_RESET_COST", &cost)?;
        }
        if let Some(attempts) = get("WORKSHOP_TX_MAX_ATTEMPTS") {
            let max_attempts: u32 = parse_number("WORKSHOP_TX_MAX_ATTEMPTS", &attempts)?;
            cfg.transaction = TransactionPolicy { max_attempts: max_attempts.max(1) };
        }
        if let Some(policy) = get("WORKSHOP_REFUND_POLICY") {
            cfg.refund_policy = RefundPolicy::from_str(&policy).map_err(Error::Parse)?;
        }

        let api_key = get("WORKSHOP_AI_API_KEY")
            .or_else(|| get("GEMINI_API_KEY"))
            .or_else(|| get("API_KEY"));
        if let Some(key) = api_key {
            let mut ai = ProviderConfig::gemini(key);
            if let Some(provider) = get("WORKSHOP_AI_PROVIDER") {
                ai.provider_type = provider.to_ascii_lowercase();
            }
            if let Some(model) = get("WORKSHOP_AI_MODEL") {
                ai.default_model = model;
            }
            ai.api_base = get("WORKSHOP_AI_API_BASE");
            cfg.ai = Some(ai);
        } else {
            warn!("No text-generation key configured; encouragement uses the fixed fallback");
        }

        Ok(cfg)
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, Error> {
    name.parse::<Tz>()
        .map_err(|e| Error::Parse(format!("invalid timezone '{}': {}", name, e)))
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, Error> {
    raw.parse::<T>()
        .map_err(|_| Error::Parse(format!("{} must be a number, got '{}'", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = WorkshopConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.guest_code, "aaa");
        assert_eq!(cfg.timezone, chrono_tz::Asia::Taipei);
        assert_eq!(cfg.wish_cooldown, Duration::days(30));
        assert_eq!(cfg.cooldown_reset_cost, 1000);
        assert_eq!(cfg.transaction.max_attempts, 2);
        assert_eq!(cfg.refund_policy, RefundPolicy::NoRefund);
        assert!(cfg.admin_password.is_none());
        assert!(cfg.ai.is_none());
    }

    #[test]
    fn overrides_and_key_fallback() {
        let cfg = WorkshopConfig::from_lookup(lookup(&[
            ("WORKSHOP_TIMEZONE", "UTC"),
            ("WORKSHOP_REFUND_POLICY", "restock_and_refund"),
            ("WORKSHOP_TX_MAX_ATTEMPTS", "0"),
            ("GEMINI_API_KEY", "k-123"),
        ]))
        .unwrap();
        assert_eq!(cfg.timezone, chrono_tz::UTC);
        assert_eq!(cfg.refund_policy, RefundPolicy::RestockAndRefund);
        assert_eq!(cfg.transaction.max_attempts, 1);
        assert_eq!(cfg.ai.unwrap().api_key, "k-123");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(WorkshopConfig::from_lookup(lookup(&[("WORKSHOP_TIMEZONE", "Mars/Olympus")])).is_err());
        assert!(WorkshopConfig::from_lookup(lookup(&[("WORKSHOP_COOLDOWN_RESET_COST", "lots")])).is_err());
    }
}
