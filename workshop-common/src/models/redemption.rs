// File: workshop-common/src/models/redemption.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl RedemptionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RedemptionStatus::Pending)
    }

    /// Only pending -> completed and pending -> cancelled exist.
    pub fn can_transition_to(&self, next: RedemptionStatus) -> bool {
        matches!(
            (self, next),
            (RedemptionStatus::Pending, RedemptionStatus::Completed)
                | (RedemptionStatus::Pending, RedemptionStatus::Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionStatus::Pending => "pending",
            RedemptionStatus::Completed => "completed",
            RedemptionStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A voucher entitling the bearer to collect a product in person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub id: String,
    pub account_id: String,
    pub product_id: String,
    pub product_name: String,
    /// Price at redemption time; later price edits never touch it.
    pub points_spent: i64,
    pub created_at: DateTime<Utc>,
    pub status: RedemptionStatus,
    pub code: String,
}

/// What happens to stock and points when a pending voucher is cancelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundPolicy {
    #[default]
    NoRefund,
    RestockAndRefund,
}

impl std::str::FromStr for RefundPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "no_refund" | "none" => Ok(RefundPolicy::NoRefund),
            "restock_and_refund" | "refund" => Ok(RefundPolicy::RestockAndRefund),
            other => Err(format!("unknown refund policy '{}'", other)),
        }
    }
}

/// Result of a successful redemption: the voucher plus the post-commit
/// balance and stock, so callers can update what they display right away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionReceipt {
    pub redemption: Redemption,
    pub balance: i64,
    pub stock: i64,
}
