use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wish {
    pub id: String,
    pub account_id: String,
    pub account_name: String,
    pub account_avatar: String,
    pub item_name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Accounts that boosted this wish; each at most once.
    #[serde(default)]
    pub liked_by: BTreeSet<String>,
}

impl Wish {
    pub fn likes(&self) -> usize {
        self.liked_by.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeOutcome {
    Liked,
    AlreadyLiked,
}
