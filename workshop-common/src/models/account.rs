use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Admin,
    Guest,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "STUDENT"),
            Role::Admin => write!(f, "ADMIN"),
            Role::Guest => write!(f, "GUEST"),
        }
    }
}

pub const ADMIN_ACCOUNT_ID: &str = "user_admin";
pub const GUEST_ACCOUNT_ID: &str = "user_guest";

/// Grade labels offered at registration.
pub const GRADES: [&str; 8] = ["小五", "小六", "國一", "國二", "國三", "高一", "高二", "高三"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub role: Role,
    /// Spendable points.
    pub balance: i64,
    /// Lifetime earned points; never decreases. Rank is computed from this.
    pub total_earned: i64,
    pub is_approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Set by every new wish; no further wish until this instant has passed.
    /// A paid reset clears it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wish_cooldown_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    pub fn is_guest(&self) -> bool {
        self.role == Role::Guest
    }

    /// Copy safe to hand to clients and to cache locally.
    pub fn redacted(&self) -> Account {
        Account { password_hash: None, ..self.clone() }
    }

    /// Same as `redacted`, for a stored JSON body.
    pub fn redact_body(body: &mut Value) {
        if let Some(fields) = body.as_object_mut() {
            fields.remove("passwordHash");
        }
    }

    /// End of the wish cooldown if one is running at `now`.
    pub fn wish_cooldown_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.wish_cooldown_until.filter(|until| *until > now)
    }
}

/// Reserves a display name. The document id is the name itself, so two
/// registrations of one name collide on the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountName {
    pub id: String,
    pub account_id: String,
}

pub fn default_avatar(seed: &str) -> String {
    format!(
        "https://api.dicebear.com/7.x/avataaars/svg?seed={}&mouth=smile&eyebrows=defaultNatural&eyes=default",
        seed
    )
}

/// The two shared role logins. They are never persisted as per-user records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAccount {
    Admin,
    Guest,
}

impl RoleAccount {
    pub fn account(&self) -> Account {
        let (id, name, role, seed) = match self {
            RoleAccount::Admin => (ADMIN_ACCOUNT_ID, "導師管理員", Role::Admin, "Admin"),
            RoleAccount::Guest => (GUEST_ACCOUNT_ID, "訪客", Role::Guest, "Guest"),
        };
        Account {
            id: id.to_string(),
            name: name.to_string(),
            role,
            balance: 0,
            total_earned: 0,
            is_approved: true,
            grade: None,
            avatar: format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", seed),
            password_hash: None,
            wish_cooldown_until: None,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}
