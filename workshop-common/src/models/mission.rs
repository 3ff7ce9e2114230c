use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionTier {
    #[default]
    Normal,
    Challenge,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Reward in points.
    pub points: i64,
    #[serde(rename = "type")]
    pub tier: MissionTier,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    /// 1 in practice, meaning "once per calendar day".
    pub max_attempts: u32,
}

impl Mission {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.deadline.map(|d| now > d).unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub points: i64,
    #[serde(default, rename = "type")]
    pub tier: MissionTier,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Pending => write!(f, "pending"),
            SubmissionStatus::Approved => write!(f, "approved"),
            SubmissionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A student's claim that a mission is done. Title and points are copied at
/// submit time so later mission edits leave pending rewards alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionSubmission {
    pub id: String,
    pub account_id: String,
    pub account_name: String,
    pub mission_id: String,
    pub mission_title: String,
    pub points: i64,
    pub submitted_at: DateTime<Utc>,
    pub status: SubmissionStatus,
}

/// Running tally for one account on one mission. Submit, approve and reject
/// all rewrite it, so two of them racing on the same pair conflict while
/// other students never touch it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionClaim {
    pub id: String,
    pub account_id: String,
    pub mission_id: String,
    /// Start of the local day `completed` counts.
    pub day: DateTime<Utc>,
    pub completed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending: Option<PendingClaim>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingClaim {
    pub submission_id: String,
    pub submitted_at: DateTime<Utc>,
}

impl MissionClaim {
    pub fn id_for(account_id: &str, mission_id: &str) -> String {
        format!("{}:{}", account_id, mission_id)
    }

    pub fn new(account_id: &str, mission_id: &str, day: DateTime<Utc>) -> Self {
        Self {
            id: Self::id_for(account_id, mission_id),
            account_id: account_id.to_string(),
            mission_id: mission_id.to_string(),
            day,
            completed: 0,
            pending: None,
        }
    }

    /// Completions credited on the local day starting at `day`.
    pub fn completed_on(&self, day: DateTime<Utc>) -> u32 {
        if self.day == day { self.completed } else { 0 }
    }

    /// Whether a claim submitted on or after `day` still awaits review.
    pub fn pending_since(&self, day: DateTime<Utc>) -> bool {
        self.pending.as_ref().is_some_and(|p| p.submitted_at >= day)
    }

    pub fn record_completion(&mut self, day: DateTime<Utc>) {
        self.completed = self.completed_on(day) + 1;
        self.day = day;
    }

    /// Drops the pending marker if it belongs to `submission_id`.
    pub fn settle(&mut self, submission_id: &str) {
        if self.pending.as_ref().is_some_and(|p| p.submission_id == submission_id) {
            self.pending = None;
        }
    }
}

/// Durable proof that a mission was credited to an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub id: String,
    pub account_id: String,
    pub mission_id: String,
    pub completed_at: DateTime<Utc>,
}

/// A mission idea from the text generator, not yet saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSuggestion {
    pub title: String,
    pub description: String,
    pub points: i64,
}

/// Ledger effect of approving a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedSubmission {
    pub submission: MissionSubmission,
    pub record: CompletionRecord,
    pub balance: i64,
    pub total_earned: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn claim_counts_reset_on_a_new_day() {
        let day = Utc.with_ymd_and_hms(2025, 3, 1, 16, 0, 0).unwrap();
        let next = day + Duration::days(1);
        let mut claim = MissionClaim::new("user_a", "m_1", day);

        claim.record_completion(day);
        claim.record_completion(day);
        assert_eq!(claim.completed_on(day), 2);
        assert_eq!(claim.completed_on(next), 0);

        claim.record_completion(next);
        assert_eq!((claim.day, claim.completed), (next, 1));
    }

    #[test]
    fn settle_only_clears_its_own_submission() {
        let day = Utc.with_ymd_and_hms(2025, 3, 1, 16, 0, 0).unwrap();
        let mut claim = MissionClaim::new("user_a", "m_1", day);
        claim.pending = Some(PendingClaim { submission_id: "sub_2".into(), submitted_at: day + Duration::hours(3) });

        claim.settle("sub_1");
        assert!(claim.pending_since(day));
        assert!(!claim.pending_since(day + Duration::days(1)));

        claim.settle("sub_2");
        assert!(claim.pending.is_none());
    }
}
