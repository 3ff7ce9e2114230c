// File: workshop-core/src/services/mission_service.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use workshop_common::models::{
    Account, ApprovedSubmission, CompletionRecord, Mission, MissionClaim, MissionDraft,
    MissionSubmission, PendingClaim, SubmissionStatus,
};
use workshop_common::traits::{Document, LedgerStoreExt};
use workshop_common::Rejection;

use crate::services::{checked_credit, ensure_active_student, reject_role_account, LedgerContext};
use crate::utils::ids::new_id;
use crate::Error;

fn validate_draft(draft: &MissionDraft) -> Result<(), Error> {
    if draft.title.trim().is_empty() {
        return Err(Error::Validation("mission title is required".into()));
    }
    if draft.points <= 0 {
        return Err(Error::Validation(format!("mission reward must be positive, got {}", draft.points)));
    }
    if draft.max_attempts == 0 {
        return Err(Error::Validation("max attempts must be at least 1".into()));
    }
    Ok(())
}

fn completions_since<'a>(
    records: &'a [CompletionRecord],
    account_id: &'a str,
    since: DateTime<Utc>,
) -> impl Iterator<Item = &'a CompletionRecord> + 'a {
    records
        .iter()
        .filter(move |r| r.account_id == account_id && r.completed_at >= since)
}

fn submission_transition(from: SubmissionStatus, to: SubmissionStatus) -> Error {
    Rejection::InvalidTransition { from: from.to_string(), to: to.to_string() }.into()
}

/// Mission definitions and the submit / approve / reject workflow.
pub struct MissionService {
    ctx: Arc<LedgerContext>,
}

impl MissionService {
    pub fn new(ctx: Arc<LedgerContext>) -> Self {
        Self { ctx }
    }

    pub async fn create_mission(&self, draft: MissionDraft) -> Result<Mission, Error> {
        validate_draft(&draft)?;
        let mission = Mission {
            id: new_id("m"),
            title: draft.title.trim().to_string(),
            description: draft.description,
            points: draft.points,
            tier: draft.tier,
            is_active: true,
            deadline: draft.deadline,
            max_attempts: draft.max_attempts,
        };
        self.ctx.store.save(&mission).await?;
        info!("Created mission {} ({}) worth {}", mission.id, mission.title, mission.points);
        Ok(mission)
    }

    /// Pending submissions keep the title and points they were made with.
    pub async fn update_mission(&self, mission_id: &str, draft: MissionDraft) -> Result<Mission, Error> {
        validate_draft(&draft)?;
        self.ctx
            .transact(&[Mission::read_key(mission_id)], |tx| {
                let mut mission = tx.require::<Mission>(mission_id)?;
                mission.title = draft.title.trim().to_string();
                mission.description = draft.description.clone();
                mission.points = draft.points;
                mission.tier = draft.tier;
                mission.deadline = draft.deadline;
                mission.max_attempts = draft.max_attempts;
                tx.put(&mission)?;
                Ok(mission)
            })
            .await
    }

    pub async fn toggle_mission(&self, mission_id: &str) -> Result<Mission, Error> {
        let mission = self
            .ctx
            .transact(&[Mission::read_key(mission_id)], |tx| {
                let mut mission = tx.require::<Mission>(mission_id)?;
                mission.is_active = !mission.is_active;
                tx.put(&mission)?;
                Ok(mission)
            })
            .await?;
        info!("Mission {} active={}", mission.id, mission.is_active);
        Ok(mission)
    }

    pub async fn delete_mission(&self, mission_id: &str) -> Result<(), Error> {
        if !self.ctx.store.remove::<Mission>(mission_id).await? {
            return Err(Error::NotFound(format!("mission '{}'", mission_id)));
        }
        Ok(())
    }

    pub async fn get_mission(&self, mission_id: &str) -> Result<Mission, Error> {
        self.ctx.store.fetch_required::<Mission>(mission_id).await
    }

    pub async fn list_missions(&self) -> Result<Vec<Mission>, Error> {
        self.ctx.store.list::<Mission>().await
    }

    /// Active and not past their deadline.
    pub async fn list_active_missions(&self) -> Result<Vec<Mission>, Error> {
        let now = self.ctx.now();
        let missions = self.list_missions().await?;
        Ok(missions.into_iter().filter(|m| m.is_active && !m.is_expired_at(now)).collect())
    }

    /// Files a pending claim for today.
    ///
    /// Refused when the mission is inactive or past its deadline, when the
    /// account already used up today's completions, or when a claim from
    /// today is still pending. Those counts live on the account's
    /// `MissionClaim` for this mission, which every submit, approve and reject
    /// rewrites, so the checks hold at commit time without pinning whole
    /// collections.
    pub async fn submit(&self, account_id: &str, mission_id: &str) -> Result<MissionSubmission, Error> {
        reject_role_account(account_id)?;

        let now = self.ctx.now();
        let today = self.ctx.start_of_today();
        let id = new_id("sub");
        let claim_id = MissionClaim::id_for(account_id, mission_id);
        let read_set = [
            Account::read_key(account_id),
            Mission::read_key(mission_id),
            MissionClaim::read_key(&claim_id),
        ];

        let result = self
            .ctx
            .transact(&read_set, |tx| {
                let account = tx.require::<Account>(account_id)?;
                ensure_active_student(&account)?;
                let mission = tx.require::<Mission>(mission_id)?;

                if !mission.is_active {
                    return Err(Rejection::MissionInactive.into());
                }
                if mission.is_expired_at(now) {
                    return Err(Rejection::MissionExpired.into());
                }

                let mut claim = tx
                    .get::<MissionClaim>(&claim_id)?
                    .unwrap_or_else(|| MissionClaim::new(account_id, mission_id, today));
                if claim.completed_on(today) >= mission.max_attempts {
                    return Err(Rejection::AlreadyCompletedToday.into());
                }
                if claim.pending_since(today) {
                    return Err(Rejection::DuplicateSubmission.into());
                }

                let submission = MissionSubmission {
                    id: id.clone(),
                    account_id: account.id.clone(),
                    account_name: account.name.clone(),
                    mission_id: mission.id.clone(),
                    mission_title: mission.title.clone(),
                    points: mission.points,
                    submitted_at: now,
                    status: SubmissionStatus::Pending,
                };
                claim.pending = Some(PendingClaim { submission_id: id.clone(), submitted_at: now });
                tx.put(&submission)?;
                tx.put(&claim)?;
                Ok(submission)
            })
            .await;

        match result {
            Ok(submission) => {
                info!("Account {} submitted mission {} ({})", account_id, mission_id, submission.id);
                Ok(submission)
            }
            Err(e) => {
                if let Some(r) = e.rejection() {
                    warn!("Submission of {} by {} refused: {}", mission_id, account_id, r);
                }
                Err(e)
            }
        }
    }

    /// Marks the submission approved, writes one completion record and
    /// credits the snapshotted points, all in one commit.
    pub async fn approve_submission(&self, submission_id: &str) -> Result<ApprovedSubmission, Error> {
        let existing = self.ctx.store.fetch_required::<MissionSubmission>(submission_id).await?;
        let now = self.ctx.now();
        let today = self.ctx.start_of_today();
        let record_id = new_id("h");
        let claim_id = MissionClaim::id_for(&existing.account_id, &existing.mission_id);
        let read_set = [
            MissionSubmission::read_key(submission_id),
            Account::read_key(&existing.account_id),
            MissionClaim::read_key(&claim_id),
        ];

        let (approved, account) = self
            .ctx
            .transact(&read_set, |tx| {
                let mut submission = tx.require::<MissionSubmission>(submission_id)?;
                if submission.status != SubmissionStatus::Pending {
                    return Err(submission_transition(submission.status, SubmissionStatus::Approved));
                }
                let mut account = tx.require::<Account>(&submission.account_id)?;
                ensure_active_student(&account)?;

                account.balance = checked_credit(account.balance, submission.points)?;
                account.total_earned = checked_credit(account.total_earned, submission.points)?;
                submission.status = SubmissionStatus::Approved;
                let record = CompletionRecord {
                    id: record_id.clone(),
                    account_id: submission.account_id.clone(),
                    mission_id: submission.mission_id.clone(),
                    completed_at: now,
                };
                let mut claim = tx
                    .get::<MissionClaim>(&claim_id)?
                    .unwrap_or_else(|| MissionClaim::new(&submission.account_id, &submission.mission_id, today));
                claim.settle(&submission.id);
                claim.record_completion(today);

                tx.put(&submission)?;
                tx.put(&record)?;
                tx.put(&account)?;
                tx.put(&claim)?;

                let approved = ApprovedSubmission {
                    submission,
                    record,
                    balance: account.balance,
                    total_earned: account.total_earned,
                };
                Ok((approved, account))
            })
            .await?;

        info!(
            "Approved submission {}; {} point(s) to {}",
            approved.submission.id, approved.submission.points, account.id
        );
        self.ctx.refresh_cached(&account);
        Ok(approved)
    }

    /// pending -> rejected. No points move.
    pub async fn reject_submission(&self, submission_id: &str) -> Result<MissionSubmission, Error> {
        let existing = self.ctx.store.fetch_required::<MissionSubmission>(submission_id).await?;
        let claim_id = MissionClaim::id_for(&existing.account_id, &existing.mission_id);
        let read_set = [MissionSubmission::read_key(submission_id), MissionClaim::read_key(&claim_id)];

        let submission = self
            .ctx
            .transact(&read_set, |tx| {
                let mut submission = tx.require::<MissionSubmission>(submission_id)?;
                if submission.status != SubmissionStatus::Pending {
                    return Err(submission_transition(submission.status, SubmissionStatus::Rejected));
                }
                submission.status = SubmissionStatus::Rejected;
                tx.put(&submission)?;
                if let Some(mut claim) = tx.get::<MissionClaim>(&claim_id)? {
                    claim.settle(&submission.id);
                    tx.put(&claim)?;
                }
                Ok(submission)
            })
            .await?;
        info!("Rejected submission {}", submission.id);
        Ok(submission)
    }

    pub async fn has_completed_today(&self, account_id: &str, mission_id: &str) -> Result<bool, Error> {
        let records = self.ctx.store.list::<CompletionRecord>().await?;
        let today = self.ctx.start_of_today();
        Ok(completions_since(&records, account_id, today).any(|r| r.mission_id == mission_id))
    }

    pub async fn today_completed_mission_ids(&self, account_id: &str) -> Result<BTreeSet<String>, Error> {
        let records = self.ctx.store.list::<CompletionRecord>().await?;
        let today = self.ctx.start_of_today();
        Ok(completions_since(&records, account_id, today)
            .map(|r| r.mission_id.clone())
            .collect())
    }

    /// Newest first.
    pub async fn list_submissions(&self) -> Result<Vec<MissionSubmission>, Error> {
        let mut all = self.ctx.store.list::<MissionSubmission>().await?;
        all.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(all)
    }

    pub async fn list_pending_submissions(&self) -> Result<Vec<MissionSubmission>, Error> {
        let all = self.list_submissions().await?;
        Ok(all.into_iter().filter(|s| s.status == SubmissionStatus::Pending).collect())
    }

    pub async fn list_submissions_for_account(&self, account_id: &str) -> Result<Vec<MissionSubmission>, Error> {
        let all = self.list_submissions().await?;
        Ok(all.into_iter().filter(|s| s.account_id == account_id).collect())
    }
}
