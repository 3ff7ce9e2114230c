// File: workshop-core/tests/account_tests.rs

mod test_utils;

use workshop_common::models::Role;
use workshop_common::Rejection;
use workshop_core::auth::SessionStore;
use workshop_core::services::WorkshopServices;
use workshop_core::Error;

use test_utils::{harness, slow_harness, test_config};

#[tokio::test]
async fn test_register_creates_unapproved_student() -> Result<(), Error> {
    let h = harness();
    let account = h.services.accounts.register("小明", "secret", Some("國二")).await?;

    assert_eq!(account.role, Role::Student);
    assert!(!account.is_approved);
    assert_eq!(account.balance, 0);
    assert_eq!(account.total_earned, 0);
    assert_eq!(account.grade.as_deref(), Some("國二"));
    assert!(account.password_hash.is_none(), "returned copy is redacted");

    let pending = h.services.accounts.list_pending_registrations().await?;
    assert_eq!(pending.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_register_rejects_duplicate_and_blank_names() -> Result<(), Error> {
    let h = harness();
    h.services.accounts.register("小明", "a", None).await?;

    let dup = h.services.accounts.register("小明", "b", None).await.unwrap_err();
    assert!(matches!(dup, Error::PreconditionFailed(Rejection::DuplicateName(_))));

    let blank = h.services.accounts.register("   ", "b", None).await.unwrap_err();
    assert!(matches!(blank, Error::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn test_unapproved_account_cannot_authenticate() -> Result<(), Error> {
    let h = harness();
    h.services.accounts.register("小華", "pw", None).await?;

    let err = h.services.accounts.authenticate("小華", "pw").await.unwrap_err();
    assert!(matches!(err, Error::PreconditionFailed(Rejection::NotApproved)));
    assert_eq!(err.rejection().map(|r| r.to_string()).as_deref(), Some("not approved"));
    assert!(h.services.accounts.cached(&h.services.accounts.list_accounts().await?[0].id).is_none());
    Ok(())
}

#[tokio::test]
async fn test_authenticate_checks_name_then_password() -> Result<(), Error> {
    let h = harness();
    let student = h.student("小華", 0).await?;

    let missing = h.services.accounts.authenticate("nobody", "pw").await.unwrap_err();
    assert!(matches!(missing, Error::NotFound(_)));

    let wrong = h.services.accounts.authenticate("小華", "wrong").await.unwrap_err();
    assert!(matches!(wrong, Error::Auth(_)));

    let ok = h.services.accounts.authenticate("小華", "pw").await?;
    assert_eq!(ok.id, student.id);
    assert!(h.services.accounts.cached(&student.id).is_some());
    Ok(())
}

#[tokio::test]
async fn test_approve_is_idempotent() -> Result<(), Error> {
    let h = harness();
    let account = h.services.accounts.register("阿志", "pw", None).await?;
    let first = h.services.accounts.approve(&account.id).await?;
    let second = h.services.accounts.approve(&account.id).await?;
    assert!(first.is_approved && second.is_approved);

    let missing = h.services.accounts.approve("user_missing").await.unwrap_err();
    assert!(matches!(missing, Error::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_grant_points_raises_balance_and_total() -> Result<(), Error> {
    let h = harness();
    let student = h.student("小美", 0).await?;

    let after = h.services.accounts.grant_points(&student.id, 250, Some("期中考進步")).await?;
    assert_eq!(after.balance, 250);
    assert_eq!(after.total_earned, 250);

    for bad in [0, -5] {
        let err = h.services.accounts.grant_points(&student.id, bad, None).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    let guest = h.services.accounts.grant_points("user_guest", 10, None).await.unwrap_err();
    assert!(matches!(guest, Error::PreconditionFailed(Rejection::GuestForbidden)));
    Ok(())
}

#[tokio::test]
async fn test_grant_refreshes_cached_session_copy() -> Result<(), Error> {
    let h = harness();
    let student = h.student("小美", 0).await?;
    h.services.accounts.authenticate("小美", "pw").await?;
    assert_eq!(h.services.accounts.cached(&student.id).unwrap().balance, 0);

    h.services.accounts.grant_points(&student.id, 40, None).await?;
    assert_eq!(h.services.accounts.cached(&student.id).unwrap().balance, 40);
    Ok(())
}

#[tokio::test]
async fn test_delete_account_removes_registration() -> Result<(), Error> {
    let h = harness();
    let account = h.services.accounts.register("待審", "pw", None).await?;
    h.services.accounts.delete_account(&account.id).await?;

    assert!(h.services.accounts.list_accounts().await?.is_empty());
    let again = h.services.accounts.delete_account(&account.id).await.unwrap_err();
    assert!(matches!(again, Error::NotFound(_)));

    // The name is free again.
    h.services.accounts.register("待審", "pw", None).await?;
    Ok(())
}

#[tokio::test]
async fn test_grant_overflow_is_refused() -> Result<(), Error> {
    let h = harness();
    let student = h.student("小美", 0).await?;
    h.services.accounts.grant_points(&student.id, i64::MAX, None).await?;

    let err = h.services.accounts.grant_points(&student.id, 1, None).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    let account = h.account(&student.id).await?;
    assert_eq!((account.balance, account.total_earned), (i64::MAX, i64::MAX));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations() -> Result<(), Error> {
    let h = slow_harness(std::time::Duration::from_millis(5));
    let existing = h.student("小明", 0).await?;

    let mut handles = Vec::new();
    for i in 0..8 {
        let services = h.services.clone();
        handles.push(tokio::spawn(async move {
            services.accounts.register(&format!("新生{i}"), "pw", None).await
        }));
    }
    for _ in 0..2 {
        let services = h.services.clone();
        handles.push(tokio::spawn(async move { services.accounts.register("同名", "pw", None).await }));
    }
    // A grant in flight does not disturb registrations.
    let services = h.services.clone();
    let grant = tokio::spawn(async move { services.accounts.grant_points(&existing.id, 10, None).await });

    let mut registered = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            Ok(_) => registered += 1,
            Err(Error::PreconditionFailed(Rejection::DuplicateName(_))) => duplicates += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    grant.await.expect("task panicked")?;

    assert_eq!((registered, duplicates), (9, 1));
    assert_eq!(h.services.accounts.list_accounts().await?.len(), 10);
    Ok(())
}

#[tokio::test]
async fn test_role_logins() -> Result<(), Error> {
    let h = harness();

    let admin = h.services.accounts.login_admin("mentor-pass").await?;
    assert_eq!(admin.role, Role::Admin);
    assert!(matches!(h.services.accounts.login_admin("nope").await, Err(Error::Auth(_))));

    let guest = h.services.accounts.login_guest(" AAA ").await?;
    assert_eq!(guest.role, Role::Guest);
    assert!(matches!(h.services.accounts.login_guest("bbb").await, Err(Error::Auth(_))));
    Ok(())
}

#[tokio::test]
async fn test_admin_login_fails_without_configured_password() -> Result<(), Error> {
    let h = test_utils::harness_with(workshop_core::WorkshopConfig::default());
    let err = h.services.accounts.login_admin("").await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
    Ok(())
}

#[tokio::test]
async fn test_rank_follows_lifetime_points() -> Result<(), Error> {
    let h = harness();
    let student = h.student("小強", 600).await?;
    let standing = h.services.accounts.rank(&student.id).await?;
    assert_eq!(standing.rank.name, "積極求知者");
    assert_eq!(standing.next.map(|r| r.threshold), Some(2000));
    assert_eq!(standing.progress, 6);
    Ok(())
}

#[tokio::test]
async fn test_session_file_round_trip() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let session = SessionStore::new(dir.path().join("workshop").join("workshop_user.json"));

    let h = harness();
    let services = WorkshopServices::new(h.store.clone(), h.clock.clone(), test_config()).with_session(session.clone());
    let account = services.accounts.register("小安", "pw", None).await?;
    services.accounts.approve(&account.id).await?;

    assert!(session.load()?.is_none());
    services.accounts.authenticate("小安", "pw").await?;
    let saved = session.load()?.expect("session written on login");
    assert_eq!(saved.id, account.id);
    assert!(saved.password_hash.is_none());

    services.accounts.grant_points(&account.id, 30, None).await?;
    let refreshed = services.accounts.refresh_session(&account.id).await?;
    assert_eq!(refreshed.balance, 30);
    assert_eq!(session.load()?.unwrap().balance, 30);

    services.accounts.logout(&account.id)?;
    assert!(session.load()?.is_none());
    Ok(())
}
