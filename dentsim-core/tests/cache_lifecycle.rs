//! Cache lifecycle: open, persist a login, restore it on a second connection,
//! and tear it down.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::FakeBackend;
use dentsim_core::auth::AuthService;
use dentsim_core::backend::{Credentials, ProfileUpdate};
use dentsim_core::db;
use dentsim_core::error::ApiError;
use dentsim_core::types::UserProfile;

fn temp_db_path() -> String {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.keep().join("cache.db");
    path.to_string_lossy().to_string()
}

#[tokio::test]
async fn open_configures_wal_and_schema() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    let version: i64 = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT MAX(version) FROM schema_version",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(version, dentsim_core::schema::latest_version());

    let journal: String = conn
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row("PRAGMA journal_mode", [], |r| r.get(0))?)
        })
        .await
        .unwrap();
    assert_eq!(journal, "wal", "journal_mode should be wal");

    // Re-opening must not apply the migration twice.
    let conn2 = db::open_db(&path).await.unwrap();
    let rows: i64 = conn2
        .call(|db| {
            Ok::<_, rusqlite::Error>(db.query_row(
                "SELECT COUNT(*) FROM schema_version",
                [],
                |r| r.get(0),
            )?)
        })
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn auth_row_is_replaced_not_duplicated() {
    let conn = db::open_db(&temp_db_path()).await.unwrap();
    assert!(db::load_auth(&conn).await.unwrap().is_none());

    db::save_auth(&conn, "tok-a", "anca").await.unwrap();
    db::save_auth(&conn, "tok-b", "mihai").await.unwrap();

    let stored = db::load_auth(&conn).await.unwrap().unwrap();
    assert_eq!(stored.token, "tok-b");
    assert_eq!(stored.username, "mihai");
    assert!(stored.created_at > 0);

    db::clear_auth(&conn).await.unwrap();
    assert!(db::load_auth(&conn).await.unwrap().is_none());
}

#[tokio::test]
async fn profile_snapshot_survives_reopen() {
    let path = temp_db_path();
    let conn = db::open_db(&path).await.unwrap();

    let profile = UserProfile {
        username: "anca".into(),
        role: Some("Resident".into()),
        xp: 2450,
        streak: 4,
        accuracy: 81.5,
        cases_completed: 19,
        earned_badges: vec!["first-diagnosis".into()],
        ..UserProfile::default()
    };
    db::save_profile(&conn, &profile).await.unwrap();

    let conn2 = db::open_db(&path).await.unwrap();
    let loaded = db::load_profile(&conn2, "anca").await.unwrap();
    assert_eq!(loaded, Some(profile));
    assert!(db::load_profile(&conn2, "nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn corrupt_profile_payload_is_reported() {
    let conn = db::open_db(&temp_db_path()).await.unwrap();
    conn.call(|db| {
        db.execute(
            "INSERT INTO profile_cache (username, payload, fetched_at) VALUES ('anca', '{oops', 0)",
            [],
        )?;
        Ok::<_, rusqlite::Error>(())
    })
    .await
    .unwrap();

    let err = db::load_profile(&conn, "anca").await.unwrap_err();
    assert!(matches!(err, dentsim_core::error::CacheError::Corrupt(_)));
}

#[tokio::test]
async fn login_restore_teardown() {
    let path = temp_db_path();
    let backend = Arc::new(FakeBackend::default());
    let service = AuthService::new(backend.clone(), db::open_db(&path).await.unwrap());

    assert!(service.restore().await.is_none());

    let bad = Credentials { username: "anca".into(), password: "wrong".into() };
    let err = service.login(0, &bad).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
    assert!(service.restore().await.is_none(), "failed login must not persist anything");

    let good = Credentials { username: "anca".into(), password: "parola123".into() };
    let session = service.login(0, &good).await.unwrap();
    assert_eq!(session.token, "tok-1");
    assert_eq!(session.username, "anca");

    // A fresh service over a new connection sees the same login.
    let restarted = AuthService::new(backend, db::open_db(&path).await.unwrap());
    let restored = restarted.restore().await.unwrap();
    assert_eq!(restored.token, "tok-1");
    assert_eq!(restored.username, "anca");
    assert_eq!(
        restored.profile.and_then(|p| p.role).as_deref(),
        Some("Dental Student")
    );

    restarted.teardown(0).await;
    assert!(restarted.restore().await.is_none());
    assert!(service.restore().await.is_none());
}

#[tokio::test]
async fn refresh_profile_writes_through() {
    let path = temp_db_path();
    let backend = Arc::new(FakeBackend::default());
    *backend.profile.lock().unwrap() = Some(Ok(UserProfile {
        username: "anca".into(),
        xp: 1200,
        ..UserProfile::default()
    }));
    let service = AuthService::new(backend, db::open_db(&path).await.unwrap());
    let good = Credentials { username: "anca".into(), password: "parola123".into() };
    service.login(0, &good).await.unwrap();

    let fresh = service.refresh_profile(0, "tok-1").await.unwrap();
    assert_eq!(fresh.xp, 1200);

    let cached = db::load_profile(&db::open_db(&path).await.unwrap(), "anca")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached.xp, 1200);
}

#[tokio::test]
async fn replies_after_teardown_do_not_touch_the_cache() {
    let path = temp_db_path();
    let backend = Arc::new(FakeBackend::default());
    *backend.profile.lock().unwrap() = Some(Ok(UserProfile {
        username: "anca".into(),
        xp: 900,
        ..UserProfile::default()
    }));
    let service = AuthService::new(backend.clone(), db::open_db(&path).await.unwrap());
    let good = Credentials { username: "anca".into(), password: "parola123".into() };
    service.login(0, &good).await.unwrap();

    // Both requests are still waiting on the network when the user logs out.
    backend.profile_delay_ms.store(200, Ordering::SeqCst);
    let update = {
        let service = service.clone();
        tokio::spawn(async move {
            let change = ProfileUpdate { username: "anca2".into(), role: "Resident".into() };
            service.update_profile(0, "tok-1", None, &change).await
        })
    };
    let refresh = {
        let service = service.clone();
        tokio::spawn(async move { service.refresh_profile(0, "tok-1").await })
    };
    service.teardown(0).await;

    assert!(update.await.unwrap().is_ok());
    assert!(refresh.await.unwrap().is_ok());
    assert!(service.restore().await.is_none(), "logged-out token came back");
    let conn = db::open_db(&path).await.unwrap();
    assert!(db::load_profile(&conn, "anca").await.unwrap().is_none());
    assert!(db::load_profile(&conn, "anca2").await.unwrap().is_none());

    // The next sign-in writes normally.
    backend.profile_delay_ms.store(0, Ordering::SeqCst);
    service.login(1, &good).await.unwrap();
    assert_eq!(service.restore().await.unwrap().token, "tok-1");
}
