//! Local cache: the bearer token and the last profile snapshot.
//!
//! Stored in a WAL-mode SQLite file. Reads here are only used for first paint
//! and for restoring a login across restarts; profile views always re-fetch.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::error::CacheError;
use crate::types::UserProfile;

/// Credentials restored from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAuth {
    pub token: String,
    pub username: String,
    pub created_at: i64,      // Unix timestamp seconds
}

/// Opens (or creates) the cache database at `path`, configures WAL mode, and
/// applies schema migrations.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL
/// configuration fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;

    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;",
        )?;
        db.busy_timeout(Duration::from_secs(5))?;
        crate::schema::migrate(db)?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;

    Ok(conn)
}

/// Returns the current Unix timestamp in seconds.
fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Replaces the stored token. There is only ever one signed-in user.
pub async fn save_auth(
    conn: &Connection,
    token: &str,
    username: &str,
) -> Result<(), tokio_rusqlite::Error> {
    let token = token.to_owned();
    let username = username.to_owned();

    conn.call(move |db| {
        db.execute(
            "INSERT INTO auth_session (id, token, username, created_at)
             VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET token = excluded.token,
                                           username = excluded.username,
                                           created_at = excluded.created_at",
            rusqlite::params![&token, &username, now_secs()],
        )?;
        Ok::<_, rusqlite::Error>(())
    })
    .await
}

/// Loads the stored token, if any.
pub async fn load_auth(conn: &Connection) -> Result<Option<StoredAuth>, tokio_rusqlite::Error> {
    conn.call(|db| {
        db.query_row(
            "SELECT token, username, created_at FROM auth_session WHERE id = 1",
            [],
            |r| {
                Ok(StoredAuth {
                    token: r.get(0)?,
                    username: r.get(1)?,
                    created_at: r.get(2)?,
                })
            },
        )
        .optional()
    })
    .await
}

/// Deletes the token and every cached profile (logout or expiry).
pub async fn clear_auth(conn: &Connection) -> Result<(), tokio_rusqlite::Error> {
    conn.call(|db| {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM auth_session", [])?;
        tx.execute("DELETE FROM profile_cache", [])?;
        tx.commit()?;
        Ok::<_, rusqlite::Error>(())
    })
    .await
}

/// Stores `profile` as the latest snapshot for its username.
pub async fn save_profile(conn: &Connection, profile: &UserProfile) -> Result<(), CacheError> {
    let payload = serde_json::to_string(profile)?;
    let username = profile.username.clone();

    conn.call(move |db| {
        db.execute(
            "INSERT INTO profile_cache (username, payload, fetched_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(username) DO UPDATE SET payload = excluded.payload,
                                                 fetched_at = excluded.fetched_at",
            rusqlite::params![&username, &payload, now_secs()],
        )?;
        Ok::<_, rusqlite::Error>(())
    })
    .await?;
    Ok(())
}

/// Loads the cached snapshot for `username`.
pub async fn load_profile(
    conn: &Connection,
    username: &str,
) -> Result<Option<UserProfile>, CacheError> {
    let username = username.to_owned();

    let payload: Option<String> = conn
        .call(move |db| {
            db.query_row(
                "SELECT payload FROM profile_cache WHERE username = ?1",
                rusqlite::params![&username],
                |r| r.get(0),
            )
            .optional()
        })
        .await?;

    match payload {
        Some(p) => Ok(Some(serde_json::from_str(&p)?)),
        None => Ok(None),
    }
}
