//! Cache schema and its forward-only migrations.
//!
//! The cache is a convenience for first paint and restart. The backend owns
//! every record, so a migration that cannot run is free to drop and rebuild.

use rusqlite::{Connection, TransactionBehavior};

/// Ordered `(version, ddl)` steps. Each runs once, inside its own transaction.
const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    "CREATE TABLE IF NOT EXISTS auth_session (
         id         INTEGER PRIMARY KEY CHECK(id = 1),
         token      TEXT    NOT NULL,
         username   TEXT    NOT NULL,
         created_at INTEGER NOT NULL
     ) STRICT;

     CREATE TABLE IF NOT EXISTS profile_cache (
         username   TEXT    PRIMARY KEY,
         payload    TEXT    NOT NULL,
         fetched_at INTEGER NOT NULL
     ) STRICT;",
)];

/// Highest version [`migrate`] brings a database to.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|(v, _)| *v).unwrap_or(0)
}

fn current_version(db: &Connection) -> rusqlite::Result<i64> {
    db.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL) STRICT;")?;
    db.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )
}

/// Applies every pending migration. Safe to call on each open.
pub fn migrate(db: &mut Connection) -> rusqlite::Result<()> {
    let mut version = current_version(db)?;
    let start = version;
    for (step, ddl) in MIGRATIONS.iter().filter(|(v, _)| *v > start) {
        let tx = db.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute_batch(ddl)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [step])?;
        tx.commit()?;
        version = *step;
    }
    tracing::debug!(version, "cache schema ready");
    Ok(())
}
