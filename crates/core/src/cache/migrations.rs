//! Database schema migrations.
//!
//! A version table records which SQL batches from `migrations/` have run.

use super::Error;
use tokio_rusqlite::{Connection, params};

/// Migration list: (version, name, SQL), applied in ascending version order.
const MIGRATIONS: &[(i64, &str, &str)] = &[(1, "stores", include_str!("../../migrations/001_stores.sql"))];

/// Run any pending migrations.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the batch whose SQL failed.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 =
            conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for (version, name, sql) in MIGRATIONS.iter().filter(|(v, _, _)| *v > current) {
            conn.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("{version:03}_{name}: {e}")))?;
            conn.execute(
                "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![version, name, chrono::Utc::now().to_rfc3339()],
            )?;
            tracing::debug!(version, name, "applied migration");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
