pub mod queries;

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::Connection;

use crate::models::{BlockingInterval, ModificationChanges, Reservation};
use crate::services::directory::ReservationDirectory;

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    run_migrations(&conn)?;

    Ok(conn)
}

fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    let dir = Path::new("migrations");
    if !dir.exists() {
        tracing::warn!("migrations directory not found, skipping");
        return Ok(());
    }

    let mut files: Vec<_> = fs::read_dir(dir)
        .context("failed to read migrations directory")?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "sql"))
        .collect();
    files.sort();

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [&name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;
        if applied {
            continue;
        }

        let sql = fs::read_to_string(&path)
            .with_context(|| format!("failed to read migration file: {name}"))?;
        conn.execute_batch(&sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;
        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [&name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}

/// `ReservationDirectory` over the local SQLite store.
pub struct SqliteDirectory {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDirectory {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ReservationDirectory for SqliteDirectory {
    async fn list_user_reservations(&self, customer_id: &str) -> anyhow::Result<Vec<Reservation>> {
        let conn = self.conn.lock().unwrap();
        queries::list_for_customer(&conn, customer_id)
    }

    async fn list_blocking_intervals(
        &self,
        date: NaiveDate,
    ) -> anyhow::Result<Vec<BlockingInterval>> {
        let conn = self.conn.lock().unwrap();
        let reservations = queries::list_confirmed_on_date(&conn, date)?;
        Ok(reservations
            .iter()
            .flat_map(|r| r.blocking_intervals())
            .collect())
    }

    async fn next_reservation_id(&self, date: NaiveDate) -> anyhow::Result<String> {
        let conn = self.conn.lock().unwrap();
        queries::next_reservation_id(&conn, date)
    }

    async fn persist_reservation(&self, reservation: &Reservation) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        queries::create_reservation(&conn, reservation)
    }

    async fn persist_modification(
        &self,
        reservation_id: &str,
        changes: &ModificationChanges,
    ) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        anyhow::ensure!(
            queries::apply_modification(&conn, reservation_id, changes)?,
            "reservation {reservation_id} not found"
        );
        Ok(())
    }

    async fn persist_cancellation(&self, reservation_id: &str) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        anyhow::ensure!(
            queries::cancel_reservation(&conn, reservation_id)?,
            "reservation {reservation_id} not found"
        );
        Ok(())
    }
}
