use crate::error::JournalError;
use common::jobs::{SubmissionStage, SubmissionStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// SQLite persistence for submission attempts, one row per attempt.
pub struct JournalStore {
    conn: Connection,
}

impl JournalStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, JournalError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, JournalError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, JournalError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS submission_attempts (
                id TEXT PRIMARY KEY,
                full_name TEXT NOT NULL,
                class_applied TEXT NOT NULL,
                stage TEXT NOT NULL,
                error TEXT,
                updated_at INTEGER NOT NULL
            )",
        )?;
        Ok(Self { conn })
    }

    pub fn upsert(&self, status: &SubmissionStatus) -> Result<(), JournalError> {
        let updated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        self.conn.execute(
            "INSERT INTO submission_attempts (id, full_name, class_applied, stage, error, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                stage = excluded.stage,
                error = excluded.error,
                updated_at = excluded.updated_at",
            params![
                &status.attempt_id,
                &status.full_name,
                &status.class_applied,
                status.stage.as_str(),
                &status.error,
                updated_at
            ],
        )?;
        Ok(())
    }

    pub fn find(&self, attempt_id: &str) -> Result<Option<SubmissionStatus>, JournalError> {
        let status = self
            .conn
            .query_row(
                "SELECT id, full_name, class_applied, stage, error FROM submission_attempts WHERE id = ?1",
                params![attempt_id],
                status_from_row,
            )
            .optional()?;
        Ok(status)
    }

    /// Attempts that stopped before completing, oldest first.
    pub fn unfinished(&self) -> Result<Vec<SubmissionStatus>, JournalError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, full_name, class_applied, stage, error FROM submission_attempts
             WHERE stage != ?1 ORDER BY updated_at",
        )?;
        let rows = stmt.query_map(params![SubmissionStage::Completed.as_str()], status_from_row)?;
        let statuses = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(statuses)
    }
}

fn status_from_row(row: &Row<'_>) -> rusqlite::Result<SubmissionStatus> {
    let stage: String = row.get(3)?;
    Ok(SubmissionStatus {
        attempt_id: row.get(0)?,
        full_name: row.get(1)?,
        class_applied: row.get(2)?,
        stage: SubmissionStage::parse(&stage).unwrap_or(SubmissionStage::Received),
        error: row.get(4)?,
    })
}
