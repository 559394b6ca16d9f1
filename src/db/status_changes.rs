//! Append-only status audit trail.

use super::{Database, now_ms};
use crate::types::{TaskStatus, TaskStatusChange};
use anyhow::Result;
use rusqlite::{Connection, params};

/// Record one status transition for a task.
///
/// Called from every mutation path that persists a different status, inside
/// the same transaction as the task write, so a task row and its trail can
/// never disagree.
pub(crate) fn record_status_change(
    conn: &Connection,
    task_id: &str,
    old_status: TaskStatus,
    new_status: TaskStatus,
) -> Result<()> {
    conn.execute(
        "INSERT INTO task_status_changes (task_id, old_status, new_status, changed_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![task_id, old_status.as_str(), new_status.as_str(), now_ms()],
    )?;

    Ok(())
}

fn parse_status(value: String) -> rusqlite::Result<TaskStatus> {
    value.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl Database {
    /// Get the status transition history for a task, oldest first.
    pub fn status_history(&self, task_id: &str) -> Result<Vec<TaskStatusChange>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, task_id, old_status, new_status, changed_at
                 FROM task_status_changes
                 WHERE task_id = ?1
                 ORDER BY id ASC",
            )?;

            let changes = stmt
                .query_map(params![task_id], |row| {
                    Ok(TaskStatusChange {
                        id: row.get(0)?,
                        task_id: row.get(1)?,
                        old_status: parse_status(row.get(2)?)?,
                        new_status: parse_status(row.get(3)?)?,
                        changed_at: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(changes)
        })
    }
}
