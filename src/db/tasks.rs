//! Task CRUD, priority renumbering, and list queries.

use super::status_changes::record_status_change;
use super::{Database, now_ms};
use crate::error::AppError;
use crate::types::{Task, TaskStatus};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

/// Validated field values for creating or updating a task.
///
/// Produced by the forms layer; the title is already upper-cased and the
/// priority already checked positive by the time it gets here.
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub priority: i64,
    pub status: TaskStatus,
}

/// Which slice of a user's tasks a list query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    /// Not deleted, not completed.
    Active,
    /// Completed, not deleted.
    Completed,
}

/// Query parameters for task lists.
#[derive(Debug, Clone, Default)]
pub struct TaskListQuery {
    /// Case-insensitive substring match on title.
    pub search: Option<String>,
    pub page: i64,
    pub limit: i64,
}

/// Result of a task list query with pagination info.
#[derive(Debug, Clone)]
pub struct TaskListResult {
    pub tasks: Vec<Task>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

/// Per-user counts for the combined view.
#[derive(Debug, Clone, Copy)]
pub struct TaskCounts {
    /// All non-deleted tasks.
    pub all: i64,
    /// Completed, non-deleted tasks.
    pub completed: i64,
}

pub(crate) fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let status = status.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Task {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        completed: row.get("completed")?,
        deleted: row.get("deleted")?,
        priority: row.get("priority")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Escape LIKE wildcards in a user-supplied search term.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Internal helper to get a user's non-deleted task using an existing
/// connection (usable inside a transaction).
fn get_task_scoped(conn: &Connection, user_id: &str, task_id: &str) -> Result<Option<Task>> {
    let mut stmt =
        conn.prepare("SELECT * FROM tasks WHERE id = ?1 AND user_id = ?2 AND deleted = 0")?;

    let result = stmt.query_row(params![task_id, user_id], parse_task_row);

    match result {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Shift active tasks to keep priorities distinct.
///
/// If another active task of this user already holds `priority`, every
/// active task at `priority` or above moves up by one. No collision, no
/// shift. `exclude_task` keeps an update from colliding with itself.
///
/// Returns whether a shift happened.
fn shift_colliding_priorities(
    conn: &Connection,
    user_id: &str,
    priority: i64,
    exclude_task: Option<&str>,
) -> Result<bool> {
    let exclude = exclude_task.unwrap_or("");

    let collisions: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tasks
         WHERE user_id = ?1 AND deleted = 0 AND completed = 0
           AND priority = ?2 AND id <> ?3",
        params![user_id, priority, exclude],
        |row| row.get(0),
    )?;

    if collisions == 0 {
        return Ok(false);
    }

    conn.execute(
        "UPDATE tasks SET priority = priority + 1
         WHERE user_id = ?1 AND deleted = 0 AND completed = 0
           AND priority >= ?2 AND id <> ?3",
        params![user_id, priority, exclude],
    )?;

    Ok(true)
}

impl Database {
    /// Create a new task, renumbering siblings on a priority collision.
    ///
    /// The collision scan and the insert run in one transaction so two
    /// concurrent submissions cannot interleave into duplicate priorities.
    pub fn create_task(&self, user_id: &str, input: &TaskInput) -> Result<Task> {
        let task_id = Uuid::now_v7().to_string();
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            shift_colliding_priorities(&tx, user_id, input.priority, None)?;

            tx.execute(
                "INSERT INTO tasks (
                    id, user_id, title, description, completed, deleted,
                    priority, status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8, ?8)",
                params![
                    &task_id,
                    user_id,
                    &input.title,
                    &input.description,
                    input.completed,
                    input.priority,
                    input.status.as_str(),
                    now,
                ],
            )?;

            tx.commit()?;

            Ok(Task {
                id: task_id,
                user_id: user_id.to_string(),
                title: input.title.clone(),
                description: input.description.clone(),
                completed: input.completed,
                deleted: false,
                priority: input.priority,
                status: input.status,
                created_at: now,
                updated_at: now,
            })
        })
    }

    /// Update a task the user owns, renumbering on collision and appending
    /// a status-change row when the persisted status differs.
    ///
    /// `created_at` is never touched; only `updated_at` moves.
    pub fn update_task(&self, user_id: &str, task_id: &str, input: &TaskInput) -> Result<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing = get_task_scoped(&tx, user_id, task_id)?
                .ok_or_else(|| AppError::task_not_found(task_id))?;

            shift_colliding_priorities(&tx, user_id, input.priority, Some(task_id))?;

            tx.execute(
                "UPDATE tasks
                 SET title = ?1, description = ?2, completed = ?3,
                     priority = ?4, status = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    &input.title,
                    &input.description,
                    input.completed,
                    input.priority,
                    input.status.as_str(),
                    now,
                    task_id,
                ],
            )?;

            if existing.status != input.status {
                record_status_change(&tx, task_id, existing.status, input.status)?;
            }

            tx.commit()?;

            Ok(Task {
                title: input.title.clone(),
                description: input.description.clone(),
                completed: input.completed,
                priority: input.priority,
                status: input.status,
                updated_at: now,
                ..existing
            })
        })
    }

    /// Mark a task completed, moving its status to COMPLETED and recording
    /// the transition when the status actually changed.
    pub fn complete_task(&self, user_id: &str, task_id: &str) -> Result<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing = get_task_scoped(&tx, user_id, task_id)?
                .ok_or_else(|| AppError::task_not_found(task_id))?;

            tx.execute(
                "UPDATE tasks SET completed = 1, status = ?1, updated_at = ?2 WHERE id = ?3",
                params![TaskStatus::Completed.as_str(), now, task_id],
            )?;

            if existing.status != TaskStatus::Completed {
                record_status_change(&tx, task_id, existing.status, TaskStatus::Completed)?;
            }

            tx.commit()?;

            Ok(Task {
                completed: true,
                status: TaskStatus::Completed,
                updated_at: now,
                ..existing
            })
        })
    }

    /// Soft-delete a task. The row stays in the table as a tombstone and
    /// keeps its status, so no status-change row is written.
    pub fn delete_task(&self, user_id: &str, task_id: &str) -> Result<()> {
        let now = now_ms();

        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE tasks SET deleted = 1, updated_at = ?1
                 WHERE id = ?2 AND user_id = ?3 AND deleted = 0",
                params![now, task_id, user_id],
            )?;

            if affected == 0 {
                return Err(AppError::task_not_found(task_id).into());
            }

            Ok(())
        })
    }

    /// Get a task the user owns. Soft-deleted tasks are not visible here.
    pub fn get_task(&self, user_id: &str, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_scoped(conn, user_id, task_id))
    }

    /// Get a task by ID regardless of owner or tombstone state.
    pub fn get_task_any(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

            let result = stmt.query_row(params![task_id], parse_task_row);

            match result {
                Ok(task) => Ok(Some(task)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// List a user's tasks with optional title search and pagination.
    ///
    /// Ordered by priority ascending (ties broken by creation time). Search
    /// is a case-insensitive substring match with LIKE wildcards escaped.
    pub fn list_tasks(
        &self,
        user_id: &str,
        filter: TaskFilter,
        query: &TaskListQuery,
    ) -> Result<TaskListResult> {
        let page = query.page.max(1);
        let limit = query.limit.max(1);

        let completed_flag = match filter {
            TaskFilter::Active => 0i64,
            TaskFilter::Completed => 1i64,
        };

        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        self.with_conn(|conn| {
            let (total, tasks) = match &search {
                Some(pattern) => {
                    let total: i64 = conn.query_row(
                        "SELECT COUNT(*) FROM tasks
                         WHERE user_id = ?1 AND deleted = 0 AND completed = ?2
                           AND title LIKE ?3 ESCAPE '\\'",
                        params![user_id, completed_flag, pattern],
                        |row| row.get(0),
                    )?;

                    let mut stmt = conn.prepare(
                        "SELECT * FROM tasks
                         WHERE user_id = ?1 AND deleted = 0 AND completed = ?2
                           AND title LIKE ?3 ESCAPE '\\'
                         ORDER BY priority ASC, created_at ASC
                         LIMIT ?4 OFFSET ?5",
                    )?;
                    let tasks = stmt
                        .query_map(
                            params![user_id, completed_flag, pattern, limit, (page - 1) * limit],
                            parse_task_row,
                        )?
                        .collect::<Result<Vec<_>, _>>()?;

                    (total, tasks)
                }
                None => {
                    let total: i64 = conn.query_row(
                        "SELECT COUNT(*) FROM tasks
                         WHERE user_id = ?1 AND deleted = 0 AND completed = ?2",
                        params![user_id, completed_flag],
                        |row| row.get(0),
                    )?;

                    let mut stmt = conn.prepare(
                        "SELECT * FROM tasks
                         WHERE user_id = ?1 AND deleted = 0 AND completed = ?2
                         ORDER BY priority ASC, created_at ASC
                         LIMIT ?3 OFFSET ?4",
                    )?;
                    let tasks = stmt
                        .query_map(
                            params![user_id, completed_flag, limit, (page - 1) * limit],
                            parse_task_row,
                        )?
                        .collect::<Result<Vec<_>, _>>()?;

                    (total, tasks)
                }
            };

            let total_pages = if total == 0 { 1 } else { (total + limit - 1) / limit };

            Ok(TaskListResult {
                tasks,
                total,
                page,
                limit,
                total_pages,
            })
        })
    }

    /// List all of a user's tasks for one filter, unpaginated. Used by the
    /// combined view.
    pub fn list_tasks_unpaged(&self, user_id: &str, filter: TaskFilter) -> Result<Vec<Task>> {
        let completed_flag = match filter {
            TaskFilter::Active => 0i64,
            TaskFilter::Completed => 1i64,
        };

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM tasks
                 WHERE user_id = ?1 AND deleted = 0 AND completed = ?2
                 ORDER BY priority ASC, created_at ASC",
            )?;

            let tasks = stmt
                .query_map(params![user_id, completed_flag], parse_task_row)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(tasks)
        })
    }

    /// Counts for the combined view: all non-deleted tasks and the completed
    /// subset.
    pub fn task_counts(&self, user_id: &str) -> Result<TaskCounts> {
        self.with_conn(|conn| {
            let all: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tasks WHERE user_id = ?1 AND deleted = 0",
                params![user_id],
                |row| row.get(0),
            )?;

            let completed: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tasks
                 WHERE user_id = ?1 AND deleted = 0 AND completed = 1",
                params![user_id],
                |row| row.get(0),
            )?;

            Ok(TaskCounts { all, completed })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_escaping_covers_wildcards() {
        assert_eq!(escape_like("50%_done"), "50\\%\\_done");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
