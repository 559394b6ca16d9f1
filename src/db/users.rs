//! User account storage.

use super::{Database, now_ms};
use crate::error::AppError;
use crate::types::User;
use anyhow::Result;
use rusqlite::{Row, params};
use uuid::Uuid;

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        created_at: row.get("created_at")?,
    })
}

impl Database {
    /// Create a new user. Usernames are stored lower-cased so uniqueness is
    /// case-insensitive.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let id = Uuid::now_v7().to_string();
        let now = now_ms();
        let username = username.to_lowercase();

        self.with_conn(|conn| {
            let taken: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )?;
            if taken > 0 {
                return Err(AppError::username_taken(&username).into());
            }

            conn.execute(
                "INSERT INTO users (id, username, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, username, password_hash, now],
            )?;

            Ok(User {
                id: id.clone(),
                username: username.clone(),
                password_hash: password_hash.to_string(),
                created_at: now,
            })
        })
    }

    /// Look up a user by username (case-insensitive).
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_lowercase();

        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM users WHERE username = ?1")?;

            let result = stmt.query_row(params![username], parse_user_row);

            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Get a user by ID.
    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?1")?;

            let result = stmt.query_row(params![user_id], parse_user_row);

            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }
}
