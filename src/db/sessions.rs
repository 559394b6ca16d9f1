//! Login session storage.
//!
//! Sessions are keyed by the SHA-256 digest of the cookie token; see
//! [`crate::auth`] for token generation and hashing.

use super::{Database, now_ms};
use crate::types::{Session, User};
use anyhow::Result;
use rusqlite::params;

impl Database {
    /// Create a session for a user. `token_hash` is the digest of the cookie
    /// token, never the token itself.
    pub fn create_session(
        &self,
        user_id: &str,
        token_hash: &str,
        ttl_hours: i64,
    ) -> Result<Session> {
        let now = now_ms();
        let expires_at = now + ttl_hours * 60 * 60 * 1000;

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![token_hash, user_id, now, expires_at],
            )?;

            Ok(Session {
                token_hash: token_hash.to_string(),
                user_id: user_id.to_string(),
                created_at: now,
                expires_at,
            })
        })
    }

    /// Resolve a session token digest to its user, if the session exists and
    /// has not expired.
    pub fn resolve_session(&self, token_hash: &str) -> Result<Option<User>> {
        let now = now_ms();

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.password_hash, u.created_at
                 FROM sessions s
                 INNER JOIN users u ON u.id = s.user_id
                 WHERE s.token_hash = ?1 AND s.expires_at > ?2",
            )?;

            let result = stmt.query_row(params![token_hash, now], |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                    created_at: row.get(3)?,
                })
            });

            match result {
                Ok(user) => Ok(Some(user)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Delete a session (logout). Deleting an unknown token is not an error.
    pub fn delete_session(&self, token_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM sessions WHERE token_hash = ?1",
                params![token_hash],
            )?;
            Ok(())
        })
    }

    /// Remove expired sessions. Returns the number of rows deleted.
    pub fn purge_expired_sessions(&self) -> Result<usize> {
        let now = now_ms();

        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM sessions WHERE expires_at <= ?1",
                params![now],
            )?;
            Ok(deleted)
        })
    }
}
