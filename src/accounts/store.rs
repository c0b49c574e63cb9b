use anyhow::Result;
use libsql::Connection;
use serde::{Deserialize, Serialize};

use super::session::{generate_token, hash_token};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

pub struct Accounts<'a> {
    conn: &'a Connection,
}

impl<'a> Accounts<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let mut rows = self
            .conn
            .query("SELECT 1 FROM users WHERE email = ?", libsql::params![email])
            .await?;
        Ok(rows.next().await?.is_some())
    }

    pub async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let query = r#"
            INSERT INTO users (name, email, password_hash)
            VALUES (?, ?, ?)
            RETURNING id, name, email, created_at
        "#;

        let mut rows = self
            .conn
            .query(query, libsql::params![name, email, password_hash])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Self::row_to_user(&row)?)
        } else {
            anyhow::bail!("Failed to create user")
        }
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, email, created_at FROM users WHERE id = ?",
                libsql::params![id],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_user(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Returns the user id and stored hash for a login attempt.
    pub async fn credentials_for(&self, email: &str) -> Result<Option<(i64, String)>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, password_hash FROM users WHERE email = ?",
                libsql::params![email],
            )
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some((row.get(0)?, row.get(1)?)))
        } else {
            Ok(None)
        }
    }

    /// Opens a session for `user_id` and returns the raw token for the cookie.
    pub async fn create_session(&self, user_id: i64, ttl_hours: i64) -> Result<String> {
        let token = generate_token();
        let query = r#"
            INSERT INTO sessions (token_hash, user_id, expires_at)
            VALUES (?, ?, CAST(strftime('%s', 'now') AS INTEGER) + ?)
        "#;

        self.conn
            .execute(query, libsql::params![hash_token(&token), user_id, ttl_hours * 3600])
            .await?;

        Ok(token)
    }

    pub async fn user_for_session(&self, token: &str) -> Result<Option<User>> {
        let query = r#"
            SELECT users.id, users.name, users.email, users.created_at
            FROM sessions
            JOIN users ON users.id = sessions.user_id
            WHERE sessions.token_hash = ?
              AND sessions.expires_at > CAST(strftime('%s', 'now') AS INTEGER)
        "#;

        let mut rows = self.conn.query(query, libsql::params![hash_token(token)]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_user(&row)?))
        } else {
            Ok(None)
        }
    }

    pub async fn delete_session(&self, token: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM sessions WHERE token_hash = ?",
                libsql::params![hash_token(token)],
            )
            .await?;
        Ok(deleted > 0)
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64> {
        let purged = self
            .conn
            .execute(
                "DELETE FROM sessions WHERE expires_at <= CAST(strftime('%s', 'now') AS INTEGER)",
                (),
            )
            .await?;
        Ok(purged)
    }

    fn row_to_user(row: &libsql::Row) -> Result<User> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}
