// ABOUTME: User profile storage for Google-backed principals
// ABOUTME: Upserts the provider profile on each login and reads it back by id
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{AppError, AppResult};
use sqlx::{Row, SqlitePool};

/// Stored user profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Provider subject id
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address, when the provider shared it
    pub email: Option<String>,
    /// Avatar URL
    pub photo: Option<String>,
}

/// User table operations
pub struct UserManager {
    pool: SqlitePool,
}

impl UserManager {
    /// Create a manager over `pool`
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or refresh a user profile after a successful login
    ///
    /// # Errors
    ///
    /// Returns a database error if the upsert fails.
    pub async fn upsert_user(&self, user: &UserRecord) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO users (id, name, email, photo)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                photo = excluded.photo
            ",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.photo)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to upsert user: {e}")))?;

        Ok(())
    }

    /// Look up a user profile by provider id
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn get_user(&self, id: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query("SELECT id, name, email, photo FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load user: {e}")))?;

        Ok(row.map(|row| UserRecord {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            photo: row.get("photo"),
        }))
    }
}
