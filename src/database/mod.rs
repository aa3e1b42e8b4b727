// ABOUTME: SQLite persistence layer for users and chat history
// ABOUTME: Owns the connection pool and runs schema migration at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Database
//!
//! Two tables. `users` mirrors the Google profile of durable principals;
//! `chats` stores their question/answer exchanges. Guests never touch
//! either table, their history lives in the browser.

use crate::errors::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub mod history;
pub mod users;

pub use history::HistoryManager;
pub use users::UserManager;

/// Shared SQLite handle
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if necessary) the database at `database_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the pool cannot connect.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid DATABASE_URL: {e}")))?
            .create_if_missing(true);

        // An in-memory database exists per connection, so the pool must
        // hold exactly one and never recycle it
        let in_memory = database_url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        Ok(Self { pool })
    }

    /// Create tables if they do not exist
    ///
    /// # Errors
    ///
    /// Returns an error if either DDL statement fails.
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT,
                photo TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create users table: {e}")))?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create chats table: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chats_user ON chats (user_id, id)")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create chats index: {e}")))?;

        Ok(())
    }

    /// Borrow the underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// History manager bound to this database
    #[must_use]
    pub fn history(&self) -> HistoryManager {
        HistoryManager::new(self.pool.clone())
    }

    /// User manager bound to this database
    #[must_use]
    pub fn users(&self) -> UserManager {
        UserManager::new(self.pool.clone())
    }
}

#[cfg(test)]
pub(crate) async fn test_database() -> Database {
    let db = Database::connect("sqlite::memory:")
        .await
        .unwrap_or_else(|e| panic!("in-memory database: {e}"));
    db.migrate().await.unwrap_or_else(|e| panic!("migrate: {e}"));
    db
}
