// ABOUTME: Server-side chat history for durable principals
// ABOUTME: Records exchanges and serves them back newest-first
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::{AppError, AppResult};
use crate::models::HistoryEntry;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

/// Chat table operations, always scoped to one user
pub struct HistoryManager {
    pool: SqlitePool,
}

impl HistoryManager {
    /// Create a manager over `pool`
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist one question/answer exchange for `user_id`
    ///
    /// The answer is stored raw; presentation markup is applied at read
    /// time by whoever renders it.
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails.
    pub async fn record_exchange(
        &self,
        user_id: &str,
        question: &str,
        answer: &str,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO chats (user_id, question, answer, timestamp) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(user_id)
        .bind(question)
        .bind(answer)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record exchange: {e}")))?;

        Ok(())
    }

    /// All exchanges for `user_id`, newest first
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails or a stored timestamp
    /// does not parse.
    pub async fn list_history(&self, user_id: &str) -> AppResult<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            "SELECT question, answer, timestamp FROM chats WHERE user_id = ?1 ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load history: {e}")))?;

        rows.into_iter()
            .map(|row| {
                let raw: String = row.get("timestamp");
                let timestamp = DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| AppError::database(format!("Corrupt timestamp {raw:?}: {e}")))?
                    .with_timezone(&Utc);
                Ok(HistoryEntry {
                    question: row.get("question"),
                    answer: row.get("answer"),
                    timestamp,
                })
            })
            .collect()
    }

    /// Delete all exchanges for `user_id`, returning the number removed
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails.
    pub async fn clear_history(&self, user_id: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM chats WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to clear history: {e}")))?;

        Ok(result.rows_affected())
    }
}
