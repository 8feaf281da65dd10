//! User registration queries.

use super::{encode_ts, parse_ts, Store};
use chrono::Utc;
use stride_core::error::StrideError;
use stride_core::model::User;

impl Store {
    /// Register a chat if unseen, returning the user either way.
    ///
    /// Insert-first so two racing deliveries of the same registration
    /// collapse into one row instead of one of them erroring.
    pub async fn ensure_user(&self, chat_id: i64, user_id: i64) -> Result<User, StrideError> {
        let result = sqlx::query(
            "INSERT INTO users (chat_id, user_id, created_at) VALUES (?, ?, ?) \
             ON CONFLICT(chat_id) DO NOTHING",
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(encode_ts(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(|e| StrideError::Storage(format!("user insert failed: {e}")))?;

        if result.rows_affected() > 0 {
            tracing::info!("Registered chat {chat_id}");
        }

        let (id, chat_id, user_id, created_at): (i64, i64, i64, String) =
            sqlx::query_as("SELECT id, chat_id, user_id, created_at FROM users WHERE chat_id = ?")
                .bind(chat_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StrideError::Storage(format!("user lookup failed: {e}")))?;

        Ok(User {
            id,
            chat_id,
            user_id,
            created_at: parse_ts(&created_at)?,
        })
    }

    /// Every known chat id, for the notification sweeps.
    pub async fn all_chat_ids(&self) -> Result<Vec<i64>, StrideError> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT chat_id FROM users ORDER BY chat_id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StrideError::Storage(format!("chat id query failed: {e}")))?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
