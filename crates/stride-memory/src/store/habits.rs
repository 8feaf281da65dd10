//! Habit CRUD and checkin queries.

use super::{encode_ts, parse_date, parse_ts, Store};
use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use stride_core::draft::HabitDraft;
use stride_core::error::StrideError;
use stride_core::model::{Checkin, Habit, HabitInterval, HabitStatus};

type HabitRow = (
    i64,
    i64,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
);

const HABIT_COLUMNS: &str =
    "id, chat_id, title, description, interval, goal_date, status, created_at";

fn row_to_habit(row: HabitRow) -> Result<Habit, StrideError> {
    let (id, chat_id, title, description, interval, goal_date, status, created_at) = row;
    let interval = match interval {
        Some(raw) => Some(
            HabitInterval::parse(&raw)
                .ok_or_else(|| StrideError::Storage(format!("unknown interval {raw:?}")))?,
        ),
        None => None,
    };
    Ok(Habit {
        id,
        chat_id,
        title,
        description,
        interval,
        goal_date: goal_date.as_deref().map(parse_date).transpose()?,
        status: HabitStatus::parse(&status)
            .ok_or_else(|| StrideError::Storage(format!("unknown habit status {status:?}")))?,
        created_at: parse_ts(&created_at)?,
    })
}

impl Store {
    /// Persist a confirmed draft as a new habit, active immediately.
    pub async fn create_habit(
        &self,
        chat_id: i64,
        draft: &HabitDraft,
    ) -> Result<Habit, StrideError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO habits (chat_id, title, description, interval, goal_date, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(chat_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.interval.map(|i| i.as_str()))
        .bind(draft.goal_date.map(|d| d.to_string()))
        .bind(HabitStatus::InProgress.as_str())
        .bind(encode_ts(created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| StrideError::Storage(format!("habit insert failed: {e}")))?;

        Ok(Habit {
            id: result.last_insert_rowid(),
            chat_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            interval: draft.interval,
            goal_date: draft.goal_date,
            status: HabitStatus::InProgress,
            created_at,
        })
    }

    pub async fn get_habit(&self, id: i64) -> Result<Habit, StrideError> {
        let row: Option<HabitRow> =
            sqlx::query_as(&format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StrideError::Storage(format!("habit lookup failed: {e}")))?;
        row.map(row_to_habit)
            .transpose()?
            .ok_or_else(|| StrideError::NotFound(format!("habit {id}")))
    }

    pub async fn list_habits(&self, chat_id: i64) -> Result<Vec<Habit>, StrideError> {
        let rows: Vec<HabitRow> = sqlx::query_as(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE chat_id = ? ORDER BY id"
        ))
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StrideError::Storage(format!("habit list failed: {e}")))?;
        rows.into_iter().map(row_to_habit).collect()
    }

    pub async fn set_habit_status(
        &self,
        id: i64,
        status: HabitStatus,
    ) -> Result<Habit, StrideError> {
        let result = sqlx::query("UPDATE habits SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StrideError::Storage(format!("habit status update failed: {e}")))?;
        if result.rows_affected() == 0 {
            return Err(StrideError::NotFound(format!("habit {id}")));
        }
        self.get_habit(id).await
    }

    /// Record a completion for `day`. At most one per habit per day.
    pub async fn checkin(&self, habit_id: i64, day: NaiveDate) -> Result<Checkin, StrideError> {
        // Ensure the habit exists so a bad id reads as NotFound, not a
        // silent foreign-key failure.
        self.get_habit(habit_id).await?;

        let completed_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO checkins (habit_id, day, completed_at) VALUES (?, ?, ?)",
        )
        .bind(habit_id)
        .bind(day.to_string())
        .bind(encode_ts(completed_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(result) => Ok(Checkin {
                id: result.last_insert_rowid(),
                habit_id,
                day,
                completed_at,
            }),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StrideError::DuplicateCheckin { habit_id, day })
            }
            Err(e) => Err(StrideError::Storage(format!("checkin insert failed: {e}"))),
        }
    }

    /// Remove the completion for `day`, if any.
    pub async fn remove_checkin(&self, habit_id: i64, day: NaiveDate) -> Result<(), StrideError> {
        sqlx::query("DELETE FROM checkins WHERE habit_id = ? AND day = ?")
            .bind(habit_id)
            .bind(day.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| StrideError::Storage(format!("checkin delete failed: {e}")))?;
        Ok(())
    }

    /// All checkin days for a habit, ascending.
    pub async fn checkin_days(&self, habit_id: i64) -> Result<Vec<NaiveDate>, StrideError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT day FROM checkins WHERE habit_id = ? ORDER BY day")
                .bind(habit_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StrideError::Storage(format!("checkin query failed: {e}")))?;
        rows.iter().map(|(d,)| parse_date(d)).collect()
    }

    /// Checkin days as a set, for the recurrence predicates.
    pub async fn checkin_set(&self, habit_id: i64) -> Result<HashSet<NaiveDate>, StrideError> {
        Ok(self.checkin_days(habit_id).await?.into_iter().collect())
    }

    /// Full checkin records, ascending by day. Used by the weekly summary
    /// to bucket completions by time of day.
    pub async fn list_checkins(&self, habit_id: i64) -> Result<Vec<Checkin>, StrideError> {
        let rows: Vec<(i64, i64, String, String)> = sqlx::query_as(
            "SELECT id, habit_id, day, completed_at FROM checkins \
             WHERE habit_id = ? ORDER BY day",
        )
        .bind(habit_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StrideError::Storage(format!("checkin query failed: {e}")))?;
        rows.into_iter()
            .map(|(id, habit_id, day, completed_at)| {
                Ok(Checkin {
                    id,
                    habit_id,
                    day: parse_date(&day)?,
                    completed_at: parse_ts(&completed_at)?,
                })
            })
            .collect()
    }
}
