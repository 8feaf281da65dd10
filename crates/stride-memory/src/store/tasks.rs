//! Task CRUD and deadline-window queries.

use super::{encode_ts, parse_ts, Store};
use chrono::{DateTime, Utc};
use stride_core::draft::TaskDraft;
use stride_core::error::StrideError;
use stride_core::model::{Priority, Task, TaskStatus};

type TaskRow = (
    i64,
    i64,
    String,
    String,
    Option<String>,
    String,
    String,
    String,
    Option<String>,
);

const TASK_COLUMNS: &str =
    "id, chat_id, title, description, deadline, priority, status, created_at, completed_at";

fn row_to_task(row: TaskRow) -> Result<Task, StrideError> {
    let (id, chat_id, title, description, deadline, priority, status, created_at, completed_at) =
        row;
    Ok(Task {
        id,
        chat_id,
        title,
        description,
        deadline: deadline.as_deref().map(parse_ts).transpose()?,
        priority: Priority::parse(&priority)
            .ok_or_else(|| StrideError::Storage(format!("unknown priority {priority:?}")))?,
        status: TaskStatus::parse(&status)
            .ok_or_else(|| StrideError::Storage(format!("unknown task status {status:?}")))?,
        created_at: parse_ts(&created_at)?,
        completed_at: completed_at.as_deref().map(parse_ts).transpose()?,
    })
}

impl Store {
    /// Persist a confirmed draft as a new task.
    pub async fn create_task(&self, chat_id: i64, draft: &TaskDraft) -> Result<Task, StrideError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO tasks (chat_id, title, description, deadline, priority, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(chat_id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.deadline.map(encode_ts))
        .bind(draft.priority.as_str())
        .bind(TaskStatus::New.as_str())
        .bind(encode_ts(created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| StrideError::Storage(format!("task insert failed: {e}")))?;

        Ok(Task {
            id: result.last_insert_rowid(),
            chat_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            deadline: draft.deadline,
            priority: draft.priority,
            status: TaskStatus::New,
            created_at,
            completed_at: None,
        })
    }

    pub async fn get_task(&self, id: i64) -> Result<Task, StrideError> {
        let row: Option<TaskRow> =
            sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StrideError::Storage(format!("task lookup failed: {e}")))?;
        row.map(row_to_task)
            .transpose()?
            .ok_or_else(|| StrideError::NotFound(format!("task {id}")))
    }

    /// All tasks for a chat, oldest first.
    pub async fn list_tasks(&self, chat_id: i64) -> Result<Vec<Task>, StrideError> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE chat_id = ? ORDER BY id"
        ))
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StrideError::Storage(format!("task list failed: {e}")))?;
        rows.into_iter().map(row_to_task).collect()
    }

    /// Unfinished tasks with a deadline inside `[start, end)`.
    pub async fn tasks_due_between(
        &self,
        chat_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Task>, StrideError> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE chat_id = ? AND status != 'done' \
             AND deadline IS NOT NULL AND deadline >= ? AND deadline < ? \
             ORDER BY deadline"
        ))
        .bind(chat_id)
        .bind(encode_ts(start))
        .bind(encode_ts(end))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StrideError::Storage(format!("deadline query failed: {e}")))?;
        rows.into_iter().map(row_to_task).collect()
    }

    /// Change a task's status. Done sets `completed_at`; any other status
    /// clears it.
    pub async fn set_task_status(
        &self,
        id: i64,
        status: TaskStatus,
    ) -> Result<Task, StrideError> {
        let completed_at = match status {
            TaskStatus::Done => Some(encode_ts(Utc::now())),
            _ => None,
        };
        let result = sqlx::query("UPDATE tasks SET status = ?, completed_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(completed_at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StrideError::Storage(format!("status update failed: {e}")))?;
        if result.rows_affected() == 0 {
            return Err(StrideError::NotFound(format!("task {id}")));
        }
        self.get_task(id).await
    }

    pub async fn delete_task(&self, id: i64) -> Result<(), StrideError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StrideError::Storage(format!("task delete failed: {e}")))?;
        if result.rows_affected() == 0 {
            return Err(StrideError::NotFound(format!("task {id}")));
        }
        Ok(())
    }
}
