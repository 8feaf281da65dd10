//! Task wizard and task view handlers.

use chrono::{DateTime, Days, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

use stride_channels::ui;
use stride_core::draft::{TaskDraft, DEADLINE_FORMAT, PLACEHOLDER};
use stride_core::error::StrideError;
use stride_core::marker::Marker;
use stride_core::message::OutboundMessage;
use stride_core::model::{ParsedTask, Priority, Task, TaskStatus};

use super::routing::{TaskField, TaskWindow};
use super::Gateway;

/// Midnight UTC of today, as a timestamp.
fn start_of_day(offset_days: u64) -> DateTime<Utc> {
    let day = Utc::now().date_naive() + Days::new(offset_days);
    Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// List ordering: active before done, earlier deadlines first, higher
/// priority first. Tasks without a deadline sink below dated ones.
pub(super) fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| {
        (
            t.status.sort_weight(),
            t.deadline.is_none(),
            t.deadline,
            t.priority,
        )
    });
}

impl Gateway {
    pub(super) async fn start_task_wizard(&self, chat_id: i64) -> Result<(), StrideError> {
        self.task_drafts.put(chat_id, &TaskDraft::placeholder()).await;
        self.send_tracked(
            chat_id,
            OutboundMessage::text(
                "Describe the task in one message. I'll pull out the title, \
                 deadline, and priority, and you can adjust them after.",
            ),
            Some(Marker::CreateTask),
        )
        .await
    }

    /// Free text under the create-task marker: run the extractor and fold
    /// the result into the draft.
    pub(super) async fn extract_task_from_text(
        &self,
        text: &str,
        chat_id: i64,
    ) -> Result<(), StrideError> {
        let parsed = match &self.extractor {
            Some(extractor) => match extractor.extract_task(text).await {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!("Extraction failed for chat {chat_id}, using raw text: {err}");
                    raw_parsed(text)
                }
            },
            None => raw_parsed(text),
        };

        let base = self
            .task_drafts
            .get(chat_id)
            .await
            .unwrap_or_else(TaskDraft::placeholder);
        let description = if parsed.description.trim().is_empty() {
            PLACEHOLDER.to_string()
        } else {
            parsed.description
        };
        let draft = base
            .with_title(parsed.title)
            .with_description(description)
            .with_deadline(parsed.deadline)
            .with_priority(parsed.priority);

        self.task_drafts.put(chat_id, &draft).await;
        self.edit_tracked(chat_id, ui::task_draft_summary(&draft), Some(Marker::CreateTask))
            .await
    }

    pub(super) async fn prompt_task_field(
        &self,
        field: TaskField,
        chat_id: i64,
    ) -> Result<(), StrideError> {
        let (text, marker) = match field {
            TaskField::Title => ("Send the new title.", Marker::ChangeTaskTitle),
            TaskField::Description => {
                ("Send the new description.", Marker::ChangeTaskDescription)
            }
            TaskField::Deadline => (
                "When is it due? Format: DD.MM.YYYY HH:MM, e.g. 31.12.2026 18:00.",
                Marker::ChangeTaskDeadline,
            ),
        };
        self.send_tracked(chat_id, OutboundMessage::text(text), Some(marker))
            .await
    }

    /// Apply a field reply to the draft, recreating a placeholder draft if
    /// the old one expired.
    pub(super) async fn apply_task_field(
        &self,
        field: TaskField,
        text: &str,
        chat_id: i64,
    ) -> Result<(), StrideError> {
        let base = self
            .task_drafts
            .get(chat_id)
            .await
            .unwrap_or_else(TaskDraft::placeholder);

        let draft = match field {
            TaskField::Title => base.with_title(text.trim()),
            TaskField::Description => base.with_description(text.trim()),
            TaskField::Deadline => {
                match NaiveDateTime::parse_from_str(text.trim(), DEADLINE_FORMAT) {
                    Ok(naive) => base.with_deadline(Some(Utc.from_utc_datetime(&naive))),
                    Err(_) => {
                        return self
                            .send_tracked(
                                chat_id,
                                OutboundMessage::text(
                                    "I couldn't read that date. \
                                     Use DD.MM.YYYY HH:MM, e.g. 31.12.2026 18:00.",
                                ),
                                Some(Marker::ChangeTaskDeadline),
                            )
                            .await;
                    }
                }
            }
        };

        self.task_drafts.put(chat_id, &draft).await;
        self.edit_tracked(chat_id, ui::task_draft_summary(&draft), Some(Marker::CreateTask))
            .await
    }

    pub(super) async fn confirm_task(&self, chat_id: i64) -> Result<(), StrideError> {
        let Some(draft) = self.task_drafts.get(chat_id).await else {
            return self
                .send_tracked(
                    chat_id,
                    ui::tasks_menu_with_notice("That draft expired. Start a new task."),
                    Some(Marker::TaskMenu),
                )
                .await;
        };

        let missing = draft.missing_fields();
        if !missing.is_empty() {
            return self
                .send_tracked(
                    chat_id,
                    OutboundMessage::text(format!("Fill in the {} first.", missing.join(", "))),
                    Some(Marker::CreateTask),
                )
                .await;
        }

        self.store.create_task(chat_id, &draft).await?;
        self.task_drafts.delete(chat_id).await;
        self.send_tracked(
            chat_id,
            ui::tasks_menu_with_notice("Task created."),
            Some(Marker::TaskMenu),
        )
        .await
    }

    pub(super) async fn show_task_list(
        &self,
        window: TaskWindow,
        chat_id: i64,
    ) -> Result<(), StrideError> {
        let (heading, mut tasks) = match window {
            TaskWindow::Today => (
                "Tasks due today",
                self.store
                    .tasks_due_between(chat_id, start_of_day(0), start_of_day(1))
                    .await?,
            ),
            TaskWindow::Tomorrow => (
                "Tasks due tomorrow",
                self.store
                    .tasks_due_between(chat_id, start_of_day(1), start_of_day(2))
                    .await?,
            ),
            TaskWindow::Week => (
                "Tasks due this week",
                self.store
                    .tasks_due_between(chat_id, start_of_day(0), start_of_day(7))
                    .await?,
            ),
            TaskWindow::All => {
                let mut all = self.store.list_tasks(chat_id).await?;
                all.retain(|t| t.status != TaskStatus::Done);
                ("All open tasks", all)
            }
        };
        sort_tasks(&mut tasks);
        self.send_tracked(chat_id, ui::task_list(heading, &tasks), Some(Marker::TaskList))
            .await
    }

    pub(super) async fn pick_task(
        &self,
        entity_id: Option<i64>,
        chat_id: i64,
    ) -> Result<(), StrideError> {
        let Some(id) = entity_id else { return Ok(()) };
        match self.store.get_task(id).await {
            Ok(task) => {
                self.send_tracked(chat_id, ui::task_view(&task), Some(Marker::TaskList))
                    .await
            }
            Err(StrideError::NotFound(_)) => {
                self.send_tracked(
                    chat_id,
                    OutboundMessage::text("That task no longer exists."),
                    Some(Marker::TaskList),
                )
                .await
            }
            Err(e) => Err(e),
        }
    }

    pub(super) async fn set_task_status(
        &self,
        entity_id: Option<i64>,
        status: TaskStatus,
        chat_id: i64,
    ) -> Result<(), StrideError> {
        let Some(id) = entity_id else { return Ok(()) };
        match self.store.set_task_status(id, status).await {
            Ok(task) => {
                self.edit_tracked(chat_id, ui::task_view(&task), Some(Marker::TaskList))
                    .await
            }
            Err(StrideError::NotFound(_)) => {
                self.send_tracked(
                    chat_id,
                    OutboundMessage::text("That task no longer exists."),
                    Some(Marker::TaskList),
                )
                .await
            }
            Err(e) => Err(e),
        }
    }

    pub(super) async fn delete_task(
        &self,
        entity_id: Option<i64>,
        chat_id: i64,
    ) -> Result<(), StrideError> {
        let Some(id) = entity_id else { return Ok(()) };
        match self.store.delete_task(id).await {
            Ok(()) => {
                self.send_tracked(
                    chat_id,
                    ui::tasks_menu_with_notice("Task deleted."),
                    Some(Marker::TaskMenu),
                )
                .await
            }
            Err(StrideError::NotFound(_)) => {
                self.send_tracked(
                    chat_id,
                    OutboundMessage::text("That task no longer exists."),
                    Some(Marker::TaskList),
                )
                .await
            }
            Err(e) => Err(e),
        }
    }
}

fn raw_parsed(text: &str) -> ParsedTask {
    ParsedTask {
        title: text.trim().to_string(),
        description: String::new(),
        deadline: None,
        priority: Priority::Low,
    }
}
