//! Habit wizard, habit view, and streak handlers.

use chrono::{Days, NaiveDate, Utc};
use tracing::debug;

use stride_channels::ui;
use stride_core::draft::{HabitDraft, GOAL_DATE_FORMAT};
use stride_core::error::StrideError;
use stride_core::marker::Marker;
use stride_core::message::OutboundMessage;
use stride_core::model::{Habit, HabitInterval, HabitStatus};
use stride_core::recurrence;

use super::routing::{HabitField, HabitWindow};
use super::Gateway;
use crate::stats;

impl Gateway {
    pub(super) async fn start_habit_wizard(&self, chat_id: i64) -> Result<(), StrideError> {
        self.habit_drafts
            .put(chat_id, &HabitDraft::placeholder())
            .await;
        self.send_tracked(
            chat_id,
            OutboundMessage::text("What habit do you want to build? Send its title."),
            Some(Marker::CreateHabit),
        )
        .await
    }

    pub(super) async fn prompt_habit_field(
        &self,
        field: HabitField,
        chat_id: i64,
    ) -> Result<(), StrideError> {
        let (body, marker) = match field {
            HabitField::Title => (
                OutboundMessage::text("Send the new title."),
                Marker::ChangeHabitTitle,
            ),
            HabitField::Description => (
                OutboundMessage::text("Send the new description."),
                Marker::ChangeHabitDescription,
            ),
            HabitField::Interval => (ui::interval_prompt(), Marker::ChangeHabitInterval),
            HabitField::GoalDate => (
                OutboundMessage::text(
                    "Until when do you want to keep this up? \
                     Format: DD.MM.YYYY, e.g. 31.12.2026.",
                ),
                Marker::ChangeHabitGoalDate,
            ),
        };
        self.send_tracked(chat_id, body, Some(marker)).await
    }

    pub(super) async fn apply_habit_field(
        &self,
        field: HabitField,
        text: &str,
        chat_id: i64,
    ) -> Result<(), StrideError> {
        let base = self
            .habit_drafts
            .get(chat_id)
            .await
            .unwrap_or_else(HabitDraft::placeholder);

        let draft = match field {
            HabitField::Title => base.with_title(text.trim()),
            HabitField::Description => base.with_description(text.trim()),
            HabitField::Interval => match HabitInterval::parse_label(text) {
                Some(interval) => base.with_interval(interval),
                None => {
                    debug!("Unrecognized interval {text:?} in chat {chat_id}");
                    let mut prompt = ui::interval_prompt();
                    prompt.text = format!("I don't know that interval.\n\n{}", prompt.text);
                    return self
                        .send_tracked(chat_id, prompt, Some(Marker::ChangeHabitInterval))
                        .await;
                }
            },
            HabitField::GoalDate => {
                match NaiveDate::parse_from_str(text.trim(), GOAL_DATE_FORMAT) {
                    Ok(date) => base.with_goal_date(date),
                    Err(_) => {
                        return self
                            .send_tracked(
                                chat_id,
                                OutboundMessage::text(
                                    "I couldn't read that date. \
                                     Use DD.MM.YYYY, e.g. 31.12.2026.",
                                ),
                                Some(Marker::ChangeHabitGoalDate),
                            )
                            .await;
                    }
                }
            }
        };

        self.habit_drafts.put(chat_id, &draft).await;
        self.edit_tracked(
            chat_id,
            ui::habit_draft_summary(&draft),
            Some(Marker::CreateHabit),
        )
        .await
    }

    pub(super) async fn confirm_habit(&self, chat_id: i64) -> Result<(), StrideError> {
        let Some(draft) = self.habit_drafts.get(chat_id).await else {
            return self
                .send_tracked(
                    chat_id,
                    ui::habits_menu_with_notice("That draft expired. Start a new habit."),
                    Some(Marker::HabitMenu),
                )
                .await;
        };

        let missing = draft.missing_fields();
        if !missing.is_empty() {
            return self
                .send_tracked(
                    chat_id,
                    OutboundMessage::text(format!(
                        "Fill in all required fields first: {}.",
                        missing.join(", ")
                    )),
                    Some(Marker::CreateHabit),
                )
                .await;
        }

        self.store.create_habit(chat_id, &draft).await?;
        self.habit_drafts.delete(chat_id).await;
        self.send_tracked(
            chat_id,
            ui::habits_menu_with_notice("Habit created."),
            Some(Marker::HabitMenu),
        )
        .await
    }

    /// Habits due on any day inside the next `days` starting at `from`.
    async fn habits_due_within(
        &self,
        habits: &[Habit],
        from: NaiveDate,
        days: u64,
    ) -> Result<Vec<Habit>, StrideError> {
        let mut due = Vec::new();
        for habit in habits {
            let checkins = self.store.checkin_set(habit.id).await?;
            let hit = (0..days)
                .map(|offset| from + Days::new(offset))
                .any(|day| recurrence::is_due_on(habit, &checkins, day));
            if hit {
                due.push(habit.clone());
            }
        }
        Ok(due)
    }

    pub(super) async fn show_habit_list(
        &self,
        window: HabitWindow,
        chat_id: i64,
    ) -> Result<(), StrideError> {
        let habits = self.store.list_habits(chat_id).await?;
        let today = Utc::now().date_naive();
        let (heading, habits) = match window {
            HabitWindow::All => ("All habits", habits),
            HabitWindow::Today => (
                "Habits for today",
                self.habits_due_within(&habits, today, 1).await?,
            ),
            HabitWindow::Week => (
                "Habits this week",
                self.habits_due_within(&habits, today, 7).await?,
            ),
        };
        self.send_tracked(
            chat_id,
            ui::habit_list(heading, &habits),
            Some(Marker::HabitList),
        )
        .await
    }

    pub(super) async fn show_streaks(&self, chat_id: i64) -> Result<(), StrideError> {
        let habits = self.store.list_habits(chat_id).await?;
        let today = Utc::now().date_naive();

        let mut entries = Vec::new();
        for habit in habits
            .iter()
            .filter(|h| h.status == HabitStatus::InProgress)
        {
            let days = self.store.checkin_days(habit.id).await?;
            entries.push(stats::habit_stats(habit, &days, today));
        }

        self.send_tracked(
            chat_id,
            ui::habits_back(stats::format_streaks(&entries)),
            Some(Marker::HabitMenu),
        )
        .await
    }

    pub(super) async fn pick_habit(
        &self,
        entity_id: Option<i64>,
        chat_id: i64,
    ) -> Result<(), StrideError> {
        let Some(id) = entity_id else { return Ok(()) };
        match self.store.get_habit(id).await {
            Ok(habit) => {
                let checked = self
                    .store
                    .checkin_set(id)
                    .await?
                    .contains(&Utc::now().date_naive());
                self.send_tracked(
                    chat_id,
                    ui::habit_view(&habit, checked),
                    Some(Marker::HabitList),
                )
                .await
            }
            Err(StrideError::NotFound(_)) => self.missing_habit(chat_id).await,
            Err(e) => Err(e),
        }
    }

    pub(super) async fn set_habit_status(
        &self,
        entity_id: Option<i64>,
        status: HabitStatus,
        chat_id: i64,
    ) -> Result<(), StrideError> {
        let Some(id) = entity_id else { return Ok(()) };
        match self.store.set_habit_status(id, status).await {
            Ok(habit) => {
                let checked = self
                    .store
                    .checkin_set(id)
                    .await?
                    .contains(&Utc::now().date_naive());
                self.edit_tracked(
                    chat_id,
                    ui::habit_view(&habit, checked),
                    Some(Marker::HabitList),
                )
                .await
            }
            Err(StrideError::NotFound(_)) => self.missing_habit(chat_id).await,
            Err(e) => Err(e),
        }
    }

    /// Checkin or undo for today, then refresh the habit screen.
    pub(super) async fn mark_habit(
        &self,
        entity_id: Option<i64>,
        completed: bool,
        chat_id: i64,
    ) -> Result<(), StrideError> {
        let Some(id) = entity_id else { return Ok(()) };
        let today = Utc::now().date_naive();

        if completed {
            match self.store.checkin(id, today).await {
                Ok(_) => {}
                Err(StrideError::DuplicateCheckin { .. }) => {
                    return self
                        .send_tracked(
                            chat_id,
                            OutboundMessage::text("Already marked done today."),
                            Some(Marker::HabitList),
                        )
                        .await;
                }
                Err(StrideError::NotFound(_)) => return self.missing_habit(chat_id).await,
                Err(e) => return Err(e),
            }
        } else {
            self.store.remove_checkin(id, today).await?;
        }

        match self.store.get_habit(id).await {
            Ok(habit) => {
                self.edit_tracked(
                    chat_id,
                    ui::habit_view(&habit, completed),
                    Some(Marker::HabitList),
                )
                .await
            }
            Err(StrideError::NotFound(_)) => self.missing_habit(chat_id).await,
            Err(e) => Err(e),
        }
    }

    async fn missing_habit(&self, chat_id: i64) -> Result<(), StrideError> {
        self.send_tracked(
            chat_id,
            OutboundMessage::text("That habit no longer exists."),
            Some(Marker::HabitList),
        )
        .await
    }
}
