//! Background notification sweeps.
//!
//! Three independent timers: hourly deadline reminders, a daily motivation
//! push, and the Sunday weekly summary. Sweeps iterate every known chat,
//! swallow per-chat failures, and pace themselves between chats. They send
//! directly through the messenger so a notification never clobbers the
//! marker of a wizard in progress.

use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tracing::{debug, error, warn};

use stride_core::draft::DEADLINE_FORMAT;
use stride_core::error::StrideError;
use stride_core::message::OutboundMessage;
use stride_core::model::HabitStatus;
use stride_core::recurrence;

use super::Gateway;
use crate::stats;

/// Time until the next occurrence of `hour:00` UTC.
fn until_next_hour(hour: u32) -> Duration {
    let now = Utc::now();
    let mut next = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .unwrap_or_default()
        .and_utc();
    if next <= now {
        next += ChronoDuration::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::from_secs(60))
}

impl Gateway {
    async fn pace(&self) {
        tokio::time::sleep(Duration::from_millis(self.sweeps.per_chat_delay_ms)).await;
    }

    /// Run `sweep_one` over every chat, isolating failures.
    async fn sweep_chats<F, Fut>(&self, name: &str, sweep_one: F)
    where
        F: Fn(i64) -> Fut,
        Fut: std::future::Future<Output = Result<(), StrideError>>,
    {
        let chats = match self.store.all_chat_ids().await {
            Ok(chats) => chats,
            Err(e) => {
                error!("{name} sweep could not list chats: {e}");
                return;
            }
        };
        debug!("{name} sweep over {} chats", chats.len());
        for chat_id in chats {
            if let Err(e) = sweep_one(chat_id).await {
                warn!("{name} sweep failed for chat {chat_id}: {e}");
            }
            self.pace().await;
        }
    }

    pub(super) async fn reminder_loop(&self) {
        let interval = Duration::from_secs(self.sweeps.reminder_interval_secs);
        loop {
            self.sweep_chats("reminder", |chat_id| self.remind_chat(chat_id))
                .await;
            tokio::time::sleep(interval).await;
        }
    }

    /// Deadline alerts: due within the hour, due within a day, habits still
    /// open today. Silent when there is nothing to say.
    async fn remind_chat(&self, chat_id: i64) -> Result<(), StrideError> {
        let now = Utc::now();
        let soon = self
            .store
            .tasks_due_between(chat_id, now, now + ChronoDuration::hours(1))
            .await?;
        let today = self
            .store
            .tasks_due_between(
                chat_id,
                now + ChronoDuration::hours(1),
                now + ChronoDuration::hours(24),
            )
            .await?;

        let day = now.date_naive();
        let mut open_habits = Vec::new();
        for habit in self.store.list_habits(chat_id).await? {
            if habit.status != HabitStatus::InProgress {
                continue;
            }
            let checkins = self.store.checkin_set(habit.id).await?;
            if recurrence::is_due_on(&habit, &checkins, day) && !checkins.contains(&day) {
                open_habits.push(habit.title);
            }
        }

        if soon.is_empty() && today.is_empty() && open_habits.is_empty() {
            return Ok(());
        }

        let mut text = String::from("Heads up!");
        for task in &soon {
            text.push_str(&format!("\n{} is due within the hour.", task.title));
        }
        for task in &today {
            if let Some(deadline) = task.deadline {
                text.push_str(&format!(
                    "\n{} is due {}.",
                    task.title,
                    deadline.format(DEADLINE_FORMAT)
                ));
            }
        }
        if !open_habits.is_empty() {
            text.push_str(&format!("\nStill open today: {}.", open_habits.join(", ")));
        }

        self.messenger
            .send(chat_id, OutboundMessage::text(text))
            .await?;
        Ok(())
    }

    pub(super) async fn motivation_loop(&self) {
        loop {
            tokio::time::sleep(until_next_hour(self.sweeps.motivation_hour)).await;
            self.sweep_chats("motivation", |chat_id| self.motivate_chat(chat_id))
                .await;
        }
    }

    /// One encouraging line per day, keyed to the chat's best streak.
    async fn motivate_chat(&self, chat_id: i64) -> Result<(), StrideError> {
        let entries = self.chat_stats(chat_id).await?;
        let streak = stats::best_current_streak(&entries);
        if streak == 0 {
            return Ok(());
        }

        let line = match &self.extractor {
            Some(extractor) => match extractor.motivation(streak).await {
                Ok(line) => line,
                Err(err) => {
                    warn!("Motivation generation failed for chat {chat_id}: {err}");
                    canned_motivation(streak)
                }
            },
            None => canned_motivation(streak),
        };

        self.messenger
            .send(chat_id, OutboundMessage::text(line))
            .await?;
        Ok(())
    }

    pub(super) async fn summary_loop(&self) {
        loop {
            tokio::time::sleep(until_next_hour(self.sweeps.summary_hour)).await;
            if !stats::is_summary_day(Utc::now().date_naive()) {
                continue;
            }
            self.sweep_chats("summary", |chat_id| self.summarize_chat(chat_id))
                .await;
        }
    }

    async fn summarize_chat(&self, chat_id: i64) -> Result<(), StrideError> {
        let now = Utc::now();
        let entries = self.chat_stats(chat_id).await?;
        let tasks = stats::task_stats(&self.store.list_tasks(chat_id).await?, now);
        if entries.is_empty() && tasks.total == 0 {
            return Ok(());
        }

        let week_start = recurrence::week_start(now.date_naive());
        let mut histogram = [0u32; 7];
        for habit in self.store.list_habits(chat_id).await? {
            let checkins = self.store.list_checkins(habit.id).await?;
            let week: Vec<_> = checkins
                .into_iter()
                .filter(|c| c.day >= week_start)
                .collect();
            let buckets = stats::active_day_histogram(&week);
            for (total, n) in histogram.iter_mut().zip(buckets) {
                *total += n;
            }
        }

        let text = stats::format_weekly_summary(&entries, &tasks, &histogram);
        self.messenger
            .send(chat_id, OutboundMessage::text(text))
            .await?;
        Ok(())
    }

    /// Stats for every active habit in a chat.
    async fn chat_stats(&self, chat_id: i64) -> Result<Vec<stats::HabitStats>, StrideError> {
        let today = Utc::now().date_naive();
        let mut entries = Vec::new();
        for habit in self.store.list_habits(chat_id).await? {
            if habit.status != HabitStatus::InProgress {
                continue;
            }
            let days = self.store.checkin_days(habit.id).await?;
            entries.push(stats::habit_stats(&habit, &days, today));
        }
        Ok(entries)
    }
}

fn canned_motivation(streak: u32) -> String {
    format!("{streak} days and counting. Keep the chain going today!")
}
