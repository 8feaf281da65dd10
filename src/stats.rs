//! Streak and summary aggregation over checkin history.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use std::collections::HashSet;

use stride_core::model::{Checkin, Habit, Task, TaskStatus};
use stride_core::recurrence;

/// Derived per-habit figures for the streaks screen and weekly summary.
#[derive(Debug, Clone, PartialEq)]
pub struct HabitStats {
    pub title: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    /// Completion rate over the current Monday-Sunday week, in percent.
    pub week_rate: f64,
}

/// Compute stats from the habit's full checkin history. `days` must be
/// sorted ascending.
pub fn habit_stats(habit: &Habit, days: &[NaiveDate], today: NaiveDate) -> HabitStats {
    let set: HashSet<NaiveDate> = days.iter().copied().collect();
    let week_start = recurrence::week_start(today);
    let week_end = week_start + Days::new(6);
    HabitStats {
        title: habit.title.clone(),
        current_streak: recurrence::current_streak(&set, today),
        longest_streak: recurrence::longest_streak(days),
        week_rate: recurrence::completion_rate(habit, &set, week_start, week_end),
    }
}

/// Longest current streak across a chat's habits, for the daily nudge.
pub fn best_current_streak(entries: &[HabitStats]) -> u32 {
    entries.iter().map(|s| s.current_streak).max().unwrap_or(0)
}

pub fn format_streaks(entries: &[HabitStats]) -> String {
    if entries.is_empty() {
        return "No active habits yet. Create one and start a streak!".to_string();
    }
    let mut out = String::from("Your streaks\n");
    for s in entries {
        out.push_str(&format!(
            "\n{}: {} day streak (best {})",
            s.title, s.current_streak, s.longest_streak
        ));
    }
    out
}

/// Aggregate task figures for the weekly summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskStats {
    pub total: u32,
    pub completed: u32,
    pub overdue: u32,
}

impl TaskStats {
    /// Share of tasks completed, in percent. 0.0 with no tasks.
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Count totals, completions, and open tasks whose deadline has passed.
pub fn task_stats(tasks: &[Task], now: DateTime<Utc>) -> TaskStats {
    let mut out = TaskStats::default();
    for task in tasks {
        out.total += 1;
        if task.status == TaskStatus::Done {
            out.completed += 1;
        } else if task.deadline.is_some_and(|d| d < now) {
            out.overdue += 1;
        }
    }
    out
}

/// Completions bucketed by weekday, Monday first.
pub fn active_day_histogram(checkins: &[Checkin]) -> [u32; 7] {
    let mut buckets = [0u32; 7];
    for checkin in checkins {
        buckets[checkin.day.weekday().num_days_from_monday() as usize] += 1;
    }
    buckets
}

fn weekday_name(index: usize) -> &'static str {
    match index {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Sunday",
    }
}

/// The Sunday-evening summary: per-habit week rates, overall task
/// figures, and the most active weekday across all habits.
pub fn format_weekly_summary(
    entries: &[HabitStats],
    tasks: &TaskStats,
    histogram: &[u32; 7],
) -> String {
    if entries.is_empty() && tasks.total == 0 {
        return "Your week is a blank page. Add a habit to start filling it in.".to_string();
    }
    let mut out = String::from("Your week in review\n");
    for s in entries {
        out.push_str(&format!("\n{}: {:.0}% of days completed", s.title, s.week_rate));
    }
    if tasks.total > 0 {
        out.push_str(&format!(
            "\n\nTasks: {} of {} done ({:.0}%)",
            tasks.completed,
            tasks.total,
            tasks.completion_rate()
        ));
        if tasks.overdue > 0 {
            out.push_str(&format!(", {} overdue", tasks.overdue));
        }
    }
    if let Some((best, count)) = histogram
        .iter()
        .enumerate()
        .max_by_key(|(_, count)| **count)
        .filter(|(_, count)| **count > 0)
    {
        out.push_str(&format!(
            "\n\nMost active day: {} ({count} completions)",
            weekday_name(best)
        ));
    }
    out
}

/// True on the weekday the weekly summary goes out.
pub fn is_summary_day(day: NaiveDate) -> bool {
    day.weekday() == Weekday::Sun
}
