use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// A registered user, keyed by their messenger identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub chat_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    New,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(TaskStatus::New),
            "in_progress" => Some(TaskStatus::InProgress),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }

    /// Ordering weight for list rendering: active first, done last.
    pub fn sort_weight(&self) -> u8 {
        match self {
            TaskStatus::InProgress => 0,
            TaskStatus::New => 1,
            TaskStatus::Done => 2,
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Normal,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Some(Priority::High),
            "normal" | "medium" => Some(Priority::Normal),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Normal => "Normal",
            Priority::Low => "Low",
        }
    }
}

/// A persisted task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub chat_id: i64,
    pub title: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Lifecycle of a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitStatus {
    InProgress,
    Paused,
    Completed,
    Archived,
}

impl HabitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitStatus::InProgress => "in_progress",
            HabitStatus::Paused => "paused",
            HabitStatus::Completed => "completed",
            HabitStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(HabitStatus::InProgress),
            "paused" => Some(HabitStatus::Paused),
            "completed" => Some(HabitStatus::Completed),
            "archived" => Some(HabitStatus::Archived),
            _ => None,
        }
    }
}

/// Recurrence schedule of a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitInterval {
    EveryDay,
    EveryWeek,
    EveryWeekday,
    EveryWeekend,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl HabitInterval {
    /// Human-facing label, also accepted back by [`HabitInterval::parse_label`].
    pub fn label(&self) -> &'static str {
        match self {
            HabitInterval::EveryDay => "Every day",
            HabitInterval::EveryWeek => "Every week",
            HabitInterval::EveryWeekday => "Every weekday",
            HabitInterval::EveryWeekend => "Every weekend",
            HabitInterval::Monday => "Monday",
            HabitInterval::Tuesday => "Tuesday",
            HabitInterval::Wednesday => "Wednesday",
            HabitInterval::Thursday => "Thursday",
            HabitInterval::Friday => "Friday",
            HabitInterval::Saturday => "Saturday",
            HabitInterval::Sunday => "Sunday",
        }
    }

    /// Case-insensitive match against the display labels.
    pub fn parse_label(s: &str) -> Option<Self> {
        let s = s.trim();
        ALL_INTERVALS
            .iter()
            .copied()
            .find(|i| i.label().eq_ignore_ascii_case(s))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HabitInterval::EveryDay => "every_day",
            HabitInterval::EveryWeek => "every_week",
            HabitInterval::EveryWeekday => "every_weekday",
            HabitInterval::EveryWeekend => "every_weekend",
            HabitInterval::Monday => "monday",
            HabitInterval::Tuesday => "tuesday",
            HabitInterval::Wednesday => "wednesday",
            HabitInterval::Thursday => "thursday",
            HabitInterval::Friday => "friday",
            HabitInterval::Saturday => "saturday",
            HabitInterval::Sunday => "sunday",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "every_day" => Some(HabitInterval::EveryDay),
            "every_week" => Some(HabitInterval::EveryWeek),
            "every_weekday" => Some(HabitInterval::EveryWeekday),
            "every_weekend" => Some(HabitInterval::EveryWeekend),
            "monday" => Some(HabitInterval::Monday),
            "tuesday" => Some(HabitInterval::Tuesday),
            "wednesday" => Some(HabitInterval::Wednesday),
            "thursday" => Some(HabitInterval::Thursday),
            "friday" => Some(HabitInterval::Friday),
            "saturday" => Some(HabitInterval::Saturday),
            "sunday" => Some(HabitInterval::Sunday),
            _ => None,
        }
    }

    /// Fixed weekday for the single-day intervals.
    pub fn weekday(&self) -> Option<Weekday> {
        match self {
            HabitInterval::Monday => Some(Weekday::Mon),
            HabitInterval::Tuesday => Some(Weekday::Tue),
            HabitInterval::Wednesday => Some(Weekday::Wed),
            HabitInterval::Thursday => Some(Weekday::Thu),
            HabitInterval::Friday => Some(Weekday::Fri),
            HabitInterval::Saturday => Some(Weekday::Sat),
            HabitInterval::Sunday => Some(Weekday::Sun),
            HabitInterval::EveryDay
            | HabitInterval::EveryWeek
            | HabitInterval::EveryWeekday
            | HabitInterval::EveryWeekend => None,
        }
    }
}

pub const ALL_INTERVALS: [HabitInterval; 11] = [
    HabitInterval::EveryDay,
    HabitInterval::EveryWeek,
    HabitInterval::EveryWeekday,
    HabitInterval::EveryWeekend,
    HabitInterval::Monday,
    HabitInterval::Tuesday,
    HabitInterval::Wednesday,
    HabitInterval::Thursday,
    HabitInterval::Friday,
    HabitInterval::Saturday,
    HabitInterval::Sunday,
];

/// A persisted habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub chat_id: i64,
    pub title: String,
    pub description: String,
    pub interval: Option<HabitInterval>,
    pub goal_date: Option<NaiveDate>,
    pub status: HabitStatus,
    pub created_at: DateTime<Utc>,
}

/// One completion record for a habit. At most one per habit per day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkin {
    pub id: i64,
    pub habit_id: i64,
    pub day: NaiveDate,
    pub completed_at: DateTime<Utc>,
}

/// Structured fields pulled out of a free-text task description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default = "default_priority")]
    pub priority: Priority,
}

fn default_priority() -> Priority {
    Priority::Low
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_label_roundtrip() {
        for interval in ALL_INTERVALS {
            assert_eq!(HabitInterval::parse_label(interval.label()), Some(interval));
        }
    }

    #[test]
    fn test_interval_label_case_insensitive() {
        assert_eq!(
            HabitInterval::parse_label("every week"),
            Some(HabitInterval::EveryWeek)
        );
        assert_eq!(
            HabitInterval::parse_label("MONDAY"),
            Some(HabitInterval::Monday)
        );
        assert_eq!(HabitInterval::parse_label("fortnightly"), None);
    }

    #[test]
    fn test_status_sort_weight() {
        assert!(TaskStatus::InProgress.sort_weight() < TaskStatus::New.sort_weight());
        assert!(TaskStatus::New.sort_weight() < TaskStatus::Done.sort_weight());
    }

    #[test]
    fn test_priority_parse_aliases() {
        assert_eq!(Priority::parse("HIGH"), Some(Priority::High));
        assert_eq!(Priority::parse("medium"), Some(Priority::Normal));
        assert_eq!(Priority::parse("urgent"), None);
    }
}
