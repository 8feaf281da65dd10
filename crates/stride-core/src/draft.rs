//! Wizard drafts.
//!
//! Drafts are immutable values: every field update returns a new draft via
//! a `with_*` constructor. They are serialized into the draft cache between
//! wizard steps.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{HabitInterval, Priority};

/// User-facing datetime format for task deadlines.
pub const DEADLINE_FORMAT: &str = "%d.%m.%Y %H:%M";
/// User-facing date format for habit goal dates.
pub const GOAL_DATE_FORMAT: &str = "%d.%m.%Y";

/// Placeholder used for fields the user has not filled in yet.
pub const PLACEHOLDER: &str = "...";

/// An in-flight task being assembled by the creation wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub priority: Priority,
}

impl TaskDraft {
    /// A draft with placeholder fields, used when a field edit arrives
    /// with no draft in the cache.
    pub fn placeholder() -> Self {
        Self {
            title: PLACEHOLDER.to_string(),
            description: PLACEHOLDER.to_string(),
            deadline: None,
            priority: Priority::Low,
        }
    }

    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self.clone()
        }
    }

    pub fn with_description(&self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self.clone()
        }
    }

    pub fn with_deadline(&self, deadline: Option<DateTime<Utc>>) -> Self {
        Self {
            deadline,
            ..self.clone()
        }
    }

    pub fn with_priority(&self, priority: Priority) -> Self {
        Self {
            priority,
            ..self.clone()
        }
    }

    /// Mandatory fields still holding placeholders.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title == PLACEHOLDER || self.title.is_empty() {
            missing.push("title");
        }
        missing
    }
}

/// An in-flight habit being assembled by the creation wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitDraft {
    pub title: String,
    pub description: String,
    pub interval: Option<HabitInterval>,
    pub goal_date: Option<NaiveDate>,
}

impl HabitDraft {
    pub fn placeholder() -> Self {
        Self {
            title: PLACEHOLDER.to_string(),
            description: PLACEHOLDER.to_string(),
            interval: None,
            goal_date: None,
        }
    }

    pub fn with_title(&self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self.clone()
        }
    }

    pub fn with_description(&self, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..self.clone()
        }
    }

    pub fn with_interval(&self, interval: HabitInterval) -> Self {
        Self {
            interval: Some(interval),
            ..self.clone()
        }
    }

    pub fn with_goal_date(&self, goal_date: NaiveDate) -> Self {
        Self {
            goal_date: Some(goal_date),
            ..self.clone()
        }
    }

    /// Mandatory fields still unfilled: title, interval, goal date.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title == PLACEHOLDER || self.title.is_empty() {
            missing.push("title");
        }
        if self.interval.is_none() {
            missing.push("interval");
        }
        if self.goal_date.is_none() {
            missing.push("goal date");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_field_leaves_original_intact() {
        let a = TaskDraft::placeholder();
        let b = a.with_title("Read a chapter");
        assert_eq!(a.title, PLACEHOLDER);
        assert_eq!(b.title, "Read a chapter");
        assert_eq!(b.description, a.description);
    }

    #[test]
    fn test_field_updates_commute() {
        let base = TaskDraft::placeholder();
        let ab = base.with_title("t").with_description("d");
        let ba = base.with_description("d").with_title("t");
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_task_draft_missing_fields() {
        let draft = TaskDraft::placeholder();
        assert_eq!(draft.missing_fields(), vec!["title"]);
        assert!(draft.with_title("x").missing_fields().is_empty());
    }

    #[test]
    fn test_habit_draft_missing_fields() {
        let draft = HabitDraft::placeholder();
        assert_eq!(draft.missing_fields(), vec!["title", "interval", "goal date"]);

        let filled = draft
            .with_title("Run")
            .with_interval(HabitInterval::EveryDay)
            .with_goal_date(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
        assert!(filled.missing_fields().is_empty());
    }

    #[test]
    fn test_draft_cache_roundtrip() {
        let draft = HabitDraft::placeholder().with_interval(HabitInterval::Friday);
        let json = serde_json::to_string(&draft).unwrap();
        let back: HabitDraft = serde_json::from_str(&json).unwrap();
        assert_eq!(back, draft);
    }
}
