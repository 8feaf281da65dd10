//! Conversation markers.
//!
//! A marker records what the bot last asked for in a chat, so the next
//! free-text message can be interpreted. Markers ride along with a
//! [`MessageRef`] in the context cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// What the bot's last message in a chat was prompting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Marker {
    Welcome,
    HomeMenu,
    TaskMenu,
    HabitMenu,
    TaskList,
    HabitList,
    CreateTask,
    ChangeTaskTitle,
    ChangeTaskDescription,
    ChangeTaskDeadline,
    CreateHabit,
    ChangeHabitTitle,
    ChangeHabitDescription,
    ChangeHabitInterval,
    ChangeHabitGoalDate,
}

/// Reference to the bot's last message in a chat, with the marker it
/// carried. Stored under the context cache's `last-message:` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub message_id: String,
    pub seq: i64,
    pub sent_at: DateTime<Utc>,
    /// Lenient on read: an unknown marker string becomes `None` so old
    /// cache entries never poison a turn.
    #[serde(default, deserialize_with = "lenient_marker")]
    pub marker: Option<Marker>,
}

fn lenient_marker<'de, D>(deserializer: D) -> Result<Option<Marker>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| serde_json::from_value(v).ok()))
}
