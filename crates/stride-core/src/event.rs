//! Inbound event classification.
//!
//! The transport delivers one opaque JSON payload per update. [`classify`]
//! turns it into an [`InboundEvent`] and never fails: anything it cannot
//! make sense of becomes [`InboundEvent::Unrecognized`], so the caller can
//! always acknowledge the update.

use serde::{Deserialize, Serialize};

/// A normalized inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A slash command, e.g. `/start`.
    Command {
        name: String,
        chat_id: i64,
        user_id: i64,
    },
    /// Plain text typed by the user.
    FreeText {
        text: String,
        chat_id: i64,
        user_id: i64,
    },
    /// A keyboard button press.
    Callback {
        action: Action,
        entity_id: Option<i64>,
        chat_id: i64,
        user_id: i64,
    },
    /// Anything the classifier could not interpret.
    Unrecognized,
}

/// Keyboard action vocabulary. Wire form is the kebab-case key, optionally
/// followed by `:<entity id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    HomePage,
    TasksMenu,
    HabitsMenu,
    NotificationToggle,

    TasksCreateNew,
    TasksChangeTitle,
    TasksChangeDescription,
    TasksChangeDeadline,
    TasksCreateConfirm,
    TasksGetToday,
    TasksGetTomorrow,
    TasksGetWeek,
    TasksGetAll,
    TasksPick,
    TasksSetUncompleted,
    TasksSetInProgress,
    TasksSetCompleted,
    TasksDelete,

    HabitsCreateNew,
    HabitsChangeTitle,
    HabitsChangeDescription,
    HabitsChangeInterval,
    HabitsChangeGoalDate,
    HabitsCreateConfirm,
    HabitsGetAll,
    HabitsGetToday,
    HabitsGetWeek,
    HabitsStreaks,
    HabitsPick,
    HabitsSetCompleted,
    HabitsSetArchived,
    HabitsSetPaused,
    HabitsSetInProgress,
    HabitsMarkCompleted,
    HabitsMarkUncompleted,
}

impl Action {
    pub fn key(&self) -> &'static str {
        match self {
            Action::HomePage => "home-page",
            Action::TasksMenu => "tasks-menu",
            Action::HabitsMenu => "habits-menu",
            Action::NotificationToggle => "notification-handler",

            Action::TasksCreateNew => "tasks-create-new",
            Action::TasksChangeTitle => "tasks-change-title",
            Action::TasksChangeDescription => "tasks-change-description",
            Action::TasksChangeDeadline => "tasks-change-deadline",
            Action::TasksCreateConfirm => "tasks-create-confirm",
            Action::TasksGetToday => "tasks-get-today",
            Action::TasksGetTomorrow => "tasks-get-tomorrow",
            Action::TasksGetWeek => "tasks-get-week",
            Action::TasksGetAll => "tasks-get-all",
            Action::TasksPick => "tasks-id",
            Action::TasksSetUncompleted => "tasks-set-status-uncompleted",
            Action::TasksSetInProgress => "tasks-set-status-in_progress",
            Action::TasksSetCompleted => "tasks-set-status-completed",
            Action::TasksDelete => "tasks-delete",

            Action::HabitsCreateNew => "habits-create-new",
            Action::HabitsChangeTitle => "habits-change-title",
            Action::HabitsChangeDescription => "habits-change-description",
            Action::HabitsChangeInterval => "habits-change-interval",
            Action::HabitsChangeGoalDate => "habits-change-goal-date",
            Action::HabitsCreateConfirm => "habits-create-confirm",
            Action::HabitsGetAll => "habits-get-all",
            Action::HabitsGetToday => "habits-get-today",
            Action::HabitsGetWeek => "habits-get-week",
            Action::HabitsStreaks => "habits-streaks",
            Action::HabitsPick => "habits-id",
            Action::HabitsSetCompleted => "habits-set-status-completed",
            Action::HabitsSetArchived => "habits-set-status-archived",
            Action::HabitsSetPaused => "habits-set-status-paused",
            Action::HabitsSetInProgress => "habits-set-status-in-progress",
            Action::HabitsMarkCompleted => "habits-mark-as-completed",
            Action::HabitsMarkUncompleted => "habits-mark-as-uncompleted",
        }
    }

    pub fn parse_key(key: &str) -> Option<Self> {
        ALL_ACTIONS.iter().copied().find(|a| a.key() == key)
    }

    /// Whether this action addresses one specific entity and therefore
    /// carries an `:<id>` suffix on the wire.
    pub fn takes_entity_id(&self) -> bool {
        matches!(
            self,
            Action::TasksPick
                | Action::TasksSetUncompleted
                | Action::TasksSetInProgress
                | Action::TasksSetCompleted
                | Action::TasksDelete
                | Action::HabitsPick
                | Action::HabitsSetCompleted
                | Action::HabitsSetArchived
                | Action::HabitsSetPaused
                | Action::HabitsSetInProgress
                | Action::HabitsMarkCompleted
                | Action::HabitsMarkUncompleted
        )
    }

    /// Wire encoding with an optional entity id.
    pub fn payload(&self, entity_id: Option<i64>) -> String {
        match entity_id {
            Some(id) => format!("{}:{}", self.key(), id),
            None => self.key().to_string(),
        }
    }
}

pub const ALL_ACTIONS: [Action; 35] = [
    Action::HomePage,
    Action::TasksMenu,
    Action::HabitsMenu,
    Action::NotificationToggle,
    Action::TasksCreateNew,
    Action::TasksChangeTitle,
    Action::TasksChangeDescription,
    Action::TasksChangeDeadline,
    Action::TasksCreateConfirm,
    Action::TasksGetToday,
    Action::TasksGetTomorrow,
    Action::TasksGetWeek,
    Action::TasksGetAll,
    Action::TasksPick,
    Action::TasksSetUncompleted,
    Action::TasksSetInProgress,
    Action::TasksSetCompleted,
    Action::TasksDelete,
    Action::HabitsCreateNew,
    Action::HabitsChangeTitle,
    Action::HabitsChangeDescription,
    Action::HabitsChangeInterval,
    Action::HabitsChangeGoalDate,
    Action::HabitsCreateConfirm,
    Action::HabitsGetAll,
    Action::HabitsGetToday,
    Action::HabitsGetWeek,
    Action::HabitsStreaks,
    Action::HabitsPick,
    Action::HabitsSetCompleted,
    Action::HabitsSetArchived,
    Action::HabitsSetPaused,
    Action::HabitsSetInProgress,
    Action::HabitsMarkCompleted,
    Action::HabitsMarkUncompleted,
];

/// Split a callback payload into action key and optional entity id.
///
/// A missing colon, a trailing colon, or a non-numeric id all yield
/// `None` for the id.
pub fn split_payload(payload: &str) -> (&str, Option<i64>) {
    match payload.split_once(':') {
        Some((key, id)) => (key, id.parse().ok()),
        None => (payload, None),
    }
}

// MAX Bot API update envelope, trimmed to the fields we read.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_type: String,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback: Option<Callback>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub body: Option<MessageBody>,
    #[serde(default)]
    pub recipient: Option<Recipient>,
    #[serde(default)]
    pub sender: Option<Sender>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub mid: Option<String>,
    #[serde(default)]
    pub seq: Option<i64>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub chat_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sender {
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Callback {
    #[serde(default)]
    pub payload: Option<String>,
    #[serde(default)]
    pub user: Option<Sender>,
    #[serde(default)]
    pub message: Option<Message>,
}

/// Classify a raw update payload. Total: never fails.
pub fn classify(raw: &str) -> InboundEvent {
    let update: Update = match serde_json::from_str(raw) {
        Ok(u) => u,
        Err(err) => {
            tracing::warn!("Unparseable update payload: {err}");
            return InboundEvent::Unrecognized;
        }
    };

    match update.update_type.as_str() {
        "message_created" => classify_message(update.message),
        "message_callback" => classify_callback(update.callback),
        other => {
            tracing::debug!("Ignoring update type {other}");
            InboundEvent::Unrecognized
        }
    }
}

fn classify_message(message: Option<Message>) -> InboundEvent {
    let Some(message) = message else {
        return InboundEvent::Unrecognized;
    };
    let Some(chat_id) = message.recipient.map(|r| r.chat_id) else {
        return InboundEvent::Unrecognized;
    };
    let Some(user_id) = message.sender.map(|s| s.user_id) else {
        return InboundEvent::Unrecognized;
    };
    let text = message
        .body
        .and_then(|b| b.text)
        .unwrap_or_default()
        .trim()
        .to_string();
    if text.is_empty() {
        return InboundEvent::Unrecognized;
    }

    if let Some(name) = text.strip_prefix('/') {
        // Command names match regardless of case.
        let name = name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        return InboundEvent::Command {
            name,
            chat_id,
            user_id,
        };
    }

    InboundEvent::FreeText {
        text,
        chat_id,
        user_id,
    }
}

fn classify_callback(callback: Option<Callback>) -> InboundEvent {
    let Some(callback) = callback else {
        return InboundEvent::Unrecognized;
    };
    let Some(payload) = callback.payload else {
        return InboundEvent::Unrecognized;
    };
    let Some(user_id) = callback.user.map(|u| u.user_id) else {
        return InboundEvent::Unrecognized;
    };
    let Some(chat_id) = callback
        .message
        .and_then(|m| m.recipient)
        .map(|r| r.chat_id)
    else {
        return InboundEvent::Unrecognized;
    };

    let (key, entity_id) = split_payload(&payload);
    let Some(action) = Action::parse_key(key) else {
        tracing::warn!("Unknown callback action: {key}");
        return InboundEvent::Unrecognized;
    };

    InboundEvent::Callback {
        action,
        entity_id,
        chat_id,
        user_id,
    }
}
