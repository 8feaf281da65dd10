//! Outbound message types.

use serde::{Deserialize, Serialize};

/// A message to send or edit, with an optional inline keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<Keyboard>,
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Rows of callback buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Keyboard {
    pub buttons: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn builder() -> KeyboardBuilder {
        KeyboardBuilder::default()
    }
}

/// A single callback button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub payload: String,
}

impl Button {
    pub fn callback(text: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            kind: "callback".to_string(),
            text: text.into(),
            payload: payload.into(),
        }
    }
}

/// Row-by-row keyboard assembly.
#[derive(Debug, Default)]
pub struct KeyboardBuilder {
    rows: Vec<Vec<Button>>,
    current: Vec<Button>,
}

impl KeyboardBuilder {
    /// Append a button to the current row.
    pub fn button(mut self, text: impl Into<String>, payload: impl Into<String>) -> Self {
        self.current.push(Button::callback(text, payload));
        self
    }

    /// Close the current row.
    pub fn row(mut self) -> Self {
        if !self.current.is_empty() {
            self.rows.push(std::mem::take(&mut self.current));
        }
        self
    }

    pub fn build(mut self) -> Keyboard {
        if !self.current.is_empty() {
            self.rows.push(self.current);
        }
        Keyboard { buttons: self.rows }
    }
}

/// Identity of a message the channel accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub message_id: String,
    pub seq: i64,
}
