//! Collaborator seams.

use async_trait::async_trait;

use crate::error::StrideError;
use crate::message::{OutboundMessage, SentMessage};
use crate::model::ParsedTask;

/// Outbound messaging channel.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a new message to a chat.
    async fn send(&self, chat_id: i64, body: OutboundMessage)
        -> Result<SentMessage, StrideError>;

    /// Replace the body of an already-sent message.
    async fn edit(&self, message_id: &str, body: OutboundMessage) -> Result<(), StrideError>;
}

/// Free-text understanding collaborator.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Pull structured task fields out of a free-text description.
    async fn extract_task(&self, text: &str) -> Result<ParsedTask, StrideError>;

    /// Short motivational line for a given streak length.
    async fn motivation(&self, streak: u32) -> Result<String, StrideError>;
}
