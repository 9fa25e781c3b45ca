//! Messaging transport: outgoing messages and incoming user commands.

use async_trait::async_trait;
use serde_json::Value;

use crate::messenger::error::MessengerError;

pub mod error;
pub mod vk_messenger;

/// A private message a user sent to the bot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IncomingMessage {
    pub user_id: i64,
    pub text: String,
    /// Decoded button payload, if the message came from a keyboard button.
    pub payload: Option<Value>,
}

/// Sends text messages to users.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends one message. `keyboard` is a serialized keyboard to attach.
    async fn send(&self, user_id: i64, text: &str, keyboard: Option<&str>) -> Result<(), MessengerError>;
}

/// Yields batches of incoming messages, blocking until some arrive or the
/// transport's own wait expires.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn next_messages(&self) -> Result<Vec<IncomingMessage>, MessengerError>;
}
