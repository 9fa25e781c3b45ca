//! Parsing of user messages into bot commands.

use serde_json::Value;

/// A request from a user, decoded from a button payload or typed text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show the welcome text and the keyboard.
    Start,
    /// Flip the subscription to one creator.
    Toggle { creator_id: String },
    /// List the creators the user follows.
    MySubscriptions,
    /// Drop every subscription of the user.
    UnsubscribeAll,
    /// Anything else.
    Unknown,
}

impl Command {
    /// Button payloads take precedence over the message text.
    pub fn parse(text: &str, payload: Option<&Value>) -> Self {
        if let Some(command) = payload.and_then(Self::from_payload) {
            return command;
        }

        match text.trim().to_lowercase().as_str() {
            "/start" | "start" | "начать" | "привет" => Command::Start,
            "/list" | "мои подписки" => Command::MySubscriptions,
            "/stop" | "stop" | "отписаться" => Command::UnsubscribeAll,
            _ => Command::Unknown,
        }
    }

    fn from_payload(payload: &Value) -> Option<Self> {
        let command = match payload.get("cmd").and_then(|c| c.as_str()) {
            Some("toggle") => Command::Toggle {
                creator_id: payload.get("sid")?.as_str()?.to_string(),
            },
            Some("mysubs") => Command::MySubscriptions,
            Some("unsub_all") => Command::UnsubscribeAll,
            // VK's own "Start" button sends {"command": "start"}.
            _ if payload.get("command").and_then(|c| c.as_str()) == Some("start") => Command::Start,
            _ => return None,
        };
        Some(command)
    }
}
