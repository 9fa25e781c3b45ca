//! Inbound command loop: users manage their subscriptions through the bot.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::debug;
use log::error;
use log::info;
use tokio::task::JoinHandle;

use crate::bot::commands::Command;
use crate::bot::keyboard::build_keyboard;
use crate::messenger::IncomingMessage;
use crate::messenger::Messenger;
use crate::messenger::UpdateSource;
use crate::service::subscription_service::SubscriptionService;
use crate::service::subscription_service::ToggleResult;
use crate::template::Templates;

pub mod commands;
pub mod keyboard;

/// Pause before polling again after the transport failed.
const RETRY_DELAY: Duration = Duration::from_secs(5);

pub struct Bot {
    messenger: Arc<dyn Messenger>,
    subscription: Arc<SubscriptionService>,
    templates: Arc<Templates>,
}

impl Bot {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        subscription: Arc<SubscriptionService>,
        templates: Arc<Templates>,
    ) -> Self {
        info!("Initializing Bot.");
        Self {
            messenger,
            subscription,
            templates,
        }
    }

    /// Spawns the loop that reads incoming messages until the process exits.
    pub fn start(self: Arc<Self>, source: Arc<dyn UpdateSource>) -> JoinHandle<()> {
        info!("Starting Bot long poll loop.");
        tokio::spawn(async move {
            loop {
                let messages = match source.next_messages().await {
                    Ok(messages) => messages,
                    Err(e) => {
                        error!("Error receiving messages: {e}");
                        tokio::time::sleep(RETRY_DELAY).await;
                        continue;
                    }
                };
                for message in messages {
                    let user_id = message.user_id;
                    if let Err(e) = self.handle(message).await {
                        error!("Error handling message from user {user_id}: {e:?}");
                    }
                }
            }
        })
    }

    /// Executes one user command and replies with text plus a fresh keyboard.
    pub async fn handle(&self, message: IncomingMessage) -> Result<()> {
        let user_id = message.user_id;
        let command = Command::parse(&message.text, message.payload.as_ref());
        debug!("User {user_id} sent {command:?}");

        let text = match command {
            Command::Toggle { creator_id } => {
                let Ok(creator) = self.subscription.get_creator(&creator_id) else {
                    debug!("Ignoring toggle for unknown creator `{creator_id}`.");
                    return Ok(());
                };
                match self.subscription.toggle(user_id, &creator_id).await? {
                    ToggleResult::Subscribed => self.templates.subscribed(creator)?,
                    ToggleResult::Unsubscribed => self.templates.unsubscribed(creator)?,
                }
            }
            Command::MySubscriptions => {
                let creators = self.subscription.subscribed_creators(user_id).await?;
                self.templates.subscriptions(&creators)?
            }
            Command::UnsubscribeAll => {
                let removed = self.subscription.unsubscribe_all(user_id).await?;
                debug!("Removed {removed} subscriptions of user {user_id}.");
                self.templates.unsubscribed_all()?
            }
            Command::Start => self.templates.welcome()?,
            Command::Unknown => self.templates.help()?,
        };

        let keyboard = self.keyboard_for(user_id).await?;
        self.messenger.send(user_id, &text, Some(&keyboard)).await?;
        Ok(())
    }

    /// Serialized keyboard reflecting the user's current subscriptions.
    pub async fn keyboard_for(&self, user_id: i64) -> Result<String> {
        let subscribed = self.subscription.subscriptions_of(user_id).await?;
        Ok(build_keyboard(self.subscription.creators(), &subscribed).to_string())
    }
}
