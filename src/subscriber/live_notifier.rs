use std::sync::Arc;

use anyhow::Result;
use log::error;
use log::info;

use super::Subscriber;
use crate::event::StreamLiveEvent;
use crate::messenger::Messenger;
use crate::service::subscription_service::SubscriptionService;
use crate::template::Templates;

/// Outcome of delivering one live notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Sends a live notification to every subscriber of the creator.
pub struct LiveNotifier {
    subscription: Arc<SubscriptionService>,
    messenger: Arc<dyn Messenger>,
    templates: Arc<Templates>,
}

impl LiveNotifier {
    pub fn new(
        subscription: Arc<SubscriptionService>,
        messenger: Arc<dyn Messenger>,
        templates: Arc<Templates>,
    ) -> Self {
        info!("Initializing LiveNotifier.");
        Self {
            subscription,
            messenger,
            templates,
        }
    }

    /// Renders the message once and sends it to each subscriber in turn.
    ///
    /// The subscriber list is read once before the first send, so changes
    /// made while sending only affect later notifications. A failed send is
    /// logged and skipped.
    pub async fn notify(&self, event: &StreamLiveEvent) -> Result<DispatchReport> {
        let creator = &event.creator;
        let observation = &event.observation;

        let text = self.templates.live(creator, observation)?;
        let users = self.subscription.subscribers_of(&creator.id).await?;
        info!(
            "LIVE {}/{} -> {} users",
            creator.id,
            observation.platform_id,
            users.len()
        );

        let mut report = DispatchReport::default();
        for user_id in users {
            match self.messenger.send(user_id, &text, None).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    error!("Failed to notify user {user_id} about {}: {e}", creator.id);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}

#[async_trait::async_trait]
impl Subscriber<StreamLiveEvent> for LiveNotifier {
    async fn callback(&self, event: StreamLiveEvent) -> Result<()> {
        self.notify(&event).await?;
        Ok(())
    }
}
