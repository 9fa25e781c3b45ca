//! User to creator subscription management.

use std::sync::Arc;

use crate::entity::Creator;
use crate::repository::Repository;
use crate::service::error::ServiceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscribeResult {
    /// Successfully subscribed to the creator
    Success,
    /// Already subscribed to the creator
    AlreadySubscribed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnsubscribeResult {
    /// Successfully unsubscribed from the creator
    Success,
    /// Was not subscribed to the creator
    AlreadyUnsubscribed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleResult {
    Subscribed,
    Unsubscribed,
}

/// Service for managing which users follow which creators.
pub struct SubscriptionService {
    pub repo: Arc<Repository>,
    creators: Arc<[Creator]>,
}

impl SubscriptionService {
    pub fn new(repo: Arc<Repository>, creators: Arc<[Creator]>) -> Self {
        Self { repo, creators }
    }

    /// Configured creators, in configuration order.
    pub fn creators(&self) -> &[Creator] {
        &self.creators
    }

    pub fn get_creator(&self, creator_id: &str) -> Result<&Creator, ServiceError> {
        self.creators
            .iter()
            .find(|c| c.id == creator_id)
            .ok_or_else(|| ServiceError::UnknownCreator {
                creator_id: creator_id.to_string(),
            })
    }

    pub async fn subscribe(&self, user_id: i64, creator_id: &str) -> Result<SubscribeResult, ServiceError> {
        self.get_creator(creator_id)?;
        if self.repo.subscription.insert_or_ignore(user_id, creator_id).await? {
            Ok(SubscribeResult::Success)
        } else {
            Ok(SubscribeResult::AlreadySubscribed)
        }
    }

    /// Removing a missing subscription is a no-op, even for unknown creators.
    pub async fn unsubscribe(&self, user_id: i64, creator_id: &str) -> Result<UnsubscribeResult, ServiceError> {
        if self.repo.subscription.delete(user_id, creator_id).await? {
            Ok(UnsubscribeResult::Success)
        } else {
            Ok(UnsubscribeResult::AlreadyUnsubscribed)
        }
    }

    /// Flips the subscription of a user to a configured creator.
    pub async fn toggle(&self, user_id: i64, creator_id: &str) -> Result<ToggleResult, ServiceError> {
        if self.is_subscribed(user_id, creator_id).await? {
            self.unsubscribe(user_id, creator_id).await?;
            Ok(ToggleResult::Unsubscribed)
        } else {
            self.subscribe(user_id, creator_id).await?;
            Ok(ToggleResult::Subscribed)
        }
    }

    /// Returns the number of removed subscriptions.
    pub async fn unsubscribe_all(&self, user_id: i64) -> Result<u64, ServiceError> {
        Ok(self.repo.subscription.delete_all_by_user(user_id).await?)
    }

    pub async fn is_subscribed(&self, user_id: i64, creator_id: &str) -> Result<bool, ServiceError> {
        Ok(self.repo.subscription.exists(user_id, creator_id).await?)
    }

    /// Current subscribers of a creator, read from storage on every call.
    pub async fn subscribers_of(&self, creator_id: &str) -> Result<Vec<i64>, ServiceError> {
        Ok(self.repo.subscription.select_user_ids_by_creator(creator_id).await?)
    }

    pub async fn subscriptions_of(&self, user_id: i64) -> Result<Vec<String>, ServiceError> {
        Ok(self.repo.subscription.select_creator_ids_by_user(user_id).await?)
    }

    /// Configured creators the user follows, in configuration order.
    pub async fn subscribed_creators(&self, user_id: i64) -> Result<Vec<&Creator>, ServiceError> {
        let ids = self.subscriptions_of(user_id).await?;
        Ok(self
            .creators
            .iter()
            .filter(|c| ids.contains(&c.id))
            .collect())
    }
}
