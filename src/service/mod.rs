use std::sync::Arc;

use crate::entity::Creator;
use crate::platform::platforms::Platforms;
use crate::repository::Repository;
use crate::service::live_status_service::LiveStatusService;
use crate::service::subscription_service::SubscriptionService;

pub mod error;
pub mod live_status_service;
pub mod subscription_service;

pub struct Services {
    pub live_status: Arc<LiveStatusService>,
    pub subscription: Arc<SubscriptionService>,
}

impl Services {
    pub fn new(repo: Arc<Repository>, platforms: Arc<Platforms>, creators: Arc<[Creator]>) -> Self {
        Self {
            live_status: Arc::new(LiveStatusService::new(repo.clone(), platforms)),
            subscription: Arc::new(SubscriptionService::new(repo, creators)),
        }
    }
}
