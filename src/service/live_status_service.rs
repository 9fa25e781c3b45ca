//! Polling of creators and edge detection against the stored live state.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use log::debug;
use log::error;

use crate::entity::Creator;
use crate::platform::PlatformId;
use crate::platform::platforms::Platforms;
use crate::repository::Repository;
use crate::service::error::ServiceError;

/// Result of checking one platform for one creator in the current cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformObservation {
    pub platform_id: PlatformId,
    pub icon: String,
    pub name: String,
    pub is_live: bool,
    pub source_url: String,
}

/// Outcome of writing one cycle of observations for a creator.
#[derive(Debug, Default)]
pub struct AppliedObservations {
    /// Observations that went from not live to live.
    pub rising: Vec<PlatformObservation>,
    /// Platforms whose stored state could not be read or written.
    pub failed: Vec<(PlatformId, ServiceError)>,
}

/// Service that turns detector readings into rising edges.
pub struct LiveStatusService {
    pub repo: Arc<Repository>,
    pub platforms: Arc<Platforms>,
}

impl LiveStatusService {
    pub fn new(repo: Arc<Repository>, platforms: Arc<Platforms>) -> Self {
        Self { repo, platforms }
    }

    /// Runs every detector the creator has a profile URL for.
    ///
    /// Platforms are checked one after another in [`PlatformId`] order. A
    /// detector that errors or panics is logged and observed as not live;
    /// it never prevents the remaining platforms from being checked.
    pub async fn poll_creator(&self, creator: &Creator) -> Vec<PlatformObservation> {
        let mut observations = Vec::new();

        for platform_id in PlatformId::ALL {
            let Some(url) = creator.url_for(platform_id) else {
                continue;
            };
            let Some(platform) = self.platforms.get(platform_id) else {
                debug!("No detector registered for {platform_id}. Skipping {}.", creator.id);
                continue;
            };

            let is_live = match AssertUnwindSafe(platform.check_live(url))
                .catch_unwind()
                .await
            {
                Ok(Ok(live)) => live,
                Ok(Err(e)) => {
                    error!("Failed to check {platform_id} for {}: {e}", creator.id);
                    false
                }
                Err(_) => {
                    error!("Detector {platform_id} panicked while checking {}", creator.id);
                    false
                }
            };

            let info = platform.info();
            observations.push(PlatformObservation {
                platform_id,
                icon: info.icon.clone(),
                name: info.name.clone(),
                is_live,
                source_url: url.to_string(),
            });
        }

        observations
    }

    /// Compares observations with the stored state and persists them.
    ///
    /// Every observation is written back, falling edges and failed readings
    /// included. A storage error on one platform is recorded in
    /// [`AppliedObservations::failed`] and the remaining platforms are still
    /// processed, so edges detected earlier in the batch are never dropped.
    /// A pair whose stored state cannot be read is left untouched until the
    /// next cycle. A rising edge whose write fails is still reported.
    pub async fn apply_observations(
        &self,
        creator: &Creator,
        observations: &[PlatformObservation],
    ) -> AppliedObservations {
        let mut applied = AppliedObservations::default();

        for observation in observations {
            let platform_id = observation.platform_id.as_str();
            let was_live = match self.repo.live_state.get_live(&creator.id, platform_id).await {
                Ok(was_live) => was_live,
                Err(e) => {
                    applied.failed.push((observation.platform_id, e.into()));
                    continue;
                }
            };

            if observation.is_live && !was_live {
                applied.rising.push(observation.clone());
            }
            if let Err(e) = self
                .repo
                .live_state
                .set_live(&creator.id, platform_id, observation.is_live)
                .await
            {
                applied.failed.push((observation.platform_id, e.into()));
            }
        }

        applied
    }

    /// Polls a creator and applies the observations in one step.
    pub async fn check_creator(&self, creator: &Creator) -> AppliedObservations {
        let observations = self.poll_creator(creator).await;
        debug!(
            "{}: {}",
            creator.id,
            observations
                .iter()
                .map(|o| format!("{}={}", o.platform_id, o.is_live))
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.apply_observations(creator, &observations).await
    }
}
