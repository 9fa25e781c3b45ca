//! Platform registry and management.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Config;
use crate::platform::Platform;
use crate::platform::PlatformId;
use crate::platform::classifier::ContentClassifier;
use crate::platform::error::PlatformError;
use crate::platform::kick_platform::KickPlatform;
use crate::platform::telegram_platform::TelegramPlatform;
use crate::platform::twitch_platform::TwitchPlatform;
use crate::platform::vk_group_platform::VkGroupPlatform;
use crate::platform::vkplay_platform::VkPlayPlatform;
use crate::platform::youtube_platform::YouTubePlatform;

/// Registry of live detectors keyed by platform.
///
/// Iteration follows [`PlatformId`] order. Registering a detector for an id
/// that already has one replaces it.
#[derive(Default)]
pub struct Platforms {
    platforms: BTreeMap<PlatformId, Arc<dyn Platform>>,
}

impl Platforms {
    /// Creates a registry with every supported detector, configured from
    /// the credentials present in `config`.
    pub fn new(config: &Config) -> Result<Self, PlatformError> {
        let classifier = ContentClassifier::new(&config.classifier);

        let mut platforms = Self::empty();
        platforms
            .add_platform(Arc::new(TwitchPlatform::new(config.twitch.clone())?))
            .add_platform(Arc::new(YouTubePlatform::new(config.youtube_api_key.clone())?))
            .add_platform(Arc::new(KickPlatform::new()?))
            .add_platform(Arc::new(VkPlayPlatform::new()?))
            .add_platform(Arc::new(TelegramPlatform::new(classifier.clone())?))
            .add_platform(Arc::new(VkGroupPlatform::new(
                config.vk.service_token.clone(),
                classifier,
            )?));
        Ok(platforms)
    }

    /// Creates a registry without detectors.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds a detector to the registry under its own platform id.
    pub fn add_platform(&mut self, platform: Arc<dyn Platform>) -> &mut Self {
        self.platforms.insert(platform.info().id, platform);
        self
    }

    pub fn get(&self, id: PlatformId) -> Option<&Arc<dyn Platform>> {
        self.platforms.get(&id)
    }

    /// Returns all registered detectors.
    pub fn get_all_platforms(&self) -> Vec<Arc<dyn Platform>> {
        self.platforms.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}
