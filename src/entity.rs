//! Persisted rows and configured creators.

use serde::Deserialize;
use serde::Serialize;
use sqlx::FromRow;

use crate::platform::PlatformId;

/// A broadcaster that users can subscribe to.
///
/// Loaded from the creators file at startup and never mutated afterwards.
/// A platform without a profile URL is simply not checked for this creator.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq)]
pub struct Creator {
    /// Stable unique key, e.g. "hardplay".
    pub id: String,
    /// Display name used in notifications and keyboard buttons.
    pub name: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub twitch: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub youtube: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub kick: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub vkplay: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub telegram: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub vk_group: Option<String>,
}

impl Creator {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the profile URL for a platform. Empty URLs clear it.
    pub fn with_url(mut self, platform: PlatformId, url: impl Into<String>) -> Self {
        let url = url.into();
        let url = (!url.trim().is_empty()).then_some(url);
        match platform {
            PlatformId::Twitch => self.twitch = url,
            PlatformId::YouTube => self.youtube = url,
            PlatformId::Kick => self.kick = url,
            PlatformId::VkPlay => self.vkplay = url,
            PlatformId::Telegram => self.telegram = url,
            PlatformId::VkGroup => self.vk_group = url,
        }
        self
    }

    /// Returns the configured profile URL for a platform, if any.
    pub fn url_for(&self, platform: PlatformId) -> Option<&str> {
        let url = match platform {
            PlatformId::Twitch => &self.twitch,
            PlatformId::YouTube => &self.youtube,
            PlatformId::Kick => &self.kick,
            PlatformId::VkPlay => &self.vkplay,
            PlatformId::Telegram => &self.telegram,
            PlatformId::VkGroup => &self.vk_group,
        };
        url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Last known live flag of one (creator, platform) pair.
///
/// Rows are created on first observation and overwritten every cycle.
#[derive(FromRow, Serialize, Default, Clone, Debug, PartialEq, Eq)]
pub struct LiveStateModel {
    pub creator_id: String,
    pub platform_id: String,
    pub is_live: bool,
}

/// A user following a creator. Unique per pair.
#[derive(FromRow, Serialize, Default, Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionModel {
    pub user_id: i64,
    pub creator_id: String,
}
