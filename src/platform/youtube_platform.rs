//! YouTube live detection via the Data API v3 with an HTML fallback.

use async_trait::async_trait;
use log::debug;
use log::warn;
use serde_json::Value;
use url::Url;

use crate::platform::BasePlatform;
use crate::platform::Platform;
use crate::platform::PlatformId;
use crate::platform::PlatformInfo;
use crate::platform::api_error_message;
use crate::platform::contains_any;
use crate::platform::error::PlatformError;
use crate::platform::slug::extract_youtube_channel;

const PAGE_MARKERS: [&str; 3] = [
    r#""liveBroadcastContent":"live""#,
    "isLiveBroadcast",
    "ЭФИР",
];

pub struct YouTubePlatform {
    pub base: BasePlatform,
    api_key: Option<String>,
}

impl YouTubePlatform {
    pub fn new(api_key: Option<String>) -> Result<Self, PlatformError> {
        let info = PlatformInfo {
            id: PlatformId::YouTube,
            name: "YouTube".to_string(),
            icon: "🔴".to_string(),
            api_url: "https://www.googleapis.com/youtube/v3".to_string(),
            web_url: "https://www.youtube.com".to_string(),
        };

        Ok(Self {
            // Search costs 100 quota units, keep well under the daily budget.
            base: BasePlatform::new(info, 30)?,
            api_key,
        })
    }

    async fn get_json(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value, PlatformError> {
        let url = Url::parse_with_params(
            &format!("{}/{endpoint}", self.base.info.api_url),
            params,
        )?;
        let resp = self
            .base
            .send_get_json(self.base.client().get(url.as_str()))
            .await?;
        if let Some(message) = api_error_message(&resp) {
            return Err(PlatformError::ApiError { message });
        }
        Ok(resp)
    }

    /// Resolves a handle or legacy username to a channel id.
    async fn resolve_channel_id(&self, channel: &str, key: &str) -> Result<String, PlatformError> {
        if is_channel_id(channel) {
            return Ok(channel.to_string());
        }

        let lookup = if channel.starts_with('@') {
            ("forHandle", channel)
        } else {
            ("forUsername", channel)
        };
        let resp = self
            .get_json("channels", &[("part", "id"), lookup, ("key", key)])
            .await?;

        let id = first_channel_id(&resp).ok_or_else(|| PlatformError::MissingField {
            field: "items.0.id".to_string(),
        })?;
        debug!("Resolved YouTube channel `{channel}` to `{id}`.");
        Ok(id)
    }

    async fn check_api(&self, channel: &str, key: &str) -> Result<bool, PlatformError> {
        let channel_id = self.resolve_channel_id(channel, key).await?;
        let resp = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", channel_id.as_str()),
                    ("eventType", "live"),
                    ("type", "video"),
                    ("key", key),
                ],
            )
            .await?;
        Ok(search_is_live(&resp))
    }
}

/// Normalizes a `search?eventType=live` response: any item means live.
pub fn search_is_live(resp: &Value) -> bool {
    resp.get("items")
        .and_then(|i| i.as_array())
        .is_some_and(|items| !items.is_empty())
}

/// Channel ids are `UC` followed by 22 base64url characters. Anything else
/// is a handle or a legacy username, even when it happens to start with `UC`.
pub fn is_channel_id(channel: &str) -> bool {
    channel.len() == 24
        && channel.starts_with("UC")
        && channel
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn first_channel_id(resp: &Value) -> Option<String> {
    resp.get("items")?
        .as_array()?
        .first()?
        .get("id")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// The `/live` page of a channel, which redirects to the current broadcast.
pub fn live_page_url(source_url: &str) -> String {
    let trimmed = source_url.trim().trim_end_matches('/');
    if trimmed.ends_with("/live") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/live")
    }
}

#[async_trait]
impl Platform for YouTubePlatform {
    async fn check_live(&self, source_url: &str) -> Result<bool, PlatformError> {
        if source_url.trim().is_empty() {
            return Ok(false);
        }

        if let Some(key) = &self.api_key {
            let channel = extract_youtube_channel(source_url);
            if !channel.is_empty() {
                match self.check_api(&channel, key).await {
                    Ok(live) => return Ok(live),
                    Err(e) => {
                        warn!("YouTube API failed for `{channel}`: {e}. Falling back to HTML.")
                    }
                }
            }
        }

        let page = self.base.fetch_page(&live_page_url(source_url)).await?;
        Ok(contains_any(&page, &PAGE_MARKERS))
    }

    fn get_base(&self) -> &BasePlatform {
        &self.base
    }
}
