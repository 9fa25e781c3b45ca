//! Kick live detection via the public channel API with an HTML fallback.

use async_trait::async_trait;
use log::warn;
use serde_json::Value;

use crate::platform::BasePlatform;
use crate::platform::Platform;
use crate::platform::PlatformId;
use crate::platform::PlatformInfo;
use crate::platform::error::PlatformError;
use crate::platform::is_truthy;
use crate::platform::slug::extract_slug;

/// Both markers must be present on the channel page.
const PAGE_MARKERS: [&str; 2] = ["bg-green-500", "LIVE"];

pub struct KickPlatform {
    pub base: BasePlatform,
}

impl KickPlatform {
    pub fn new() -> Result<Self, PlatformError> {
        let info = PlatformInfo {
            id: PlatformId::Kick,
            name: "Kick".to_string(),
            icon: "🟢".to_string(),
            api_url: "https://kick.com/api/v1".to_string(),
            web_url: "https://kick.com".to_string(),
        };

        Ok(Self {
            base: BasePlatform::new(info, 60)?,
        })
    }

    async fn check_api(&self, login: &str) -> Result<bool, PlatformError> {
        let request = self
            .base
            .client()
            .get(format!("{}/channels/{login}", self.base.info.api_url));
        let resp = self.base.send_get_json(request).await?;
        Ok(channel_is_live(&resp))
    }
}

/// Normalizes a channel response.
///
/// `livestream` is an object while live and `null` otherwise. Some edge
/// nodes wrap the channel in an array, and newer payloads carry an explicit
/// `is_live` flag inside the livestream object.
pub fn channel_is_live(resp: &Value) -> bool {
    match resp {
        Value::Array(channels) => channels.iter().any(channel_is_live),
        Value::Object(channel) => match channel.get("livestream") {
            Some(Value::Object(stream)) => match stream.get("is_live") {
                Some(flag) => is_truthy(Some(flag)),
                None => !stream.is_empty(),
            },
            Some(Value::Bool(live)) => *live,
            _ => false,
        },
        _ => false,
    }
}

#[async_trait]
impl Platform for KickPlatform {
    async fn check_live(&self, source_url: &str) -> Result<bool, PlatformError> {
        let login = extract_slug(source_url);
        if login.is_empty() {
            return Ok(false);
        }

        match self.check_api(&login).await {
            Ok(live) => return Ok(live),
            Err(e) => warn!("Kick API failed for `{login}`: {e}. Falling back to HTML."),
        }

        let page = self.base.fetch_page(source_url).await?;
        Ok(PAGE_MARKERS.iter().all(|m| page.contains(m)))
    }

    fn get_base(&self) -> &BasePlatform {
        &self.base
    }
}
