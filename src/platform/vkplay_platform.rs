//! VK Play Live (live.vkvideo.ru) detection.

use async_trait::async_trait;
use log::warn;
use serde_json::Value;

use crate::platform::BasePlatform;
use crate::platform::Platform;
use crate::platform::PlatformId;
use crate::platform::PlatformInfo;
use crate::platform::contains_any;
use crate::platform::error::PlatformError;
use crate::platform::is_truthy;
use crate::platform::slug::extract_slug;

const PAGE_MARKERS: [&str; 2] = ["StreamStatus_isOnline", r#""isOnline":true"#];

pub struct VkPlayPlatform {
    pub base: BasePlatform,
}

impl VkPlayPlatform {
    pub fn new() -> Result<Self, PlatformError> {
        let info = PlatformInfo {
            id: PlatformId::VkPlay,
            name: "VK Play Live".to_string(),
            icon: "🔵".to_string(),
            api_url: "https://api.vkplay.live/v1".to_string(),
            web_url: "https://live.vkvideo.ru".to_string(),
        };

        Ok(Self {
            base: BasePlatform::new(info, 60)?,
        })
    }

    async fn check_api(&self, login: &str) -> Result<bool, PlatformError> {
        let request = self.base.client().get(format!(
            "{}/blog/{login}/public_video_stream",
            self.base.info.api_url
        ));
        let resp = self.base.send_get_json(request).await?;
        Ok(stream_is_live(&resp))
    }
}

/// Normalizes a `public_video_stream` response.
///
/// The endpoint answers either `{"data": {"isOnline": ..}}` or a list whose
/// items carry `isOnline` directly or under `data`.
pub fn stream_is_live(resp: &Value) -> bool {
    match resp {
        Value::Array(items) => items.iter().any(|item| {
            item.is_object()
                && (is_truthy(item.get("isOnline"))
                    || is_truthy(item.get("data").and_then(|d| d.get("isOnline"))))
        }),
        Value::Object(_) => {
            is_truthy(resp.get("data").and_then(|d| d.get("isOnline")))
                || is_truthy(resp.get("isOnline"))
        }
        _ => false,
    }
}

#[async_trait]
impl Platform for VkPlayPlatform {
    async fn check_live(&self, source_url: &str) -> Result<bool, PlatformError> {
        let login = extract_slug(source_url);
        if login.is_empty() {
            return Ok(false);
        }

        match self.check_api(&login).await {
            Ok(live) => return Ok(live),
            Err(e) => warn!("VK Play API failed for `{login}`: {e}. Falling back to HTML."),
        }

        let page = self.base.fetch_page(source_url).await?;
        Ok(contains_any(&page, &PAGE_MARKERS))
    }

    fn get_base(&self) -> &BasePlatform {
        &self.base
    }
}
