//! Public VK community walls.
//!
//! With a service key the latest posts come from `wall.get`; without one
//! (or when the API refuses) the mobile wall page is scraped instead.

use std::sync::LazyLock;

use async_trait::async_trait;
use log::debug;
use log::warn;
use scraper::Html;
use scraper::Selector;
use serde_json::Value;
use url::Url;

use crate::platform::BasePlatform;
use crate::platform::POST_WINDOW;
use crate::platform::Platform;
use crate::platform::PlatformId;
use crate::platform::PlatformInfo;
use crate::platform::api_error_message;
use crate::platform::classifier::ContentClassifier;
use crate::platform::classifier::FeedPost;
use crate::platform::classifier::extract_links;
use crate::platform::error::PlatformError;
use crate::platform::slug::extract_slug;

pub const VK_API_VERSION: &str = "5.199";

static WALL_POST_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".wall_item").expect("wall selector is valid"));
static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector is valid"));

pub struct VkGroupPlatform {
    pub base: BasePlatform,
    service_token: Option<String>,
    classifier: ContentClassifier,
}

impl VkGroupPlatform {
    pub fn new(
        service_token: Option<String>,
        classifier: ContentClassifier,
    ) -> Result<Self, PlatformError> {
        let info = PlatformInfo {
            id: PlatformId::VkGroup,
            name: "ВКонтакте".to_string(),
            icon: "💙".to_string(),
            api_url: "https://api.vk.com/method".to_string(),
            web_url: "https://m.vk.com".to_string(),
        };

        Ok(Self {
            // VK allows 3 requests per second per token.
            base: BasePlatform::new(info, 180)?,
            service_token,
            classifier,
        })
    }

    async fn fetch_api_posts(&self, domain: &str, token: &str) -> Result<Vec<FeedPost>, PlatformError> {
        let count = POST_WINDOW.to_string();
        let url = Url::parse_with_params(
            &format!("{}/wall.get", self.base.info.api_url),
            &[
                ("domain", domain),
                ("count", count.as_str()),
                ("access_token", token),
                ("v", VK_API_VERSION),
            ],
        )?;
        let resp = self
            .base
            .send_get_json(self.base.client().get(url.as_str()))
            .await?;
        if let Some(message) = api_error_message(&resp) {
            return Err(PlatformError::ApiError { message });
        }
        Ok(wall_posts(&resp))
    }

    async fn fetch_page_posts(&self, domain: &str) -> Result<Vec<FeedPost>, PlatformError> {
        let page = self
            .base
            .fetch_page(&format!("{}/{domain}", self.base.info.web_url))
            .await?;
        Ok(parse_wall_page(&page, POST_WINDOW))
    }
}

/// Converts a `wall.get` response into posts.
///
/// Each post contributes its text, the URLs of `link` attachments and any
/// links written inline in the text. Unexpected shapes yield no posts.
pub fn wall_posts(resp: &Value) -> Vec<FeedPost> {
    let Some(items) = resp
        .get("response")
        .and_then(|r| r.get("items"))
        .and_then(|i| i.as_array())
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| item.is_object())
        .take(POST_WINDOW)
        .map(|item| {
            let text = item
                .get("text")
                .and_then(|t| t.as_str())
                .unwrap_or_default()
                .to_string();

            let mut links: Vec<String> = item
                .get("attachments")
                .and_then(|a| a.as_array())
                .map(|attachments| {
                    attachments
                        .iter()
                        .filter(|a| a.get("type").and_then(|t| t.as_str()) == Some("link"))
                        .filter_map(|a| a.get("link")?.get("url")?.as_str())
                        .map(|url| url.to_string())
                        .collect()
                })
                .unwrap_or_default();
            links.extend(extract_links(&text));

            FeedPost { text, links }
        })
        .collect()
}

/// Extracts the first `limit` posts of a mobile wall page.
pub fn parse_wall_page(html: &str, limit: usize) -> Vec<FeedPost> {
    let document = Html::parse_document(html);
    document
        .select(&WALL_POST_SELECTOR)
        .take(limit)
        .map(|post| {
            let text = post
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let mut links: Vec<String> = post
                .select(&LINK_SELECTOR)
                .filter_map(|a| a.value().attr("href"))
                .map(|href| href.to_string())
                .collect();
            links.extend(extract_links(&text));
            FeedPost { text, links }
        })
        .collect()
}

#[async_trait]
impl Platform for VkGroupPlatform {
    async fn check_live(&self, source_url: &str) -> Result<bool, PlatformError> {
        let domain = extract_slug(source_url);
        if domain.is_empty() {
            return Ok(false);
        }

        if let Some(token) = &self.service_token {
            match self.fetch_api_posts(&domain, token).await {
                Ok(posts) => return Ok(self.classifier.any_stream_post(&posts)),
                Err(e) => warn!("VK wall.get failed for `{domain}`: {e}. Falling back to HTML."),
            }
        }

        let posts = self.fetch_page_posts(&domain).await?;
        debug!("VK wall `{domain}`: inspecting {} posts.", posts.len());
        Ok(self.classifier.any_stream_post(&posts))
    }

    fn get_base(&self) -> &BasePlatform {
        &self.base
    }
}
