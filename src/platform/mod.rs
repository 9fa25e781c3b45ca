//! Live-status detectors for the supported streaming and social platforms.
//!
//! Every platform answers one question for a creator's public profile URL:
//! is this creator live right now? Detectors first try the platform's
//! structured API (when credentials are configured) and fall back to
//! scanning the public page for markers that only appear during a broadcast.
//! The two feed-style platforms (Telegram channels and VK community walls)
//! instead classify the latest posts with [`classifier::ContentClassifier`].

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use governor::Quota;
use governor::RateLimiter;
use governor::clock::QuantaClock;
use governor::state::InMemoryState;
use governor::state::direct::NotKeyed;
use log::debug;
use log::info;
use serde_json::Value;
use wreq::header::ACCEPT;
use wreq::header::ACCEPT_LANGUAGE;
use wreq::header::HeaderMap;
use wreq::header::HeaderValue;

use crate::platform::error::PlatformError;

pub mod classifier;
pub mod error;
pub mod kick_platform;
pub mod platforms;
pub mod slug;
pub mod telegram_platform;
pub mod twitch_platform;
pub mod vk_group_platform;
pub mod vkplay_platform;
pub mod youtube_platform;

/// Upper bound for a single outbound request, connect included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Number of latest posts inspected on feed-style platforms.
pub const POST_WINDOW: usize = 5;

/// The fixed set of supported platforms, in polling order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlatformId {
    Twitch,
    YouTube,
    Kick,
    VkPlay,
    Telegram,
    VkGroup,
}

impl PlatformId {
    pub const ALL: [PlatformId; 6] = [
        PlatformId::Twitch,
        PlatformId::YouTube,
        PlatformId::Kick,
        PlatformId::VkPlay,
        PlatformId::Telegram,
        PlatformId::VkGroup,
    ];

    /// Key used in persisted state rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformId::Twitch => "twitch",
            PlatformId::YouTube => "youtube",
            PlatformId::Kick => "kick",
            PlatformId::VkPlay => "vkplay",
            PlatformId::Telegram => "telegram",
            PlatformId::VkGroup => "vk_group",
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformId::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown platform `{s}`"))
    }
}

/// Static description of a platform plus the endpoints it talks to.
///
/// `api_url` and `web_url` are plain fields so tests can point a detector at
/// a mock server.
#[derive(Clone, Debug)]
pub struct PlatformInfo {
    pub id: PlatformId,
    /// Human readable name, e.g. "Twitch".
    pub name: String,
    /// Emoji shown next to the name in notifications.
    pub icon: String,
    /// Base of the structured API, e.g. "https://api.twitch.tv".
    pub api_url: String,
    /// Base of the public website, e.g. "https://t.me".
    pub web_url: String,
}

/// Shared HTTP plumbing for every detector: one client and one rate limiter.
pub struct BasePlatform {
    pub info: PlatformInfo,
    client: wreq::Client,
    limiter: RateLimiter<NotKeyed, InMemoryState, QuantaClock>,
}

impl BasePlatform {
    pub fn new(info: PlatformInfo, requests_per_minute: u32) -> Result<Self, PlatformError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ru-RU,ru;q=0.9"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );

        let client = wreq::Client::builder()
            .emulation(wreq_util::Emulation::Chrome137)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PlatformError::ClientBuild {
                message: e.to_string(),
            })?;

        let quota = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let limiter = RateLimiter::direct(Quota::per_minute(quota));

        Ok(Self {
            info,
            client,
            limiter,
        })
    }

    pub fn client(&self) -> &wreq::Client {
        &self.client
    }

    pub async fn send(&self, request: wreq::RequestBuilder) -> Result<wreq::Response, wreq::Error> {
        if self.limiter.check().is_err() {
            info!("Platform {} is ratelimited. Waiting...", self.info.name);
        }
        self.limiter.until_ready().await;

        let req = request.build()?;
        debug!("Making request to: {}", req.url());
        self.client.execute(req).await
    }

    /// Sends the request and returns the body of a successful response.
    pub async fn send_get_text(&self, request: wreq::RequestBuilder) -> Result<String, PlatformError> {
        let response = self.send(request).await?;
        let status = response.status();
        if status == wreq::StatusCode::UNAUTHORIZED {
            return Err(PlatformError::Unauthorized);
        }
        if !status.is_success() {
            return Err(PlatformError::HttpStatus {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(response.text().await?)
    }

    /// Sends the request and parses the body as untyped JSON.
    pub async fn send_get_json(&self, request: wreq::RequestBuilder) -> Result<Value, PlatformError> {
        let body = self.send_get_text(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetches a public page as text.
    pub async fn fetch_page(&self, url: &str) -> Result<String, PlatformError> {
        self.send_get_text(self.client.get(url)).await
    }
}

/// A live-status detector for one platform.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Checks whether the creator behind `source_url` is broadcasting.
    ///
    /// Unknown or malformed responses resolve to `Ok(false)`. An `Err` means
    /// neither tier produced an answer; callers record it as not live.
    async fn check_live(&self, source_url: &str) -> Result<bool, PlatformError>;

    fn get_base(&self) -> &BasePlatform;

    fn info(&self) -> &PlatformInfo {
        &self.get_base().info
    }
}

/// Loose truthiness for flags that APIs return as bools, numbers or strings.
pub(crate) fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true") || s == "1",
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        _ => false,
    }
}

/// True if the page contains at least one of the markers.
pub(crate) fn contains_any(page: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| page.contains(m))
}

/// Extracts an API-level error message from common `{"error": ...}` shapes.
pub(crate) fn api_error_message(resp: &Value) -> Option<String> {
    let error = resp.get("error")?;
    let message = match error {
        Value::String(s) => {
            let detail = resp.get("message").and_then(|v| v.as_str()).unwrap_or_default();
            if detail.is_empty() {
                s.clone()
            } else {
                format!("{s}: {detail}")
            }
        }
        Value::Object(o) => o
            .get("message")
            .or_else(|| o.get("error_msg"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| error.to_string()),
        Value::Null => return None,
        other => other.to_string(),
    };
    Some(message)
}
