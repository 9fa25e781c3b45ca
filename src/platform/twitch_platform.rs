//! Twitch live detection via Helix with an HTML fallback.

use async_trait::async_trait;
use log::debug;
use log::warn;
use serde_json::Value;
use tokio::sync::Mutex;
use url::Url;

use crate::config::TwitchCredentials;
use crate::platform::BasePlatform;
use crate::platform::Platform;
use crate::platform::PlatformId;
use crate::platform::PlatformInfo;
use crate::platform::api_error_message;
use crate::platform::contains_any;
use crate::platform::error::PlatformError;
use crate::platform::slug::extract_slug;

const PAGE_MARKERS: [&str; 2] = ["isLiveBroadcast", "В ЭФИРЕ"];

/// Twitch detector.
///
/// Owns the app access token obtained through the client-credentials grant.
/// The token is fetched lazily, reused across cycles and dropped as soon as
/// Helix answers 401.
pub struct TwitchPlatform {
    pub base: BasePlatform,
    /// Base of the OAuth endpoint, e.g. "https://id.twitch.tv".
    pub auth_url: String,
    credentials: Option<TwitchCredentials>,
    token: Mutex<Option<String>>,
}

impl TwitchPlatform {
    pub fn new(credentials: Option<TwitchCredentials>) -> Result<Self, PlatformError> {
        let info = PlatformInfo {
            id: PlatformId::Twitch,
            name: "Twitch".to_string(),
            icon: "🟣".to_string(),
            api_url: "https://api.twitch.tv".to_string(),
            web_url: "https://www.twitch.tv".to_string(),
        };

        Ok(Self {
            // Helix allows 800 points per minute per client.
            base: BasePlatform::new(info, 120)?,
            auth_url: "https://id.twitch.tv".to_string(),
            credentials,
            token: Mutex::new(None),
        })
    }

    /// Returns the cached app token, requesting a new one when absent.
    async fn access_token(&self, creds: &TwitchCredentials) -> Result<String, PlatformError> {
        let mut token = self.token.lock().await;
        if let Some(token) = token.as_ref() {
            return Ok(token.clone());
        }

        let url = Url::parse_with_params(
            &format!("{}/oauth2/token", self.auth_url),
            &[
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ],
        )?;
        let resp = self
            .base
            .send_get_json(self.base.client().post(url.as_str()))
            .await?;

        let access_token = resp
            .get("access_token")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PlatformError::MissingField {
                field: "access_token".to_string(),
            })?
            .to_string();
        debug!("Obtained new Twitch app access token.");

        *token = Some(access_token.clone());
        Ok(access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn check_api(&self, creds: &TwitchCredentials, login: &str) -> Result<bool, PlatformError> {
        let token = self.access_token(creds).await?;
        let url = Url::parse_with_params(
            &format!("{}/helix/streams", self.base.info.api_url),
            &[("user_login", login)],
        )?;
        let request = self
            .base
            .client()
            .get(url.as_str())
            .header("Client-ID", creds.client_id.as_str())
            .header("Authorization", format!("Bearer {token}"));

        let resp = match self.base.send_get_json(request).await {
            Err(PlatformError::Unauthorized) => {
                warn!("Twitch rejected the cached token. Dropping it.");
                self.invalidate_token().await;
                return Err(PlatformError::Unauthorized);
            }
            other => other?,
        };
        if let Some(message) = api_error_message(&resp) {
            return Err(PlatformError::ApiError { message });
        }
        Ok(streams_is_live(&resp))
    }
}

/// Normalizes a Helix `/streams` response.
///
/// Live streams come back as a non-empty `data` array. Anything else,
/// including an empty array or a missing field, means offline.
pub fn streams_is_live(resp: &Value) -> bool {
    resp.get("data")
        .and_then(|d| d.as_array())
        .is_some_and(|streams| {
            streams.iter().any(|s| {
                s.as_object().is_some_and(|s| {
                    s.get("type")
                        .and_then(|t| t.as_str())
                        .is_none_or(|t| t == "live")
                })
            })
        })
}

#[async_trait]
impl Platform for TwitchPlatform {
    async fn check_live(&self, source_url: &str) -> Result<bool, PlatformError> {
        let login = extract_slug(source_url);
        if login.is_empty() {
            return Ok(false);
        }

        if let Some(creds) = &self.credentials {
            match self.check_api(creds, &login).await {
                Ok(live) => return Ok(live),
                Err(e) => warn!("Twitch API failed for `{login}`: {e}. Falling back to HTML."),
            }
        }

        let page = self.base.fetch_page(source_url).await?;
        Ok(contains_any(&page, &PAGE_MARKERS))
    }

    fn get_base(&self) -> &BasePlatform {
        &self.base
    }
}
