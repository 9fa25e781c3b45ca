//! Runtime configuration read from the environment and the creators file.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::entity::Creator;
use crate::error::AppError;
use crate::platform::classifier::ClassifierConfig;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Twitch application credentials for the client-credentials grant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TwitchCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Credentials of the VK community the bot talks through.
#[derive(Clone, Debug, Default)]
pub struct VkConfig {
    /// Community token with the messages permission.
    pub token: String,
    pub group_id: u64,
    /// Service key used to read other communities' walls.
    pub service_token: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub poll_interval: Duration,
    pub db_url: String,
    pub db_path: String,
    pub logs_path: PathBuf,
    pub creators_path: PathBuf,
    pub creators: Vec<Creator>,
    pub vk: VkConfig,
    pub twitch: Option<TwitchCredentials>,
    pub youtube_api_key: Option<String>,
    pub classifier: ClassifierConfig,
}

impl Config {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            db_url: "sqlite://data/stream-alert.db".to_string(),
            db_path: "data/stream-alert.db".to_string(),
            logs_path: PathBuf::from("logs"),
            creators_path: PathBuf::from("creators.json"),
            creators: Vec::new(),
            vk: VkConfig::default(),
            twitch: None,
            youtube_api_key: None,
            classifier: ClassifierConfig::default(),
        }
    }

    /// Reads every setting from the environment, then loads the creators file.
    pub fn load(&mut self) -> Result<(), AppError> {
        if let Some(secs) = env("POLL_INTERVAL") {
            let secs = secs
                .parse::<u64>()
                .map_err(|_| AppError::config(format!("POLL_INTERVAL is not a number: {secs}")))?;
            self.poll_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(db_url) = env("DB_URL") {
            self.db_url = db_url;
        }
        if let Some(db_path) = env("DB_PATH") {
            self.db_path = db_path;
        }
        if let Some(logs_path) = env("LOGS_PATH") {
            self.logs_path = PathBuf::from(logs_path);
        }
        if let Some(creators_path) = env("CREATORS_PATH") {
            self.creators_path = PathBuf::from(creators_path);
        }

        self.vk = VkConfig {
            token: env("VK_TOKEN").ok_or_else(|| AppError::missing_config("VK_TOKEN"))?,
            group_id: env("VK_GROUP_ID")
                .ok_or_else(|| AppError::missing_config("VK_GROUP_ID"))?
                .parse::<u64>()
                .map_err(|_| AppError::config("VK_GROUP_ID must be a positive number"))?,
            service_token: env("VK_SERVICE_TOKEN"),
        };

        self.twitch = match (env("TWITCH_CLIENT_ID"), env("TWITCH_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(TwitchCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };
        self.youtube_api_key = env("YOUTUBE_API_KEY");

        if let Some(min) = env("KEYWORD_MIN_MATCHES") {
            self.classifier.min_matches = min.parse::<usize>().map_err(|_| {
                AppError::config(format!("KEYWORD_MIN_MATCHES is not a number: {min}"))
            })?;
        }
        if let Some(keywords) = env("STREAM_KEYWORDS") {
            self.classifier.keywords = split_list(&keywords);
        }
        if let Some(domains) = env("STREAM_LINK_DOMAINS") {
            self.classifier.link_domains = split_list(&domains);
        }

        let raw = std::fs::read_to_string(&self.creators_path).map_err(|e| {
            AppError::config(format!(
                "Failed to read creators file '{}': {e}",
                self.creators_path.to_string_lossy()
            ))
        })?;
        self.creators = Self::parse_creators(&raw)?;

        Ok(())
    }

    /// Parses the creators file, rejecting blank or duplicate ids.
    pub fn parse_creators(raw: &str) -> Result<Vec<Creator>, AppError> {
        let creators: Vec<Creator> = serde_json::from_str(raw)
            .map_err(|e| AppError::config(format!("Invalid creators file: {e}")))?;

        let mut seen = HashSet::new();
        for creator in &creators {
            if creator.id.trim().is_empty() {
                return Err(AppError::config(format!(
                    "Creator `{}` has an empty id",
                    creator.name
                )));
            }
            if !seen.insert(creator.id.as_str()) {
                return Err(AppError::config(format!(
                    "Duplicate creator id `{}`",
                    creator.id
                )));
            }
        }
        Ok(creators)
    }

    /// Looks up a configured creator by id.
    pub fn creator(&self, id: &str) -> Option<&Creator> {
        self.creators.iter().find(|c| c.id == id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
