//! VK community messages: `messages.send` plus the Bots Long Poll API.

use std::num::NonZeroU32;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use governor::Quota;
use governor::RateLimiter;
use governor::clock::QuantaClock;
use governor::state::InMemoryState;
use governor::state::direct::NotKeyed;
use log::debug;
use log::info;
use log::warn;
use serde_json::Value;
use tokio::sync::Mutex;
use url::Url;

use crate::config::VkConfig;
use crate::messenger::IncomingMessage;
use crate::messenger::Messenger;
use crate::messenger::UpdateSource;
use crate::messenger::error::MessengerError;

pub const VK_API_VERSION: &str = "5.199";

/// Seconds the long poll server holds a request open.
const LONG_POLL_WAIT: u64 = 25;

/// VK peer ids at or above this value are group chats.
const CHAT_PEER_OFFSET: i64 = 2_000_000_000;

#[derive(Clone, Debug, PartialEq, Eq)]
struct LongPollSession {
    server: String,
    key: String,
    ts: String,
}

/// What to do after a long poll response.
#[derive(Debug, PartialEq)]
enum PollOutcome {
    Updates { ts: String, messages: Vec<IncomingMessage> },
    /// History is partially lost, continue from the given ts.
    NewTs(String),
    /// Key expired or history lost, request a new session.
    Refresh,
}

pub struct VkMessenger {
    /// Base of the VK API, e.g. "https://api.vk.com/method".
    pub api_url: String,
    token: String,
    group_id: u64,
    client: wreq::Client,
    limiter: RateLimiter<NotKeyed, InMemoryState, QuantaClock>,
    session: Mutex<Option<LongPollSession>>,
    random_seq: AtomicI64,
}

impl VkMessenger {
    pub fn new(config: &VkConfig) -> Result<Self, MessengerError> {
        let client = wreq::Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_WAIT + 10))
            .build()
            .map_err(|e| MessengerError::ClientBuild {
                message: e.to_string(),
            })?;

        // Community tokens may call the API 20 times per second.
        let limiter = RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(20).unwrap_or(NonZeroU32::MIN),
        ));

        Ok(Self {
            api_url: "https://api.vk.com/method".to_string(),
            token: config.token.clone(),
            group_id: config.group_id,
            client,
            limiter,
            session: Mutex::new(None),
            random_seq: AtomicI64::new(0),
        })
    }

    /// Calls an API method and unwraps its `response` field.
    pub async fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<Value, MessengerError> {
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("access_token", self.token.as_str()));
        query.push(("v", VK_API_VERSION));
        let url = Url::parse_with_params(&format!("{}/{method}", self.api_url), &query)?;

        self.limiter.until_ready().await;
        debug!("Calling VK method {method}");
        let resp = self.get_json(url.as_str()).await?;
        unwrap_response(resp)
    }

    async fn get_json(&self, url: &str) -> Result<Value, MessengerError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MessengerError::HttpStatus {
                status: status.as_u16(),
                url: response.url().path().to_string(),
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn next_random_id(&self) -> i64 {
        let seq = self.random_seq.fetch_add(1, Ordering::Relaxed);
        (chrono::Utc::now().timestamp_millis() + seq) % (1 << 31)
    }

    async fn open_session(&self) -> Result<LongPollSession, MessengerError> {
        let group_id = self.group_id.to_string();
        let resp = self
            .call("groups.getLongPollServer", &[("group_id", group_id.as_str())])
            .await?;

        let field = |name: &str| {
            resp.get(name)
                .and_then(value_to_string)
                .ok_or_else(|| MessengerError::UnexpectedResponse {
                    message: format!("long poll server without `{name}`"),
                })
        };
        let session = LongPollSession {
            server: field("server")?,
            key: field("key")?,
            ts: field("ts")?,
        };
        info!("Opened VK long poll session.");
        Ok(session)
    }
}

#[async_trait]
impl Messenger for VkMessenger {
    async fn send(&self, user_id: i64, text: &str, keyboard: Option<&str>) -> Result<(), MessengerError> {
        let user_id = user_id.to_string();
        let random_id = self.next_random_id().to_string();
        let mut params = vec![
            ("user_id", user_id.as_str()),
            ("message", text),
            ("random_id", random_id.as_str()),
        ];
        if let Some(keyboard) = keyboard {
            params.push(("keyboard", keyboard));
        }
        self.call("messages.send", &params).await?;
        Ok(())
    }
}

#[async_trait]
impl UpdateSource for VkMessenger {
    async fn next_messages(&self) -> Result<Vec<IncomingMessage>, MessengerError> {
        let mut guard = self.session.lock().await;
        let session = match guard.as_ref() {
            Some(session) => session.clone(),
            None => {
                let session = self.open_session().await?;
                *guard = Some(session.clone());
                session
            }
        };

        let wait = LONG_POLL_WAIT.to_string();
        let url = Url::parse_with_params(
            &session.server,
            &[
                ("act", "a_check"),
                ("key", session.key.as_str()),
                ("ts", session.ts.as_str()),
                ("wait", wait.as_str()),
            ],
        )?;
        let resp = self.get_json(url.as_str()).await?;

        match parse_poll_response(&resp)? {
            PollOutcome::Updates { ts, messages } => {
                if let Some(s) = guard.as_mut() {
                    s.ts = ts;
                }
                Ok(messages)
            }
            PollOutcome::NewTs(ts) => {
                warn!("VK long poll history lost, continuing from ts {ts}.");
                if let Some(s) = guard.as_mut() {
                    s.ts = ts;
                }
                Ok(Vec::new())
            }
            PollOutcome::Refresh => {
                info!("VK long poll session expired. Reconnecting...");
                *guard = None;
                Ok(Vec::new())
            }
        }
    }
}

/// Unwraps `{"response": ..}` or turns `{"error": ..}` into an error.
fn unwrap_response(mut resp: Value) -> Result<Value, MessengerError> {
    if let Some(error) = resp.get("error") {
        return Err(MessengerError::ApiError {
            code: error.get("error_code").and_then(|c| c.as_i64()).unwrap_or_default(),
            message: error
                .get("error_msg")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error")
                .to_string(),
        });
    }
    resp.get_mut("response")
        .map(Value::take)
        .ok_or_else(|| MessengerError::UnexpectedResponse {
            message: "missing `response` field".to_string(),
        })
}

fn parse_poll_response(resp: &Value) -> Result<PollOutcome, MessengerError> {
    if let Some(failed) = resp.get("failed").and_then(|f| f.as_i64()) {
        return match failed {
            1 => resp
                .get("ts")
                .and_then(value_to_string)
                .map(PollOutcome::NewTs)
                .ok_or_else(|| MessengerError::UnexpectedResponse {
                    message: "failed=1 without ts".to_string(),
                }),
            _ => Ok(PollOutcome::Refresh),
        };
    }

    let ts = resp
        .get("ts")
        .and_then(value_to_string)
        .ok_or_else(|| MessengerError::UnexpectedResponse {
            message: "long poll response without ts".to_string(),
        })?;
    let messages = resp
        .get("updates")
        .and_then(|u| u.as_array())
        .map(|updates| updates.iter().filter_map(parse_message_new).collect())
        .unwrap_or_default();

    Ok(PollOutcome::Updates { ts, messages })
}

/// Extracts a private user message from a `message_new` update.
fn parse_message_new(update: &Value) -> Option<IncomingMessage> {
    if update.get("type")?.as_str()? != "message_new" {
        return None;
    }
    let object = update.get("object")?;
    // API versions before 5.103 put the message itself in `object`.
    let message = object.get("message").unwrap_or(object);

    let user_id = message.get("from_id")?.as_i64()?;
    let peer_id = message.get("peer_id").and_then(|p| p.as_i64()).unwrap_or(user_id);
    if user_id <= 0 || peer_id >= CHAT_PEER_OFFSET {
        return None;
    }

    let text = message
        .get("text")
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string();
    let payload = message
        .get("payload")
        .and_then(|p| p.as_str())
        .and_then(|p| serde_json::from_str::<Value>(p).ok());

    Some(IncomingMessage {
        user_id,
        text,
        payload,
    })
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
