#![allow(dead_code)]

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use futures::future::BoxFuture;
use stream_alert::entity::Creator;
use stream_alert::messenger::IncomingMessage;
use stream_alert::messenger::Messenger;
use stream_alert::messenger::UpdateSource;
use stream_alert::messenger::error::MessengerError;
use stream_alert::platform::BasePlatform;
use stream_alert::platform::Platform;
use stream_alert::platform::PlatformId;
use stream_alert::platform::PlatformInfo;
use stream_alert::platform::error::PlatformError;
use stream_alert::platform::platforms::Platforms;
use stream_alert::repository::Repository;
use uuid::Uuid;

pub async fn setup_db() -> (Arc<Repository>, PathBuf) {
    let uuid = Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("stream-alert-test-{}.db", uuid));
    let db_url = format!("sqlite://{}", db_path.to_str().unwrap());

    let repo = Repository::new(&db_url, db_path.to_str().unwrap())
        .await
        .expect("Failed to create database");

    repo.run_migrations().await.expect("Failed to run migrations");

    (Arc::new(repo), db_path)
}

/// Makes every insert or update of `live_states` rows matching `condition`
/// abort. `condition` is a SQL expression over `NEW`.
pub async fn fail_live_state_writes(db_path: &Path, condition: &str) {
    let db_url = format!("sqlite://{}", db_path.to_str().unwrap());
    let pool = sqlx::SqlitePool::connect(&db_url)
        .await
        .expect("Failed to open database");
    let suffix = Uuid::new_v4().simple();

    for event in ["INSERT", "UPDATE"] {
        let sql = format!(
            "CREATE TRIGGER fail_{}_{suffix} BEFORE {event} ON live_states \
             WHEN {condition} \
             BEGIN SELECT RAISE(ABORT, 'live state write rejected'); END",
            event.to_lowercase()
        );
        sqlx::query(&sql)
            .execute(&pool)
            .await
            .expect("Failed to create trigger");
    }
    pool.close().await;
}

pub async fn teardown_db(db_path: PathBuf) {
    if db_path.exists() {
        let _ = std::fs::remove_file(db_path);
    }
}

/// The creator used throughout the end-to-end scenarios.
pub fn hardplay() -> Creator {
    Creator::new("hardplay", "HARD PLAY")
        .with_url(PlatformId::Twitch, "https://twitch.tv/hardgamechannel")
        .with_url(PlatformId::YouTube, "https://www.youtube.com/@HARDPLAYYOUTUBE")
        .with_url(PlatformId::Kick, "https://kick.com/hardplay")
        .with_url(PlatformId::VkPlay, "https://live.vkvideo.ru/hardplay")
        .with_url(PlatformId::Telegram, "https://t.me/hardplayyt")
        .with_url(PlatformId::VkGroup, "https://vk.com/hardplay")
}

// MOCK PLATFORM

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockBehavior {
    Live(bool),
    Fail,
    Panic,
}

pub struct MockPlatform {
    pub base: BasePlatform,
    behavior: Mutex<MockBehavior>,
    overrides: Mutex<HashMap<String, MockBehavior>>,
    calls: AtomicUsize,
}

impl MockPlatform {
    pub fn new(id: PlatformId) -> Self {
        let info = PlatformInfo {
            id,
            name: format!("Mock {id}"),
            icon: format!("[{id}]"),
            api_url: "http://127.0.0.1:9".to_string(),
            web_url: "http://127.0.0.1:9".to_string(),
        };
        Self {
            base: BasePlatform::new(info, 6000).expect("Failed to build mock platform"),
            behavior: Mutex::new(MockBehavior::Live(false)),
            overrides: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Overrides the behavior for one profile URL only.
    pub fn set_for(&self, source_url: &str, behavior: MockBehavior) {
        self.overrides
            .lock()
            .unwrap()
            .insert(source_url.to_string(), behavior);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn check_live(&self, source_url: &str) -> Result<bool, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let overridden = self.overrides.lock().unwrap().get(source_url).copied();
        let behavior = overridden.unwrap_or_else(|| *self.behavior.lock().unwrap());
        match behavior {
            MockBehavior::Live(live) => Ok(live),
            MockBehavior::Fail => Err(PlatformError::ApiError {
                message: "mock failure".to_string(),
            }),
            MockBehavior::Panic => panic!("mock detector panic"),
        }
    }

    fn get_base(&self) -> &BasePlatform {
        &self.base
    }
}

/// One mock detector per platform, plus a registry holding all of them.
pub struct MockPlatforms {
    pub mocks: Vec<Arc<MockPlatform>>,
    pub registry: Arc<Platforms>,
}

impl MockPlatforms {
    pub fn new() -> Self {
        let mut registry = Platforms::empty();
        let mocks: Vec<Arc<MockPlatform>> = PlatformId::ALL
            .into_iter()
            .map(|id| Arc::new(MockPlatform::new(id)))
            .collect();
        for mock in &mocks {
            registry.add_platform(mock.clone());
        }
        Self {
            mocks,
            registry: Arc::new(registry),
        }
    }

    pub fn get(&self, id: PlatformId) -> &MockPlatform {
        self.mocks
            .iter()
            .find(|m| m.info().id == id)
            .expect("every platform is mocked")
    }
}

// MOCK MESSENGER

pub type SendHook = Box<dyn Fn(i64) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub user_id: i64,
    pub text: String,
    pub keyboard: Option<String>,
}

/// Records every send. Users in `failing` get an error instead.
#[derive(Default)]
pub struct MockMessenger {
    sent: Mutex<Vec<SentMessage>>,
    failing: Mutex<HashSet<i64>>,
    hook: Mutex<Option<Arc<SendHook>>>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, user_id: i64) {
        self.failing.lock().unwrap().insert(user_id);
    }

    /// Runs `hook` before each send attempt.
    pub fn on_send(&self, hook: SendHook) {
        *self.hook.lock().unwrap() = Some(Arc::new(hook));
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.sent().iter().map(|m| m.user_id).collect();
        ids.sort();
        ids
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send(&self, user_id: i64, text: &str, keyboard: Option<&str>) -> Result<(), MessengerError> {
        let hook = self.hook.lock().unwrap().clone();
        if let Some(hook) = hook {
            (**hook)(user_id).await;
        }

        if self.failing.lock().unwrap().contains(&user_id) {
            return Err(MessengerError::ApiError {
                code: 901,
                message: "Can't send messages for users without permission".to_string(),
            });
        }
        self.sent.lock().unwrap().push(SentMessage {
            user_id,
            text: text.to_string(),
            keyboard: keyboard.map(|k| k.to_string()),
        });
        Ok(())
    }
}

// MOCK UPDATE SOURCE

/// Hands out queued batches, then an error once the queue is empty.
#[derive(Default)]
pub struct MockUpdateSource {
    batches: Mutex<Vec<Vec<IncomingMessage>>>,
}

impl MockUpdateSource {
    pub fn new(mut batches: Vec<Vec<IncomingMessage>>) -> Self {
        batches.reverse();
        Self {
            batches: Mutex::new(batches),
        }
    }
}

#[async_trait]
impl UpdateSource for MockUpdateSource {
    async fn next_messages(&self) -> Result<Vec<IncomingMessage>, MessengerError> {
        let batch = self.batches.lock().unwrap().pop();
        batch.ok_or_else(|| MessengerError::UnexpectedResponse {
            message: "no more updates".to_string(),
        })
    }
}
