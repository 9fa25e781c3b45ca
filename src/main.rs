//! Application entry point for stream-alert.
//!
//! Initializes all components, starts the poller and the bot loop.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use dotenv::dotenv;
use log::debug;
use log::info;
use stream_alert::bot::Bot;
use stream_alert::config::Config;
use stream_alert::entity::Creator;
use stream_alert::event::StreamLiveEvent;
use stream_alert::event::event_bus::EventBus;
use stream_alert::logging::setup_logging;
use stream_alert::messenger::vk_messenger::VkMessenger;
use stream_alert::platform::platforms::Platforms;
use stream_alert::repository::Repository;
use stream_alert::service::Services;
use stream_alert::subscriber::live_notifier::LiveNotifier;
use stream_alert::task::live_status_publisher::LiveStatusPublisher;
use stream_alert::template::Templates;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let init_start = Instant::now();
    let config = load_config()?;
    let creators: Arc<[Creator]> = config.creators.clone().into();
    let event_bus = Arc::new(EventBus::new());

    let repo = setup_database(&config, init_start).await?;
    let platforms = Arc::new(Platforms::new(&config)?);
    let services = Arc::new(Services::new(repo, platforms, creators.clone()));
    let templates = Arc::new(Templates::new()?);
    let messenger = Arc::new(VkMessenger::new(&config.vk)?);

    setup_subscribers(&event_bus, &services, messenger.clone(), templates.clone());
    setup_bot(&services, messenger, templates, init_start);
    setup_publishers(&config, &services, event_bus, creators, init_start);

    run(init_start).await
}

fn load_config() -> Result<Arc<Config>> {
    debug!("Loading configuration...");
    let mut config = Config::new();
    config.load()?;
    let config = Arc::new(config);
    setup_logging(&config)?;
    info!(
        "Starting stream-alert with {} creators...",
        config.creators.len()
    );
    Ok(config)
}

async fn setup_database(config: &Config, init_start: Instant) -> Result<Arc<Repository>> {
    debug!("Setting up Database...");
    let repo = Arc::new(Repository::new(&config.db_url, &config.db_path).await?);

    info!("Running database migrations...");
    repo.run_migrations().await?;
    info!(
        "Database setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );

    Ok(repo)
}

fn setup_subscribers(
    event_bus: &EventBus,
    services: &Services,
    messenger: Arc<VkMessenger>,
    templates: Arc<Templates>,
) {
    debug!("Setting up Subscribers...");

    let live_notifier = Arc::new(LiveNotifier::new(
        services.subscription.clone(),
        messenger,
        templates,
    ));
    event_bus.register_subcriber::<StreamLiveEvent, _>(live_notifier);
}

fn setup_bot(
    services: &Services,
    messenger: Arc<VkMessenger>,
    templates: Arc<Templates>,
    init_start: Instant,
) {
    info!("Starting bot...");
    let bot = Arc::new(Bot::new(
        messenger.clone(),
        services.subscription.clone(),
        templates,
    ));
    bot.start(messenger);
    info!(
        "Bot setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );
}

fn setup_publishers(
    config: &Config,
    services: &Services,
    event_bus: Arc<EventBus>,
    creators: Arc<[Creator]>,
    init_start: Instant,
) {
    debug!("Setting up Publishers...");

    LiveStatusPublisher::new(
        services.live_status.clone(),
        event_bus,
        creators,
        config.poll_interval,
    )
    .start();

    info!(
        "Publishers setup complete ({:.2}s).",
        init_start.elapsed().as_secs_f64()
    );
}

async fn run(init_start: Instant) -> Result<()> {
    info!(
        "stream-alert is up in {:.2}s. Press Ctrl+C to stop.",
        init_start.elapsed().as_secs_f64()
    );

    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down.");

    Ok(())
}
