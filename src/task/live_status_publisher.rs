//! Background task that polls every creator and publishes go-live events.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use futures::FutureExt;
use log::debug;
use log::error;
use log::info;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::entity::Creator;
use crate::event::StreamLiveEvent;
use crate::event::event_bus::EventBus;
use crate::service::live_status_service::LiveStatusService;

/// Task that sweeps all creators, sleeping `poll_interval` between sweeps.
pub struct LiveStatusPublisher {
    service: Arc<LiveStatusService>,
    event_bus: Arc<EventBus>,
    creators: Arc<[Creator]>,
    poll_interval: Duration,
    running: AtomicBool,
}

impl LiveStatusPublisher {
    pub fn new(
        service: Arc<LiveStatusService>,
        event_bus: Arc<EventBus>,
        creators: Arc<[Creator]>,
        poll_interval: Duration,
    ) -> Arc<Self> {
        info!(
            "Initializing LiveStatusPublisher with poll interval {:?}",
            poll_interval
        );
        Arc::new(Self {
            service,
            event_bus,
            creators,
            poll_interval,
            running: AtomicBool::new(false),
        })
    }

    /// Starts the polling loop. Calling it again while running does nothing.
    pub fn start(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            return None;
        }
        info!("Starting LiveStatusPublisher check loop.");
        Some(self.spawn_check_loop())
    }

    /// Stops the loop after the current sweep.
    pub fn stop(&self) {
        info!("Stopping LiveStatusPublisher check loop.");
        self.running.store(false, Ordering::SeqCst);
    }

    fn spawn_check_loop(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while self.running.load(Ordering::SeqCst) {
                let started = Instant::now();
                match AssertUnwindSafe(self.check_all()).catch_unwind().await {
                    Ok(deliveries) => debug!(
                        "Sweep finished in {:.2}s with {} go-live events.",
                        started.elapsed().as_secs_f64(),
                        deliveries.len()
                    ),
                    Err(_) => error!("Sweep over creators panicked. Retrying next cycle."),
                }
                sleep(self.poll_interval).await;
            }
            info!("LiveStatusPublisher check loop stopped.");
        })
    }

    /// Runs one sweep over all creators in configuration order.
    ///
    /// Storage errors are logged per platform and never stop the sweep.
    /// Returns the delivery tasks of the published events.
    pub async fn check_all(&self) -> Vec<JoinHandle<()>> {
        debug!("Checking {} creators.", self.creators.len());
        let mut deliveries = Vec::new();

        for creator in self.creators.iter() {
            deliveries.extend(self.check_creator(creator).await);
        }
        deliveries
    }

    async fn check_creator(&self, creator: &Creator) -> Vec<JoinHandle<()>> {
        let applied = self.service.check_creator(creator).await;

        for (platform_id, e) in &applied.failed {
            error!(
                "Error storing {platform_id} state for creator `{}`: {e:?}",
                creator.id
            );
        }

        let mut deliveries = Vec::with_capacity(applied.rising.len());
        for observation in applied.rising {
            info!(
                "{} went live on {}: {}",
                creator.name, observation.name, observation.source_url
            );
            deliveries.extend(
                self.event_bus
                    .publish(StreamLiveEvent::new(creator.clone(), observation)),
            );
        }
        deliveries
    }
}
