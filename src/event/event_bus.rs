use std::any::Any;
use std::any::TypeId;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use anyhow::Result;
use log::debug;
use log::error;
use tokio::task::JoinHandle;

use crate::event::Event;
use crate::subscriber::Subscriber;

type AsyncSubscriber<E> =
    Box<dyn Fn(E) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync>;
type Subscribers = Arc<RwLock<HashMap<TypeId, Vec<Box<dyn Any + Send + Sync>>>>>;

/// Typed publish/subscribe hub. Callbacks run on the ambient tokio runtime.
pub struct EventBus {
    subscribers: Subscribers,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn register_callback<E, F, Fut>(&self, callback: F) -> &Self
    where
        E: 'static + Send + Sync,
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let type_id = TypeId::of::<E>();

        let wrapped_sub: AsyncSubscriber<E> = Box::new(move |event| Box::pin(callback(event)));

        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(type_id)
            .or_default()
            .push(Box::new(wrapped_sub));
        self
    }

    pub fn register_subcriber<E, S>(&self, subscriber: Arc<S>) -> &Self
    where
        E: 'static + Send + Sync + Clone,
        S: Subscriber<E> + Send + Sync + 'static,
    {
        self.register_callback(move |event: E| {
            let h = subscriber.clone();
            async move { h.callback(event).await }
        })
    }

    /// Hands the event to every subscriber of its type.
    ///
    /// Returns the handle of the spawned delivery task, or `None` when
    /// nothing is subscribed to `E`.
    pub fn publish<E>(&self, event: E) -> Option<JoinHandle<()>>
    where
        E: Event + Clone,
    {
        let type_id = TypeId::of::<E>();
        let subs = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let subs_list = subs.get(&type_id)?;
        let mut futures = Vec::new();
        for subs_box in subs_list {
            if let Some(sub) = subs_box.downcast_ref::<AsyncSubscriber<E>>() {
                futures.push(sub(event.clone()));
            }
        }

        let name = event.event_name();
        debug!("Publishing {name} to {} subscribers.", futures.len());
        Some(tokio::spawn(async move {
            for result in futures::future::join_all(futures).await {
                if let Err(e) = result {
                    error!("Subscriber of {name} failed: {e}");
                }
            }
        }))
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
