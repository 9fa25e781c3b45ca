use std::sync::Arc;

use crate::entity::Creator;
use crate::service::live_status_service::PlatformObservation;

pub mod event_bus;

/// Marker trait for events that can be dispatched through the event bus.
pub trait Event: std::any::Any + Send + Sync + 'static {
    /// Downcast this event to a concrete type.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Get the name of the event type.
    fn event_name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Event fired when a creator goes live on one platform.
#[derive(Clone, Debug)]
pub struct StreamLiveEvent {
    pub creator: Arc<Creator>,
    pub observation: Arc<PlatformObservation>,
}

impl StreamLiveEvent {
    pub fn new(creator: Creator, observation: PlatformObservation) -> Self {
        Self {
            creator: Arc::new(creator),
            observation: Arc::new(observation),
        }
    }
}

impl Event for StreamLiveEvent {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
