//! Background tasks.

pub mod live_status_publisher;
