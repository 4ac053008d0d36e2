//! Consumers of feed broadcasts.

pub mod log_subscriber;

use anyhow::Result;

/// Receives every event published on the bus it is registered with.
///
/// Callbacks run one after another in registration order. An `Err` or a
/// panic is logged by the bus and does not reach other subscribers.
#[async_trait::async_trait]
pub trait Subscriber<E>: Send + Sync {
    async fn callback(&self, event: E) -> Result<()>;
}
