//! Cache and broadcast gateway.
//!
//! The gateway is the system's external durability and notification
//! boundary: a key/value store with TTL expiry plus fire-and-forget
//! publish channels. Cache entries are the only cross-process-visible
//! state; TTL is the sole eviction policy.

pub mod error;
pub mod keys;
pub mod memory;

pub use error::{GatewayError, GatewayResult};
pub use memory::MemoryGateway;

use async_trait::async_trait;
use std::time::Duration;

/// Cache/broadcast gateway contract.
///
/// Keys are structured strings (see [`keys`]); values are opaque
/// serialized payloads; publish is at-most-once delivery to currently
/// subscribed listeners with no persistence of missed messages.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Store a value under a key with a TTL.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> GatewayResult<()>;

    /// Fetch a value. Expired or missing entries read as absent.
    async fn get(&self, key: &str) -> GatewayResult<Option<String>>;

    /// Publish a payload to a channel. Returns the number of receivers.
    async fn publish(&self, channel: &str, payload: String) -> GatewayResult<usize>;
}
