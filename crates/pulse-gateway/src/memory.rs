//! In-memory gateway implementation.
//!
//! Backs the `Gateway` contract with a `DashMap` of TTL-stamped entries
//! and one tokio broadcast channel per publish channel. Expiry is
//! checked on read; `purge_expired` sweeps the map for long-running
//! processes. There is no LRU — staleness is time-bounded, not
//! space-bounded.

use crate::error::{GatewayError, GatewayResult};
use crate::Gateway;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::trace;

/// Broadcast channel capacity per publish channel.
const CHANNEL_CAPACITY: usize = 256;

/// A stored value with its expiry instant.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// In-memory cache plus broadcast fan-out.
pub struct MemoryGateway {
    entries: DashMap<String, CacheEntry>,
    channels: DashMap<String, broadcast::Sender<String>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            channels: DashMap::new(),
        }
    }

    /// Subscribe to a publish channel.
    ///
    /// Messages published before the subscription are not delivered.
    pub fn subscribe(&self, channel: &str) -> broadcast::Receiver<String> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Number of live (possibly expired-but-unswept) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> GatewayResult<()> {
        let ttl = ChronoDuration::from_std(ttl)
            .map_err(|e| GatewayError::InvalidTtl(e.to_string()))?;
        let entry = CacheEntry {
            value,
            expires_at: Utc::now() + ttl,
        };
        trace!(key, expires_at = %entry.expires_at, "Cache set");
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> GatewayResult<Option<String>> {
        let now = Utc::now();
        let live = self.entries.get(key).and_then(|entry| {
            if entry.is_expired(now) {
                None
            } else {
                Some(entry.value.clone())
            }
        });
        if live.is_none() {
            self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        }
        Ok(live)
    }

    async fn publish(&self, channel: &str, payload: String) -> GatewayResult<usize> {
        match self.channels.get(channel) {
            // send only fails when no receiver is subscribed; publish is
            // fire-and-forget, so that is a successful delivery to zero.
            Some(sender) => Ok(sender.send(payload).unwrap_or(0)),
            None => {
                trace!(channel, "Publish with no subscribers");
                Ok(0)
            }
        }
    }
}
