//! In-process feed state.
//!
//! Holds the latest observation per symbol, pushed by whatever adapter
//! bridges the external feed (out of scope here). Reads apply the
//! freshness window: an observation older than the window is "no data".

use crate::error::FeedResult;
use crate::QuoteFeed;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use pulse_core::{Quote, SymbolId};
use tracing::trace;

/// Latest-quote store with a freshness window.
pub struct FeedState {
    quotes: DashMap<SymbolId, Quote>,
    freshness: Duration,
}

impl FeedState {
    /// Create a feed state treating observations older than
    /// `freshness_ms` as stale.
    pub fn new(freshness_ms: i64) -> Self {
        Self {
            quotes: DashMap::new(),
            freshness: Duration::milliseconds(freshness_ms),
        }
    }

    /// Record a new observation.
    ///
    /// Observations older than the stored one for the symbol are
    /// ignored, so out-of-order adapter pushes cannot rewind the feed.
    pub fn push(&self, quote: Quote) {
        match self.quotes.get(&quote.symbol) {
            Some(existing) if existing.timestamp > quote.timestamp => {
                trace!(symbol = %quote.symbol, "Dropping out-of-order quote");
            }
            _ => {
                self.quotes.insert(quote.symbol.clone(), quote);
            }
        }
    }

    /// Symbols with any stored observation, fresh or not.
    pub fn symbols(&self) -> Vec<SymbolId> {
        self.quotes.iter().map(|e| e.key().clone()).collect()
    }
}

impl QuoteFeed for FeedState {
    fn latest(&self, symbol: &SymbolId, now: DateTime<Utc>) -> FeedResult<Option<Quote>> {
        Ok(self.quotes.get(symbol).and_then(|quote| {
            if quote.age(now) > self.freshness {
                None
            } else {
                Some(quote.clone())
            }
        }))
    }
}
