//! Quote feed boundary.
//!
//! The external feed is consumed through the `QuoteFeed` trait: the
//! latest observation per symbol, with staleness beyond the freshness
//! window treated as "no data" rather than a zero/default value.
//! `FeedState` is the in-process implementation that external adapters
//! push observations into.

pub mod error;
pub mod state;

pub use error::{FeedError, FeedResult};
pub use state::FeedState;

use chrono::{DateTime, Utc};
use pulse_core::{Quote, SymbolId};

/// Read interface over the external quote source.
pub trait QuoteFeed: Send + Sync {
    /// Latest fresh quote for a symbol at `now`.
    ///
    /// `Ok(None)` means no data (unknown symbol or observation older
    /// than the freshness window). `Err` means the source itself is
    /// unreachable; callers should skip their tick rather than write
    /// stale or zeroed values.
    fn latest(&self, symbol: &SymbolId, now: DateTime<Utc>) -> FeedResult<Option<Quote>>;
}
