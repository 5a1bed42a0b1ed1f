//! Structured cache keys and channel names.
//!
//! The key space is partitioned by convention: one writer job per key
//! prefix. All keys used by the built-in jobs are built here so the
//! partitioning is visible in one place.

use pulse_core::{ExchangeCode, SymbolId};
use chrono::{DateTime, Utc};

/// Channel carrying market status-change notifications.
pub const MARKET_STATUS_CHANNEL: &str = "market-status";

/// Cached market status per exchange.
pub fn market_status(exchange: &ExchangeCode) -> String {
    format!("market_status:{exchange}")
}

/// Latest quote per symbol (overwrite semantics, TTL-refreshed).
pub fn latest_quote(symbol: &SymbolId) -> String {
    format!("latest_quote:{symbol}")
}

/// Closed bar record, written once per (symbol, period).
pub fn closed_bar(symbol: &SymbolId, period_start: DateTime<Utc>) -> String {
    format!("bar:{symbol}:{}", period_start.timestamp())
}

/// Rolling VWAP per symbol for a given window.
pub fn rolling_vwap(symbol: &SymbolId, window_minutes: u32) -> String {
    format!("rolling_vwap:{window_minutes}:{symbol}")
}

/// 24-hour price delta per symbol.
pub fn day_delta(symbol: &SymbolId) -> String {
    format!("delta_24h:{symbol}")
}

/// 52-week high/low per symbol.
pub fn year_extremes(symbol: &SymbolId) -> String {
    format!("extremes_52w:{symbol}")
}

/// Session-open snapshot per symbol.
pub fn open_snapshot(symbol: &SymbolId) -> String {
    format!("open_snapshot:{symbol}")
}

/// Session performance grade per symbol.
pub fn session_grade(symbol: &SymbolId) -> String {
    format!("session_grade:{symbol}")
}
