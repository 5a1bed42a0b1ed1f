//! Market identification and trading-calendar types.
//!
//! A market is identified by its exchange code (e.g. "US", "JP") and
//! described by a `MarketDefinition`: the IANA time zone, local open and
//! close times, trading weekdays, and holiday overrides. Definitions are
//! loaded from configuration and immutable for a scheduling cycle.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange code (e.g. "US", "JP", "AU").
///
/// The unique identifier for a tracked market.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeCode(String);

impl ExchangeCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExchangeCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Instrument symbol (e.g. "AAPL", "7203.T").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(String);

impl SymbolId {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SymbolId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Trading-calendar definition for one market.
///
/// Owned by configuration; read-only to all jobs. An overnight session
/// is expressed by `open_time > close_time` and wraps across the local
/// date boundary.
#[derive(Debug, Clone)]
pub struct MarketDefinition {
    /// Exchange code.
    pub exchange: ExchangeCode,
    /// IANA time zone of the trading venue.
    pub time_zone: Tz,
    /// Local session open time of day.
    pub open_time: NaiveTime,
    /// Local session close time of day (exclusive).
    pub close_time: NaiveTime,
    /// Local weekdays on which the market trades.
    pub trading_days: Vec<Weekday>,
    /// Calendar override: local dates that are closed all day.
    pub holidays: Vec<NaiveDate>,
}

impl MarketDefinition {
    /// Whether the session wraps across the local midnight boundary.
    pub fn is_overnight(&self) -> bool {
        self.open_time > self.close_time
    }
}

/// Trading-session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    Open,
    Closed,
}

impl SessionStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Closed => write!(f, "CLOSED"),
        }
    }
}

/// Derived market status.
///
/// A pure function of `(MarketDefinition, as_of)` — never mutated in
/// place; every reconciliation produces a fresh value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStatus {
    /// Exchange code this status describes.
    pub exchange: ExchangeCode,
    /// Open or closed.
    pub status: SessionStatus,
    /// Instant the status was computed at.
    pub as_of: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_code_display() {
        let code = ExchangeCode::new("US");
        assert_eq!(code.to_string(), "US");
        assert_eq!(code.as_str(), "US");
    }

    #[test]
    fn test_session_status_serde() {
        let json = serde_json::to_string(&SessionStatus::Open).unwrap();
        assert_eq!(json, "\"OPEN\"");
        let parsed: SessionStatus = serde_json::from_str("\"CLOSED\"").unwrap();
        assert_eq!(parsed, SessionStatus::Closed);
    }

    #[test]
    fn test_overnight_detection() {
        let def = MarketDefinition {
            exchange: "FX".into(),
            time_zone: chrono_tz::UTC,
            open_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            close_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            trading_days: vec![Weekday::Mon, Weekday::Tue],
            holidays: Vec::new(),
        };
        assert!(def.is_overnight());
    }

    #[test]
    fn test_market_status_roundtrip() {
        let status = MarketStatus {
            exchange: "US".into(),
            status: SessionStatus::Open,
            as_of: Utc::now(),
        };
        let json = serde_json::to_string(&status).unwrap();
        let parsed: MarketStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, status);
    }
}
