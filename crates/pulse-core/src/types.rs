//! Tick and bar data types.
//!
//! `Quote` is the transient input read from the external feed; `Bar` is
//! the durable intraday aggregation unit. A bar accumulates quotes for a
//! fixed period and is immutable once its `closed` flag is set.

use crate::decimal::{Price, Size};
use crate::market::SymbolId;
use chrono::{DateTime, Duration, DurationRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Latest observed quote for one instrument.
///
/// `volume` is the volume traded since the previous observation, not a
/// cumulative session total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Instrument symbol.
    pub symbol: SymbolId,
    /// Best bid.
    pub bid: Price,
    /// Best ask.
    pub ask: Price,
    /// Last traded price.
    pub last: Price,
    /// Volume traded since the previous observation.
    pub volume: Size,
    /// Feed timestamp of this observation.
    pub timestamp: DateTime<Utc>,
}

impl Quote {
    /// Age of the quote relative to an instant.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.timestamp
    }
}

/// OHLC aggregation of quotes over a fixed period.
///
/// Append-only semantics: once `closed` is set the bar is never mutated
/// again, and at most one closed bar exists per `(symbol, period_start)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Instrument symbol.
    pub symbol: SymbolId,
    /// Start of the aggregation period (UTC, aligned to the period).
    pub period_start: DateTime<Utc>,
    /// First traded price of the period.
    pub open: Price,
    /// Highest traded price of the period.
    pub high: Price,
    /// Lowest traded price of the period.
    pub low: Price,
    /// Most recent traded price of the period.
    pub close: Price,
    /// Total volume over the period.
    pub volume: Size,
    /// Sum of `last * volume` over the period, for VWAP.
    pub notional: Decimal,
    /// Whether the period has elapsed and the bar is immutable.
    pub closed: bool,
}

impl Bar {
    /// Open a new in-progress bar from the first quote of a period.
    pub fn open_from(quote: &Quote, period_start: DateTime<Utc>) -> Self {
        Self {
            symbol: quote.symbol.clone(),
            period_start,
            open: quote.last,
            high: quote.last,
            low: quote.last,
            close: quote.last,
            volume: quote.volume,
            notional: quote.last.inner() * quote.volume.inner(),
            closed: false,
        }
    }

    /// Fold a quote into an in-progress bar.
    ///
    /// Has no effect on a closed bar.
    pub fn apply(&mut self, quote: &Quote) {
        if self.closed {
            return;
        }
        if quote.last > self.high {
            self.high = quote.last;
        }
        if quote.last < self.low {
            self.low = quote.last;
        }
        self.close = quote.last;
        self.volume += quote.volume;
        self.notional += quote.last.inner() * quote.volume.inner();
    }

    /// Mark the bar closed.
    pub fn mark_closed(&mut self) {
        self.closed = true;
    }

    /// Volume-weighted average price of the bar.
    ///
    /// Returns None for a zero-volume bar.
    pub fn vwap(&self) -> Option<Price> {
        if self.volume.is_zero() {
            return None;
        }
        Some(Price::new(self.notional / self.volume.inner()))
    }
}

/// Align a timestamp down to the start of its aggregation period.
pub fn period_start_of(timestamp: DateTime<Utc>, period: Duration) -> DateTime<Utc> {
    timestamp
        .duration_trunc(period)
        .unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn quote(last: Decimal, volume: Decimal, ts: DateTime<Utc>) -> Quote {
        Quote {
            symbol: "AAPL".into(),
            bid: Price::new(last - dec!(0.01)),
            ask: Price::new(last + dec!(0.01)),
            last: Price::new(last),
            volume: Size::new(volume),
            timestamp: ts,
        }
    }

    fn ts(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 5, h, m, s).unwrap()
    }

    #[test]
    fn test_bar_ohlc_accumulation() {
        let start = ts(14, 30, 0);
        let mut bar = Bar::open_from(&quote(dec!(100), dec!(10), start), start);
        bar.apply(&quote(dec!(103), dec!(5), ts(14, 30, 10)));
        bar.apply(&quote(dec!(99), dec!(5), ts(14, 30, 20)));
        bar.apply(&quote(dec!(101), dec!(10), ts(14, 30, 40)));

        assert_eq!(bar.open, Price::new(dec!(100)));
        assert_eq!(bar.high, Price::new(dec!(103)));
        assert_eq!(bar.low, Price::new(dec!(99)));
        assert_eq!(bar.close, Price::new(dec!(101)));
        assert_eq!(bar.volume, Size::new(dec!(30)));
    }

    #[test]
    fn test_bar_vwap() {
        let start = ts(14, 30, 0);
        let mut bar = Bar::open_from(&quote(dec!(100), dec!(10), start), start);
        bar.apply(&quote(dec!(110), dec!(10), ts(14, 30, 30)));
        // (100*10 + 110*10) / 20 = 105
        assert_eq!(bar.vwap(), Some(Price::new(dec!(105))));
    }

    #[test]
    fn test_zero_volume_bar_has_no_vwap() {
        let start = ts(14, 30, 0);
        let bar = Bar::open_from(&quote(dec!(100), dec!(0), start), start);
        assert_eq!(bar.vwap(), None);
    }

    #[test]
    fn test_closed_bar_ignores_quotes() {
        let start = ts(14, 30, 0);
        let mut bar = Bar::open_from(&quote(dec!(100), dec!(10), start), start);
        bar.mark_closed();
        bar.apply(&quote(dec!(200), dec!(10), ts(14, 30, 50)));
        assert_eq!(bar.close, Price::new(dec!(100)));
        assert_eq!(bar.volume, Size::new(dec!(10)));
    }

    #[test]
    fn test_period_start_alignment() {
        let t = ts(14, 33, 42);
        assert_eq!(period_start_of(t, Duration::minutes(1)), ts(14, 33, 0));
        assert_eq!(period_start_of(t, Duration::minutes(5)), ts(14, 30, 0));
    }
}
