//! Rolling-window statistics over closed bars.
//!
//! Every computation here consumes closed bars only; in-progress bars
//! are mutable and must never leak into an aggregate.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use dashmap::DashMap;
use pulse_core::{Bar, Price, SymbolId};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Volume-weighted average price over the trailing window ending at
/// `now`. Bars outside the window, zero-volume windows, and in-progress
/// bars all yield no value rather than a default.
pub fn rolling_vwap(bars: &[Bar], window: TimeDelta, now: DateTime<Utc>) -> Option<Price> {
    let cutoff = now - window;
    let mut notional = Decimal::ZERO;
    let mut volume = Decimal::ZERO;

    for bar in bars {
        if !bar.closed || bar.period_start < cutoff {
            continue;
        }
        notional += bar.notional;
        volume += bar.volume.inner();
    }

    if volume.is_zero() {
        return None;
    }
    Some(Price::new(notional / volume))
}

/// 24-hour price change in percent.
///
/// The reference is the close of the closed bar nearest the instant 24
/// hours before `now`; the current value is the close of the latest
/// closed bar.
pub fn delta_24h(bars: &[Bar], now: DateTime<Utc>) -> Option<Decimal> {
    let target = now - TimeDelta::hours(24);

    let closed = || bars.iter().filter(|bar| bar.closed);

    let reference = closed().min_by_key(|bar| {
        (bar.period_start - target).abs()
    })?;
    let current = closed().max_by_key(|bar| bar.period_start)?;

    current.close.pct_from(reference.close)
}

/// Per-day high/low record.
#[derive(Debug, Clone)]
struct DayRecord {
    date: NaiveDate,
    high: Price,
    low: Price,
}

/// Rolling 52-week high/low per symbol, maintained from daily extremes
/// rather than by retaining a year of intraday bars.
pub struct YearExtremes {
    days: DashMap<SymbolId, VecDeque<DayRecord>>,
    retention_days: i64,
}

impl YearExtremes {
    pub fn new() -> Self {
        Self::with_retention(365)
    }

    pub fn with_retention(retention_days: i64) -> Self {
        Self {
            days: DashMap::new(),
            retention_days,
        }
    }

    /// Fold a closed bar into its day's high/low record.
    ///
    /// In-progress bars are ignored.
    pub fn record(&self, bar: &Bar) {
        if !bar.closed {
            return;
        }
        let date = bar.period_start.date_naive();
        let mut days = self.days.entry(bar.symbol.clone()).or_default();

        match days.back_mut() {
            Some(last) if last.date == date => {
                if bar.high > last.high {
                    last.high = bar.high;
                }
                if bar.low < last.low {
                    last.low = bar.low;
                }
            }
            _ => {
                days.push_back(DayRecord {
                    date,
                    high: bar.high,
                    low: bar.low,
                });
            }
        }

        let horizon = date - TimeDelta::days(self.retention_days);
        while days.front().is_some_and(|d| d.date < horizon) {
            days.pop_front();
        }
    }

    /// (high, low) over the retained window.
    pub fn extremes(&self, symbol: &SymbolId) -> Option<(Price, Price)> {
        let days = self.days.get(symbol)?;
        let high = days.iter().map(|d| d.high).max()?;
        let low = days.iter().map(|d| d.low).min()?;
        Some((high, low))
    }
}

impl Default for YearExtremes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn bar(
        start: DateTime<Utc>,
        close: Decimal,
        volume: Decimal,
        closed: bool,
    ) -> Bar {
        Bar {
            symbol: "AAPL".into(),
            period_start: start,
            open: Price::new(close),
            high: Price::new(close + dec!(1)),
            low: Price::new(close - dec!(1)),
            close: Price::new(close),
            volume: pulse_core::Size::new(volume),
            notional: close * volume,
            closed,
        }
    }

    fn ts(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, d, h, m, 0).unwrap()
    }

    #[test]
    fn test_vwap_over_window() {
        let now = ts(5, 15, 0);
        let bars = vec![
            bar(ts(5, 14, 40), dec!(100), dec!(10), true),
            bar(ts(5, 14, 50), dec!(110), dec!(10), true),
        ];
        // (100*10 + 110*10) / 20 = 105
        let vwap = rolling_vwap(&bars, TimeDelta::minutes(30), now).unwrap();
        assert_eq!(vwap, Price::new(dec!(105)));
    }

    #[test]
    fn test_vwap_excludes_bars_outside_window() {
        let now = ts(5, 15, 0);
        let bars = vec![
            bar(ts(5, 10, 0), dec!(500), dec!(100), true),
            bar(ts(5, 14, 50), dec!(100), dec!(10), true),
        ];
        let vwap = rolling_vwap(&bars, TimeDelta::minutes(30), now).unwrap();
        assert_eq!(vwap, Price::new(dec!(100)));
    }

    #[test]
    fn test_vwap_excludes_in_progress_bars() {
        let now = ts(5, 15, 0);
        let bars = vec![
            bar(ts(5, 14, 50), dec!(100), dec!(10), true),
            bar(ts(5, 14, 59), dec!(999), dec!(1000), false),
        ];
        let vwap = rolling_vwap(&bars, TimeDelta::minutes(30), now).unwrap();
        assert_eq!(vwap, Price::new(dec!(100)));
    }

    #[test]
    fn test_vwap_no_volume_is_none() {
        let now = ts(5, 15, 0);
        let bars = vec![bar(ts(5, 14, 50), dec!(100), dec!(0), true)];
        assert!(rolling_vwap(&bars, TimeDelta::minutes(30), now).is_none());
    }

    #[test]
    fn test_delta_24h_uses_nearest_reference() {
        let now = ts(5, 15, 0);
        let bars = vec![
            // Nearest to 24h ago (Aug 4 15:00).
            bar(ts(4, 14, 58), dec!(100), dec!(1), true),
            bar(ts(4, 20, 0), dec!(140), dec!(1), true),
            bar(ts(5, 14, 50), dec!(105), dec!(1), true),
        ];
        let delta = delta_24h(&bars, now).unwrap();
        assert_eq!(delta, dec!(5));
    }

    #[test]
    fn test_delta_24h_ignores_in_progress_bars() {
        let now = ts(5, 15, 0);
        let bars = vec![
            bar(ts(4, 15, 0), dec!(100), dec!(1), true),
            bar(ts(5, 14, 50), dec!(110), dec!(1), true),
            bar(ts(5, 14, 59), dec!(50), dec!(1), false),
        ];
        let delta = delta_24h(&bars, now).unwrap();
        assert_eq!(delta, dec!(10));
    }

    #[test]
    fn test_year_extremes_tracks_daily_high_low() {
        let extremes = YearExtremes::new();
        extremes.record(&bar(ts(4, 14, 0), dec!(100), dec!(1), true));
        extremes.record(&bar(ts(4, 15, 0), dec!(120), dec!(1), true));
        extremes.record(&bar(ts(5, 14, 0), dec!(90), dec!(1), true));

        let (high, low) = extremes.extremes(&"AAPL".into()).unwrap();
        assert_eq!(high, Price::new(dec!(121)));
        assert_eq!(low, Price::new(dec!(89)));
    }

    #[test]
    fn test_year_extremes_ignores_open_bars() {
        let extremes = YearExtremes::new();
        extremes.record(&bar(ts(5, 14, 0), dec!(100), dec!(1), false));
        assert!(extremes.extremes(&"AAPL".into()).is_none());
    }

    #[test]
    fn test_year_extremes_retention() {
        let extremes = YearExtremes::with_retention(1);
        extremes.record(&bar(ts(1, 14, 0), dec!(500), dec!(1), true));
        extremes.record(&bar(ts(5, 14, 0), dec!(100), dec!(1), true));

        let (high, _) = extremes.extremes(&"AAPL".into()).unwrap();
        assert_eq!(high, Price::new(dec!(101)));
    }
}
