//! Rolling-window statistics.
//!
//! Recomputes VWAP, 24-hour delta, and 52-week extremes per symbol from
//! closed bars and writes each figure with a bounded TTL sized to how
//! stale it may become before the next scheduled recomputation.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use pulse_analytics::{delta_24h, rolling_vwap, BarBook, YearExtremes};
use pulse_core::{Price, SymbolId};
use pulse_gateway::keys;
use pulse_scheduler::{Job, JobContext, JobResult};
use pulse_telemetry::Metrics;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// VWAP figure published to the gateway.
#[derive(Debug, Serialize, Deserialize)]
pub struct VwapStat {
    pub symbol: SymbolId,
    pub window_minutes: u32,
    pub vwap: Price,
    pub as_of: DateTime<Utc>,
}

/// 24-hour change figure.
#[derive(Debug, Serialize, Deserialize)]
pub struct DayDeltaStat {
    pub symbol: SymbolId,
    pub pct_change: Decimal,
    pub as_of: DateTime<Utc>,
}

/// 52-week high/low figure.
#[derive(Debug, Serialize, Deserialize)]
pub struct YearExtremesStat {
    pub symbol: SymbolId,
    pub high: Price,
    pub low: Price,
    pub as_of: DateTime<Utc>,
}

/// The rolling-window capture job.
pub struct RollingStatsJob {
    interval: Duration,
    stat_ttl: Duration,
    vwap_window_minutes: u32,
    symbols: Arc<Vec<SymbolId>>,
    bars: Arc<BarBook>,
    extremes: Arc<YearExtremes>,
}

impl RollingStatsJob {
    pub const NAME: &'static str = "rolling_stats";

    pub fn new(
        interval: Duration,
        stat_ttl: Duration,
        vwap_window_minutes: u32,
        symbols: Arc<Vec<SymbolId>>,
        bars: Arc<BarBook>,
        extremes: Arc<YearExtremes>,
    ) -> Self {
        Self {
            interval,
            stat_ttl,
            vwap_window_minutes,
            symbols,
            bars,
            extremes,
        }
    }

    async fn write(&self, ctx: &JobContext, key: &str, payload: String, prefix: &str) {
        match ctx.gateway.set(key, payload, self.stat_ttl).await {
            Ok(()) => Metrics::gateway_write(prefix),
            Err(e) => warn!(key, error = %e, "Stat write dropped"),
        }
    }
}

#[async_trait]
impl Job for RollingStatsJob {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, ctx: JobContext) -> JobResult<()> {
        let window = TimeDelta::minutes(self.vwap_window_minutes as i64);

        for symbol in self.symbols.iter() {
            // Closed bars only; the in-progress bar never enters an
            // aggregate.
            let bars = self.bars.closed_bars(symbol);

            if let Some(vwap) = rolling_vwap(&bars, window, ctx.now) {
                let stat = VwapStat {
                    symbol: symbol.clone(),
                    window_minutes: self.vwap_window_minutes,
                    vwap,
                    as_of: ctx.now,
                };
                self.write(
                    &ctx,
                    &keys::rolling_vwap(symbol, self.vwap_window_minutes),
                    serde_json::to_string(&stat)?,
                    "rolling_vwap",
                )
                .await;
            }

            if let Some(pct_change) = delta_24h(&bars, ctx.now) {
                let stat = DayDeltaStat {
                    symbol: symbol.clone(),
                    pct_change,
                    as_of: ctx.now,
                };
                self.write(
                    &ctx,
                    &keys::day_delta(symbol),
                    serde_json::to_string(&stat)?,
                    "delta_24h",
                )
                .await;
            }

            if let Some((high, low)) = self.extremes.extremes(symbol) {
                let stat = YearExtremesStat {
                    symbol: symbol.clone(),
                    high,
                    low,
                    as_of: ctx.now,
                };
                self.write(
                    &ctx,
                    &keys::year_extremes(symbol),
                    serde_json::to_string(&stat)?,
                    "extremes_52w",
                )
                .await;
            }
        }

        Ok(())
    }
}
