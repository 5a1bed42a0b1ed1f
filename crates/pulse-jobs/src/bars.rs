//! Bar flushing.
//!
//! Closes in-progress bars whose period has elapsed, feeds the daily
//! extremes tracker, and writes each newly closed bar to the gateway as
//! an immutable record. Idempotent under re-execution: the bar book
//! guarantees at most one closed bar per (symbol, period).

use async_trait::async_trait;
use pulse_analytics::{BarBook, YearExtremes};
use pulse_gateway::keys;
use pulse_scheduler::{Job, JobContext, JobResult};
use pulse_telemetry::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// The bar flush job.
pub struct BarFlushJob {
    interval: Duration,
    bar_ttl: Duration,
    bars: Arc<BarBook>,
    extremes: Arc<YearExtremes>,
}

impl BarFlushJob {
    pub const NAME: &'static str = "bar_flush";

    pub fn new(
        interval: Duration,
        bar_ttl: Duration,
        bars: Arc<BarBook>,
        extremes: Arc<YearExtremes>,
    ) -> Self {
        Self {
            interval,
            bar_ttl,
            bars,
            extremes,
        }
    }
}

#[async_trait]
impl Job for BarFlushJob {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, ctx: JobContext) -> JobResult<()> {
        let closed = self.bars.flush(ctx.now);
        if closed.is_empty() {
            return Ok(());
        }

        for bar in &closed {
            self.extremes.record(bar);
            Metrics::bar_closed(bar.symbol.as_str());

            let key = keys::closed_bar(&bar.symbol, bar.period_start);
            let payload = serde_json::to_string(bar)?;
            if let Err(e) = ctx.gateway.set(&key, payload, self.bar_ttl).await {
                warn!(symbol = %bar.symbol, error = %e, "Bar write dropped");
                continue;
            }
            Metrics::gateway_write("bar");
        }

        debug!(count = closed.len(), "Flushed bars");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use pulse_core::{MarketDefinition, Price, Quote, Size};
    use pulse_feed::FeedState;
    use pulse_gateway::{Gateway, MemoryGateway};
    use rust_decimal_macros::dec;

    fn ts(m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 5, 14, m, s).unwrap()
    }

    fn quote(at: DateTime<Utc>) -> Quote {
        Quote {
            symbol: "AAPL".into(),
            bid: Price::new(dec!(100)),
            ask: Price::new(dec!(100)),
            last: Price::new(dec!(100)),
            volume: Size::new(dec!(10)),
            timestamp: at,
        }
    }

    fn ctx(gateway: Arc<MemoryGateway>, now: DateTime<Utc>) -> JobContext {
        JobContext {
            now,
            gateway,
            feed: Arc::new(FeedState::new(5_000)),
            markets: Arc::new(Vec::<MarketDefinition>::new()),
            suppress_publish: false,
        }
    }

    fn job(bars: Arc<BarBook>, extremes: Arc<YearExtremes>) -> BarFlushJob {
        BarFlushJob::new(
            Duration::from_secs(5),
            Duration::from_secs(86_400),
            bars,
            extremes,
        )
    }

    #[tokio::test]
    async fn test_flush_writes_closed_bar_once() {
        let gateway = Arc::new(MemoryGateway::new());
        let bars = Arc::new(BarBook::new(TimeDelta::minutes(1), 100));
        let extremes = Arc::new(YearExtremes::new());
        bars.apply_quote(&quote(ts(30, 10)));

        let flush = job(bars.clone(), extremes.clone());
        flush.run(ctx(gateway.clone(), ts(31, 0))).await.unwrap();

        let key = keys::closed_bar(&"AAPL".into(), ts(30, 0));
        assert!(gateway.get(&key).await.unwrap().is_some());
        assert!(extremes.extremes(&"AAPL".into()).is_some());

        // Re-execution within the same period closes nothing more.
        let entries_before = gateway.len();
        flush.run(ctx(gateway.clone(), ts(31, 30))).await.unwrap();
        assert_eq!(gateway.len(), entries_before);
        assert_eq!(bars.closed_bars(&"AAPL".into()).len(), 1);
    }

    #[tokio::test]
    async fn test_flush_with_no_elapsed_bars_is_noop() {
        let gateway = Arc::new(MemoryGateway::new());
        let bars = Arc::new(BarBook::new(TimeDelta::minutes(1), 100));
        bars.apply_quote(&quote(ts(30, 10)));

        job(bars, Arc::new(YearExtremes::new()))
            .run(ctx(gateway.clone(), ts(30, 40)))
            .await
            .unwrap();
        assert!(gateway.is_empty());
    }
}
