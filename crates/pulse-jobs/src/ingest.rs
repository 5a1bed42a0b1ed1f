//! Tick ingestion.
//!
//! Pulls the latest fresh quote per subscribed symbol, folds it into
//! the in-progress bar, and refreshes the latest-quote cache entry.
//! Stale or missing feed data is treated as "no data": the symbol is
//! skipped and cached values stay untouched. A feed outage fails the
//! whole tick so nothing half-ingested is written.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_analytics::BarBook;
use pulse_core::{clock, MarketDefinition, SymbolId};
use pulse_gateway::keys;
use pulse_scheduler::{due_by_interval, Job, JobContext, JobResult};
use pulse_telemetry::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

/// The tick ingestion job.
pub struct TickIngestJob {
    interval: Duration,
    quote_ttl: Duration,
    symbols: Arc<Vec<SymbolId>>,
    bars: Arc<BarBook>,
    markets: Arc<Vec<MarketDefinition>>,
}

impl TickIngestJob {
    pub const NAME: &'static str = "tick_ingest";

    pub fn new(
        interval: Duration,
        quote_ttl: Duration,
        symbols: Arc<Vec<SymbolId>>,
        bars: Arc<BarBook>,
        markets: Arc<Vec<MarketDefinition>>,
    ) -> Self {
        Self {
            interval,
            quote_ttl,
            symbols,
            bars,
            markets,
        }
    }
}

#[async_trait]
impl Job for TickIngestJob {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    /// Session-aware gating: ingestion is pointless while every market
    /// is closed, so the interval policy is ANDed with an any-open
    /// check.
    fn should_run(&self, now: DateTime<Utc>, last_run: Option<DateTime<Utc>>) -> bool {
        due_by_interval(self.interval, now, last_run) && clock::any_open(&self.markets, now)
    }

    async fn run(&self, ctx: JobContext) -> JobResult<()> {
        for symbol in self.symbols.iter() {
            let quote = match ctx.feed.latest(symbol, ctx.now) {
                Ok(Some(quote)) => quote,
                Ok(None) => {
                    trace!(symbol = %symbol, "No fresh quote, skipping");
                    continue;
                }
                Err(e) => {
                    // Feed unreachable: skip this tick's work entirely
                    // and leave cached values untouched.
                    warn!(error = %e, "Feed unavailable, skipping tick");
                    return Err(e.into());
                }
            };

            self.bars.apply_quote(&quote);
            Metrics::quote_ingested(symbol.as_str());

            let payload = serde_json::to_string(&quote)?;
            if let Err(e) = ctx
                .gateway
                .set(&keys::latest_quote(symbol), payload, self.quote_ttl)
                .await
            {
                warn!(symbol = %symbol, error = %e, "Quote write dropped");
                continue;
            }
            Metrics::gateway_write("latest_quote");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeDelta, TimeZone, Weekday};
    use pulse_core::{Price, Quote, Size};
    use pulse_feed::{FeedError, FeedResult, FeedState, QuoteFeed};
    use pulse_gateway::{Gateway, MemoryGateway};
    use rust_decimal_macros::dec;

    fn utc_market() -> MarketDefinition {
        MarketDefinition {
            exchange: "US".into(),
            time_zone: chrono_tz::UTC,
            open_time: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            close_time: NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
            trading_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            holidays: Vec::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        // Wednesday.
        Utc.with_ymd_and_hms(2026, 8, 5, 14, 30, 30).unwrap()
    }

    fn quote(at: DateTime<Utc>) -> Quote {
        Quote {
            symbol: "AAPL".into(),
            bid: Price::new(dec!(99.99)),
            ask: Price::new(dec!(100.01)),
            last: Price::new(dec!(100)),
            volume: Size::new(dec!(10)),
            timestamp: at,
        }
    }

    fn job(bars: Arc<BarBook>, feed_markets: Arc<Vec<MarketDefinition>>) -> TickIngestJob {
        TickIngestJob::new(
            Duration::from_secs(1),
            Duration::from_secs(10),
            Arc::new(vec!["AAPL".into()]),
            bars,
            feed_markets,
        )
    }

    fn ctx(
        gateway: Arc<MemoryGateway>,
        feed: Arc<dyn QuoteFeed>,
        markets: Arc<Vec<MarketDefinition>>,
    ) -> JobContext {
        JobContext {
            now: now(),
            gateway,
            feed,
            markets,
            suppress_publish: false,
        }
    }

    #[tokio::test]
    async fn test_fresh_quote_ingested_and_cached() {
        let gateway = Arc::new(MemoryGateway::new());
        let feed = Arc::new(FeedState::new(5_000));
        feed.push(quote(now()));
        let bars = Arc::new(BarBook::new(TimeDelta::minutes(1), 100));
        let markets = Arc::new(vec![utc_market()]);

        job(bars.clone(), markets.clone())
            .run(ctx(gateway.clone(), feed, markets))
            .await
            .unwrap();

        assert!(bars.live_bar(&"AAPL".into()).is_some());
        let cached = gateway
            .get(&keys::latest_quote(&"AAPL".into()))
            .await
            .unwrap();
        assert!(cached.is_some());
    }

    #[tokio::test]
    async fn test_stale_quote_leaves_cache_untouched() {
        let gateway = Arc::new(MemoryGateway::new());
        let feed = Arc::new(FeedState::new(5_000));
        feed.push(quote(now() - TimeDelta::minutes(5)));
        let bars = Arc::new(BarBook::new(TimeDelta::minutes(1), 100));
        let markets = Arc::new(vec![utc_market()]);

        job(bars.clone(), markets.clone())
            .run(ctx(gateway.clone(), feed, markets))
            .await
            .unwrap();

        assert!(bars.live_bar(&"AAPL".into()).is_none());
        let cached = gateway
            .get(&keys::latest_quote(&"AAPL".into()))
            .await
            .unwrap();
        assert!(cached.is_none());
    }

    struct DownFeed;

    impl QuoteFeed for DownFeed {
        fn latest(&self, _symbol: &SymbolId, _now: DateTime<Utc>) -> FeedResult<Option<Quote>> {
            Err(FeedError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_feed_outage_fails_tick_without_writes() {
        let gateway = Arc::new(MemoryGateway::new());
        let bars = Arc::new(BarBook::new(TimeDelta::minutes(1), 100));
        let markets = Arc::new(vec![utc_market()]);

        let result = job(bars, markets.clone())
            .run(ctx(gateway.clone(), Arc::new(DownFeed), markets))
            .await;

        assert!(result.is_err());
        assert!(gateway.is_empty());
    }

    #[test]
    fn test_should_run_gated_on_open_markets() {
        let bars = Arc::new(BarBook::new(TimeDelta::minutes(1), 100));
        let markets = Arc::new(vec![utc_market()]);
        let ingest = job(bars, markets);

        // Wednesday: due and a market is open.
        assert!(ingest.should_run(now(), None));

        // Saturday: due by interval but every market closed.
        let saturday = Utc.with_ymd_and_hms(2026, 8, 8, 14, 30, 0).unwrap();
        assert!(!ingest.should_run(saturday, None));
    }
}
