//! Session performance grading.
//!
//! Captures a per-symbol snapshot on the first run after its market
//! opens, then classifies the current price against that snapshot into
//! a fixed label set. The snapshot is written once per session and
//! never mutated by classification runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pulse_analytics::{GradeThresholds, SessionGrade, SnapshotStore};
use pulse_core::{clock, ExchangeCode, Price, SessionStatus, SymbolId};
use pulse_gateway::keys;
use pulse_scheduler::{Job, JobContext, JobError, JobResult};
use pulse_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{trace, warn};

/// Grade record published to the gateway.
#[derive(Debug, Serialize, Deserialize)]
pub struct GradeStat {
    pub symbol: SymbolId,
    pub grade: SessionGrade,
    pub session_open: Price,
    pub last: Price,
    pub as_of: DateTime<Utc>,
}

/// The grading job.
///
/// Configured with the exchange whose session calendar governs its
/// symbols' session date.
pub struct SessionGradeJob {
    interval: Duration,
    grade_ttl: Duration,
    exchange: ExchangeCode,
    thresholds: GradeThresholds,
    symbols: Arc<Vec<SymbolId>>,
    snapshots: Arc<SnapshotStore>,
}

impl SessionGradeJob {
    pub const NAME: &'static str = "session_grade";

    pub fn new(
        interval: Duration,
        grade_ttl: Duration,
        exchange: ExchangeCode,
        thresholds: GradeThresholds,
        symbols: Arc<Vec<SymbolId>>,
        snapshots: Arc<SnapshotStore>,
    ) -> Self {
        Self {
            interval,
            grade_ttl,
            exchange,
            thresholds,
            symbols,
            snapshots,
        }
    }
}

#[async_trait]
impl Job for SessionGradeJob {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self, ctx: JobContext) -> JobResult<()> {
        let def = ctx
            .markets
            .iter()
            .find(|def| def.exchange == self.exchange)
            .ok_or_else(|| JobError::Task(format!("unknown exchange {}", self.exchange)))?;

        if clock::session_at(def, ctx.now) != SessionStatus::Open {
            trace!(exchange = %self.exchange, "Market closed, no grading");
            return Ok(());
        }
        let session_date = ctx.now.with_timezone(&def.time_zone).date_naive();

        for symbol in self.symbols.iter() {
            let quote = match ctx.feed.latest(symbol, ctx.now) {
                Ok(Some(quote)) => quote,
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, "Feed unavailable, skipping tick");
                    return Err(e.into());
                }
            };

            if self
                .snapshots
                .capture_if_absent(symbol, quote.last, session_date, ctx.now)
            {
                // First sight of this session: persist the snapshot so
                // readers can see the reference price.
                if let Some(snap) = self.snapshots.get(symbol, session_date) {
                    let payload = serde_json::to_string(&snap)?;
                    if let Err(e) = ctx
                        .gateway
                        .set(&keys::open_snapshot(symbol), payload, self.grade_ttl)
                        .await
                    {
                        warn!(symbol = %symbol, error = %e, "Snapshot write dropped");
                    } else {
                        Metrics::gateway_write("open_snapshot");
                    }
                }
            }

            let Some(snap) = self.snapshots.get(symbol, session_date) else {
                continue;
            };
            let Some(grade) = self.thresholds.classify(snap.price, quote.last) else {
                continue;
            };

            let stat = GradeStat {
                symbol: symbol.clone(),
                grade,
                session_open: snap.price,
                last: quote.last,
                as_of: ctx.now,
            };
            let payload = serde_json::to_string(&stat)?;
            if let Err(e) = ctx
                .gateway
                .set(&keys::session_grade(symbol), payload, self.grade_ttl)
                .await
            {
                warn!(symbol = %symbol, error = %e, "Grade write dropped");
                continue;
            }
            Metrics::gateway_write("session_grade");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone, Weekday};
    use pulse_core::{MarketDefinition, Quote, Size};
    use pulse_feed::FeedState;
    use pulse_gateway::{Gateway, MemoryGateway};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn us_market() -> MarketDefinition {
        MarketDefinition {
            exchange: "US".into(),
            time_zone: chrono_tz::America::New_York,
            open_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            close_time: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
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

    fn ny(h: u32, m: u32) -> DateTime<Utc> {
        // Wednesday 2026-08-05 in New York.
        chrono_tz::America::New_York
            .with_ymd_and_hms(2026, 8, 5, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn quote(last: Decimal, at: DateTime<Utc>) -> Quote {
        Quote {
            symbol: "AAPL".into(),
            bid: Price::new(last),
            ask: Price::new(last),
            last: Price::new(last),
            volume: Size::new(dec!(1)),
            timestamp: at,
        }
    }

    fn ctx(
        gateway: Arc<MemoryGateway>,
        feed: Arc<FeedState>,
        now: DateTime<Utc>,
    ) -> JobContext {
        JobContext {
            now,
            gateway,
            feed,
            markets: Arc::new(vec![us_market()]),
            suppress_publish: false,
        }
    }

    fn job(snapshots: Arc<SnapshotStore>) -> SessionGradeJob {
        SessionGradeJob::new(
            Duration::from_secs(60),
            Duration::from_secs(3_600),
            "US".into(),
            GradeThresholds::default(),
            Arc::new(vec!["AAPL".into()]),
            snapshots,
        )
    }

    async fn grade_of(gateway: &MemoryGateway) -> GradeStat {
        let json = gateway
            .get(&keys::session_grade(&"AAPL".into()))
            .await
            .unwrap()
            .unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[tokio::test]
    async fn test_snapshot_captured_then_grade_tracks_price() {
        let gateway = Arc::new(MemoryGateway::new());
        let feed = Arc::new(FeedState::new(600_000));
        let snapshots = Arc::new(SnapshotStore::new());
        let grader = job(snapshots);

        // First run just after the open captures the snapshot.
        feed.push(quote(dec!(100), ny(9, 31)));
        grader
            .run(ctx(gateway.clone(), feed.clone(), ny(9, 31)))
            .await
            .unwrap();
        assert_eq!(grade_of(&gateway).await.grade, SessionGrade::Flat);

        // Price rallies; the snapshot stays fixed at 100.
        feed.push(quote(dec!(103), ny(11, 0)));
        grader
            .run(ctx(gateway.clone(), feed.clone(), ny(11, 0)))
            .await
            .unwrap();
        let stat = grade_of(&gateway).await;
        assert_eq!(stat.grade, SessionGrade::StrongUp);
        assert_eq!(stat.session_open, Price::new(dec!(100)));
    }

    #[tokio::test]
    async fn test_closed_market_writes_nothing() {
        let gateway = Arc::new(MemoryGateway::new());
        let feed = Arc::new(FeedState::new(600_000));
        feed.push(quote(dec!(100), ny(8, 0)));

        job(Arc::new(SnapshotStore::new()))
            .run(ctx(gateway.clone(), feed, ny(8, 0)))
            .await
            .unwrap();
        assert!(gateway.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_exchange_is_task_error() {
        let gateway = Arc::new(MemoryGateway::new());
        let feed = Arc::new(FeedState::new(600_000));
        let grader = SessionGradeJob::new(
            Duration::from_secs(60),
            Duration::from_secs(3_600),
            "XX".into(),
            GradeThresholds::default(),
            Arc::new(vec!["AAPL".into()]),
            Arc::new(SnapshotStore::new()),
        );

        let result = grader.run(ctx(gateway, feed, ny(10, 0))).await;
        assert!(matches!(result, Err(JobError::Task(_))));
    }
}
