//! Application composition root.
//!
//! Constructs the shared state (gateway, feed, bar book, snapshot
//! store), builds each job by value, registers them in a fixed order,
//! and hands the registry to the heartbeat scheduler. Registration is
//! explicit — there is no self-registering job machinery.

use crate::config::AppConfig;
use crate::error::AppResult;
use chrono::TimeDelta;
use pulse_analytics::{BarBook, GradeThresholds, SnapshotStore, YearExtremes};
use pulse_core::SymbolId;
use pulse_feed::FeedState;
use pulse_gateway::MemoryGateway;
use pulse_jobs::{BarFlushJob, MarketStatusJob, RollingStatsJob, SessionGradeJob, TickIngestJob};
use pulse_scheduler::{ContextSeed, HeartbeatScheduler, Job, JobRegistry, SchedulerConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The assembled daemon.
pub struct Application {
    scheduler: Arc<HeartbeatScheduler>,
    gateway: Arc<MemoryGateway>,
    feed: Arc<FeedState>,
}

impl Application {
    /// Build every component and register the job set.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let markets = Arc::new(config.market_definitions()?);
        let symbols: Arc<Vec<SymbolId>> = Arc::new(
            config
                .symbols
                .iter()
                .map(|s| SymbolId::new(s.clone()))
                .collect(),
        );

        let gateway = Arc::new(MemoryGateway::new());
        let feed = Arc::new(FeedState::new(config.feed.freshness_ms));
        let bars = Arc::new(BarBook::new(
            TimeDelta::seconds(config.bars.period_secs),
            config.bars.max_closed_per_symbol,
        ));
        let extremes = Arc::new(YearExtremes::new());
        let snapshots = Arc::new(SnapshotStore::new());

        let jobs = &config.jobs;
        let mut registry = JobRegistry::new();

        let status_job: Arc<dyn Job> = Arc::new(MarketStatusJob::new(
            Duration::from_secs(jobs.status_interval_secs),
            Duration::from_secs(jobs.status_ttl_secs),
        ));
        let ingest_job: Arc<dyn Job> = Arc::new(TickIngestJob::new(
            Duration::from_secs(jobs.ingest_interval_secs),
            Duration::from_secs(jobs.quote_ttl_secs),
            symbols.clone(),
            bars.clone(),
            markets.clone(),
        ));
        let flush_job: Arc<dyn Job> = Arc::new(BarFlushJob::new(
            Duration::from_secs(jobs.bar_flush_interval_secs),
            Duration::from_secs(jobs.bar_ttl_secs),
            bars.clone(),
            extremes.clone(),
        ));
        let rolling_job: Arc<dyn Job> = Arc::new(RollingStatsJob::new(
            Duration::from_secs(jobs.rolling_interval_secs),
            Duration::from_secs(jobs.stat_ttl_secs),
            jobs.vwap_window_minutes,
            symbols.clone(),
            bars.clone(),
            extremes.clone(),
        ));
        let grade_job: Arc<dyn Job> = Arc::new(SessionGradeJob::new(
            Duration::from_secs(jobs.grading_interval_secs),
            Duration::from_secs(jobs.grade_ttl_secs),
            config.grading.exchange.as_str().into(),
            GradeThresholds {
                strong_pct: config.grading.strong_pct,
                flat_pct: config.grading.flat_pct,
            },
            symbols.clone(),
            snapshots,
        ));

        // Registration order is execution order within a tick: status
        // first so downstream consumers see session state before data.
        for job in [status_job, ingest_job, flush_job, rolling_job, grade_job] {
            let interval = job.interval();
            registry.register(job, interval)?;
        }

        let seed = ContextSeed {
            gateway: gateway.clone(),
            feed: feed.clone(),
            markets: markets.clone(),
            suppress_publish: config.suppress_publish,
        };
        let scheduler = Arc::new(HeartbeatScheduler::new(
            registry,
            seed,
            SchedulerConfig {
                tick_period: Duration::from_millis(config.heartbeat.tick_ms),
                job_timeout: Duration::from_millis(config.heartbeat.job_timeout_ms),
            },
        ));

        info!(
            markets = markets.len(),
            symbols = symbols.len(),
            "Application assembled"
        );

        Ok(Self {
            scheduler,
            gateway,
            feed,
        })
    }

    /// The in-process gateway, for subscribers and embedders.
    pub fn gateway(&self) -> Arc<MemoryGateway> {
        self.gateway.clone()
    }

    /// The feed state external adapters push quotes into.
    pub fn feed(&self) -> Arc<FeedState> {
        self.feed.clone()
    }

    /// The heartbeat scheduler (exposed for tests driving ticks with a
    /// synthetic clock).
    pub fn scheduler(&self) -> Arc<HeartbeatScheduler> {
        self.scheduler.clone()
    }

    /// Token that requests cooperative shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.scheduler.shutdown_token()
    }

    /// Drive the heartbeat until ctrl-c or external cancellation.
    pub async fn run(self) -> AppResult<()> {
        let token = self.scheduler.shutdown_token();
        let driver = {
            let scheduler = self.scheduler.clone();
            tokio::spawn(async move { scheduler.run().await })
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }

        // Let the driver finish its in-flight job before returning.
        let _ = driver.await;
        info!("Daemon stopped");
        Ok(())
    }
}
