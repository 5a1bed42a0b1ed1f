//! The job contract and per-tick execution context.

use crate::error::JobResult;
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use pulse_core::MarketDefinition;
use pulse_feed::QuoteFeed;
use pulse_gateway::Gateway;
use std::sync::Arc;
use std::time::Duration;

/// Default due policy: due if never run, or if a full interval has
/// elapsed since the last attempt.
pub fn due_by_interval(
    interval: Duration,
    now: DateTime<Utc>,
    last_run: Option<DateTime<Utc>>,
) -> bool {
    match last_run {
        None => true,
        Some(last) => {
            let interval = TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX);
            now.signed_duration_since(last) >= interval
        }
    }
}

/// Per-tick execution context handed to each job.
///
/// Carries the instant the tick was captured at, the external
/// boundaries a job may touch, and the explicit publish-suppression
/// flag (scoped through the context, never ambient state).
#[derive(Clone)]
pub struct JobContext {
    /// Instant captured at the start of the tick.
    pub now: DateTime<Utc>,
    /// Cache/broadcast gateway.
    pub gateway: Arc<dyn Gateway>,
    /// External quote source.
    pub feed: Arc<dyn QuoteFeed>,
    /// Market definitions, immutable for the scheduling cycle.
    pub markets: Arc<Vec<MarketDefinition>>,
    /// When set, jobs write cache entries but skip publishes.
    pub suppress_publish: bool,
}

/// Everything a `JobContext` needs except the tick instant.
#[derive(Clone)]
pub struct ContextSeed {
    pub gateway: Arc<dyn Gateway>,
    pub feed: Arc<dyn QuoteFeed>,
    pub markets: Arc<Vec<MarketDefinition>>,
    pub suppress_publish: bool,
}

impl ContextSeed {
    /// Materialize the context for one tick.
    pub fn at(&self, now: DateTime<Utc>) -> JobContext {
        JobContext {
            now,
            gateway: self.gateway.clone(),
            feed: self.feed.clone(),
            markets: self.markets.clone(),
            suppress_publish: self.suppress_publish,
        }
    }
}

/// A unit of recurring, interval-gated work.
#[async_trait]
pub trait Job: Send + Sync {
    /// Unique job name; the registry rejects duplicates.
    fn name(&self) -> &str;

    /// Preferred cadence. The composition root passes this to
    /// `JobRegistry::register`.
    fn interval(&self) -> Duration;

    /// Pure due-predicate. The default is the interval policy; an
    /// override may add further gating (e.g. refuse to run while every
    /// market is closed) but must AND it onto `due_by_interval` and
    /// stay side-effect-free.
    fn should_run(&self, now: DateTime<Utc>, last_run: Option<DateTime<Utc>>) -> bool {
        due_by_interval(self.interval(), now, last_run)
    }

    /// Perform the job's work. Side effects are limited to gateway
    /// writes and feed reads; any error is isolated at the scheduler's
    /// per-job boundary.
    async fn run(&self, ctx: JobContext) -> JobResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, secs).unwrap()
    }

    #[test]
    fn test_due_when_never_run() {
        assert!(due_by_interval(Duration::from_secs(10), ts(0), None));
    }

    #[test]
    fn test_not_due_within_interval() {
        assert!(!due_by_interval(
            Duration::from_secs(10),
            ts(9),
            Some(ts(0))
        ));
    }

    #[test]
    fn test_due_at_exact_interval() {
        assert!(due_by_interval(
            Duration::from_secs(10),
            ts(10),
            Some(ts(0))
        ));
    }

    #[test]
    fn test_due_after_interval() {
        assert!(due_by_interval(
            Duration::from_secs(10),
            ts(25),
            Some(ts(0))
        ));
    }
}
