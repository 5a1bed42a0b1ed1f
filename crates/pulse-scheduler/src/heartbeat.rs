//! The heartbeat driver.
//!
//! A fixed-period tick drives the registry: capture `now`, collect due
//! jobs, execute each under isolation, record bookkeeping. Failures
//! (errors, panics, timeouts) are contained at the single-job boundary;
//! one job's outage never stalls another job or the driver itself.
//!
//! There is no queuing of missed ticks: if the driver is delayed, a job
//! simply becomes due on the next tick. Cadence is "at least every
//! interval", not "exactly every interval".

use crate::error::JobError;
use crate::job::{ContextSeed, Job};
use crate::registry::{JobDescriptor, JobRegistry};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pulse_telemetry::Metrics;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Driver configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Fixed period of the driver tick.
    pub tick_period: Duration,
    /// Per-job execution budget; a job exceeding it is aborted and
    /// treated as failed for that tick.
    pub job_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            job_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome counts for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
}

enum RunOutcome {
    Succeeded,
    Failed(JobError),
    Panicked,
    TimedOut,
}

/// The process-wide heartbeat scheduler.
pub struct HeartbeatScheduler {
    registry: Mutex<JobRegistry>,
    seed: ContextSeed,
    config: SchedulerConfig,
    shutdown: CancellationToken,
}

impl HeartbeatScheduler {
    pub fn new(registry: JobRegistry, seed: ContextSeed, config: SchedulerConfig) -> Self {
        Self {
            registry: Mutex::new(registry),
            seed,
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that requests cooperative shutdown: the in-flight job
    /// finishes (or times out), no new jobs start.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Bookkeeping snapshot for a job.
    pub fn descriptor(&self, name: &str) -> Option<JobDescriptor> {
        self.registry.lock().descriptor(name)
    }

    /// Drive the heartbeat until shutdown is requested.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.config.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            tick_ms = self.config.tick_period.as_millis() as u64,
            job_timeout_ms = self.config.job_timeout.as_millis() as u64,
            jobs = self.registry.lock().len(),
            "Heartbeat scheduler started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested, heartbeat stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let summary = self.run_tick(Utc::now()).await;
                    if summary.attempted > 0 {
                        debug!(
                            attempted = summary.attempted,
                            failed = summary.failed,
                            timed_out = summary.timed_out,
                            "Tick complete"
                        );
                    }
                }
            }
        }
    }

    /// Execute one tick of the algorithm at the given instant.
    ///
    /// Public so tests can drive the scheduler with a synthetic clock.
    pub async fn run_tick(&self, now: DateTime<Utc>) -> TickSummary {
        let due: Vec<(String, Arc<dyn Job>)> = {
            let registry = self.registry.lock();
            registry
                .due_jobs(now)
                .into_iter()
                .map(|job| (job.name().to_string(), job))
                .collect()
        };

        let mut summary = TickSummary::default();

        for (name, job) in due {
            if self.shutdown.is_cancelled() {
                debug!(job = %name, "Skipping job, shutdown in progress");
                break;
            }

            summary.attempted += 1;
            let started = Instant::now();
            let outcome = self.execute(job, now).await;
            let elapsed_ms = started.elapsed().as_millis() as f64;
            Metrics::job_duration(&name, elapsed_ms);

            match outcome {
                RunOutcome::Succeeded => {
                    summary.succeeded += 1;
                    Metrics::job_succeeded(&name);
                }
                RunOutcome::Failed(e) => {
                    summary.failed += 1;
                    Metrics::job_failed(&name);
                    warn!(job = %name, error = %e, "Job failed");
                }
                RunOutcome::Panicked => {
                    summary.failed += 1;
                    Metrics::job_failed(&name);
                    error!(job = %name, "Job panicked");
                }
                RunOutcome::TimedOut => {
                    summary.timed_out += 1;
                    Metrics::job_timed_out(&name);
                    warn!(
                        job = %name,
                        budget_ms = self.config.job_timeout.as_millis() as u64,
                        "Job exceeded execution budget, aborted"
                    );
                }
            }

            // Bookkeeping advances on every attempt, success or failure,
            // so a failing job retries only after its full interval.
            self.registry.lock().mark_ran(&name, now);
        }

        summary
    }

    /// Run one job inside a spawned task so that both panics and
    /// timeouts are contained at the single-job boundary.
    async fn execute(&self, job: Arc<dyn Job>, now: DateTime<Utc>) -> RunOutcome {
        let ctx = self.seed.at(now);
        let mut handle = tokio::spawn(async move { job.run(ctx).await });

        tokio::select! {
            joined = &mut handle => match joined {
                Ok(Ok(())) => RunOutcome::Succeeded,
                Ok(Err(e)) => RunOutcome::Failed(e),
                Err(_) => RunOutcome::Panicked,
            },
            _ = tokio::time::sleep(self.config.job_timeout) => {
                handle.abort();
                RunOutcome::TimedOut
            }
        }
    }
}
