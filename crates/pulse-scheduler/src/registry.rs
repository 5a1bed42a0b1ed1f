//! Job registry: descriptors and last-run bookkeeping.

use crate::error::{SchedulerError, SchedulerResult};
use crate::job::Job;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Bookkeeping record for one registered job.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    /// Unique job name.
    pub name: String,
    /// Registered cadence.
    pub interval: Duration,
    /// Instant of the last attempted execution, success or failure.
    pub last_run: Option<DateTime<Utc>>,
}

struct RegisteredJob {
    job: Arc<dyn Job>,
    descriptor: JobDescriptor,
}

/// The authoritative set of registered jobs.
///
/// Registration order is preserved: `due_jobs` returns due jobs in the
/// order they were registered, which is also their execution order
/// within a tick. Descriptors are never removed during the process
/// lifetime.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Vec<RegisteredJob>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    /// Register a job under its unique name with the given cadence.
    ///
    /// Fails with `DuplicateJobName` if the name is taken and
    /// `InvalidInterval` for a zero interval; both are fatal to
    /// startup.
    pub fn register(&mut self, job: Arc<dyn Job>, interval: Duration) -> SchedulerResult<String> {
        let name = job.name().to_string();
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval(name));
        }
        if self.jobs.iter().any(|r| r.descriptor.name == name) {
            return Err(SchedulerError::DuplicateJobName(name));
        }

        info!(job = %name, interval_secs = interval.as_secs(), "Registered job");
        self.jobs.push(RegisteredJob {
            job,
            descriptor: JobDescriptor {
                name: name.clone(),
                interval,
                last_run: None,
            },
        });
        Ok(name)
    }

    /// Jobs due at `now`, in registration order.
    pub fn due_jobs(&self, now: DateTime<Utc>) -> Vec<Arc<dyn Job>> {
        self.jobs
            .iter()
            .filter(|r| r.job.should_run(now, r.descriptor.last_run))
            .map(|r| r.job.clone())
            .collect()
    }

    /// Record an attempted execution.
    ///
    /// Called exactly once per attempt regardless of outcome, so a
    /// failing job is retried only after its full interval elapses.
    pub fn mark_ran(&mut self, name: &str, at: DateTime<Utc>) {
        if let Some(reg) = self.jobs.iter_mut().find(|r| r.descriptor.name == name) {
            reg.descriptor.last_run = Some(at);
        }
    }

    /// Descriptor snapshot for a job.
    pub fn descriptor(&self, name: &str) -> Option<JobDescriptor> {
        self.jobs
            .iter()
            .find(|r| r.descriptor.name == name)
            .map(|r| r.descriptor.clone())
    }

    /// Registered job names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.jobs
            .iter()
            .map(|r| r.descriptor.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
