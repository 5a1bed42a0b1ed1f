//! Concrete heartbeat jobs.
//!
//! Each job implements the `pulse_scheduler::Job` contract and owns one
//! slice of the gateway key space:
//! - `MarketStatusJob`: reconciles derived market status, writing and
//!   publishing only on transitions
//! - `TickIngestJob`: folds fresh quotes into in-progress bars and
//!   refreshes latest-quote entries
//! - `BarFlushJob`: closes elapsed bars and writes them once
//! - `RollingStatsJob`: VWAP, 24-hour delta, and 52-week extremes over
//!   closed bars
//! - `SessionGradeJob`: session-open snapshot capture and performance
//!   grading

pub mod bars;
pub mod grading;
pub mod ingest;
pub mod rolling;
pub mod status;

pub use bars::BarFlushJob;
pub use grading::SessionGradeJob;
pub use ingest::TickIngestJob;
pub use rolling::RollingStatsJob;
pub use status::MarketStatusJob;
