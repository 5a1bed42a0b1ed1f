//! Intraday aggregation and rolling-window analytics.
//!
//! - `BarBook`: in-progress and closed bars per symbol, with idempotent
//!   period flushing and bounded retention
//! - `window`: VWAP, 24-hour delta, and 52-week extreme computations
//!   over closed bars only
//! - `snapshot`: session-open price snapshots
//! - `grading`: session performance classification

pub mod bar_book;
pub mod grading;
pub mod snapshot;
pub mod window;

pub use bar_book::BarBook;
pub use grading::{GradeThresholds, SessionGrade};
pub use snapshot::{OpenSnapshot, SnapshotStore};
pub use window::{delta_24h, rolling_vwap, YearExtremes};
