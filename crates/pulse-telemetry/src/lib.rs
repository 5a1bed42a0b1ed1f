//! Prometheus metrics and structured logging.
//!
//! Observability for the heartbeat engine:
//! - Prometheus metrics for job attempts, failures, timeouts, status
//!   transitions, and gateway traffic
//! - Structured JSON logging with tracing

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
