//! Daemon configuration.
//!
//! Loaded from TOML; every section has serde defaults so a minimal file
//! (markets plus symbols) is enough to run. Market entries are parsed
//! into `MarketDefinition`s at startup and are immutable afterwards.

use crate::error::{AppError, AppResult};
use pulse_core::{CoreError, MarketDefinition};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// One market's trading calendar, as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketEntry {
    /// Exchange code (e.g. "US").
    pub exchange: String,
    /// IANA time zone name (e.g. "America/New_York").
    pub time_zone: String,
    /// Local open time, "HH:MM".
    pub open: String,
    /// Local close time, "HH:MM" (exclusive).
    pub close: String,
    /// Trading weekdays (e.g. ["Mon", "Tue", "Wed", "Thu", "Fri"]).
    pub weekdays: Vec<String>,
    /// Holiday dates, "YYYY-MM-DD".
    #[serde(default)]
    pub holidays: Vec<String>,
}

impl MarketEntry {
    /// Parse into the immutable runtime definition.
    pub fn to_definition(&self) -> Result<MarketDefinition, CoreError> {
        let time_zone = chrono_tz::Tz::from_str(&self.time_zone)
            .map_err(|_| CoreError::InvalidTimeZone(self.time_zone.clone()))?;
        let open_time = chrono::NaiveTime::parse_from_str(&self.open, "%H:%M")
            .map_err(|_| CoreError::InvalidTimeOfDay(self.open.clone()))?;
        let close_time = chrono::NaiveTime::parse_from_str(&self.close, "%H:%M")
            .map_err(|_| CoreError::InvalidTimeOfDay(self.close.clone()))?;

        let trading_days = self
            .weekdays
            .iter()
            .map(|day| {
                chrono::Weekday::from_str(day)
                    .map_err(|_| CoreError::InvalidWeekday(day.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let holidays = self
            .holidays
            .iter()
            .map(|date| {
                chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .map_err(|_| CoreError::InvalidDate(date.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if trading_days.is_empty() {
            return Err(CoreError::InvalidMarket(format!(
                "{}: no trading weekdays",
                self.exchange
            )));
        }

        Ok(MarketDefinition {
            exchange: self.exchange.as_str().into(),
            time_zone,
            open_time,
            close_time,
            trading_days,
            holidays,
        })
    }
}

/// Heartbeat driver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Driver tick period (ms).
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Per-job execution budget (ms).
    #[serde(default = "default_job_timeout_ms")]
    pub job_timeout_ms: u64,
}

fn default_tick_ms() -> u64 {
    1_000
}

fn default_job_timeout_ms() -> u64 {
    30_000
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            job_timeout_ms: default_job_timeout_ms(),
        }
    }
}

/// Feed freshness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Quotes older than this are treated as "no data" (ms).
    #[serde(default = "default_freshness_ms")]
    pub freshness_ms: i64,
}

fn default_freshness_ms() -> i64 {
    5_000
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            freshness_ms: default_freshness_ms(),
        }
    }
}

/// Bar aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarsConfig {
    /// Aggregation period (seconds).
    #[serde(default = "default_bar_period_secs")]
    pub period_secs: i64,
    /// Closed bars retained per symbol.
    #[serde(default = "default_max_closed_per_symbol")]
    pub max_closed_per_symbol: usize,
}

fn default_bar_period_secs() -> i64 {
    60
}

fn default_max_closed_per_symbol() -> usize {
    2_880 // 48 hours of minute bars
}

impl Default for BarsConfig {
    fn default() -> Self {
        Self {
            period_secs: default_bar_period_secs(),
            max_closed_per_symbol: default_max_closed_per_symbol(),
        }
    }
}

/// Per-job cadences and cache TTLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,
    #[serde(default = "default_status_ttl_secs")]
    pub status_ttl_secs: u64,

    #[serde(default = "default_ingest_interval_secs")]
    pub ingest_interval_secs: u64,
    #[serde(default = "default_quote_ttl_secs")]
    pub quote_ttl_secs: u64,

    #[serde(default = "default_bar_flush_interval_secs")]
    pub bar_flush_interval_secs: u64,
    #[serde(default = "default_bar_ttl_secs")]
    pub bar_ttl_secs: u64,

    #[serde(default = "default_rolling_interval_secs")]
    pub rolling_interval_secs: u64,
    #[serde(default = "default_stat_ttl_secs")]
    pub stat_ttl_secs: u64,
    #[serde(default = "default_vwap_window_minutes")]
    pub vwap_window_minutes: u32,

    #[serde(default = "default_grading_interval_secs")]
    pub grading_interval_secs: u64,
    #[serde(default = "default_grade_ttl_secs")]
    pub grade_ttl_secs: u64,
}

fn default_status_interval_secs() -> u64 {
    5
}

fn default_status_ttl_secs() -> u64 {
    86_400
}

fn default_ingest_interval_secs() -> u64 {
    1
}

fn default_quote_ttl_secs() -> u64 {
    10
}

fn default_bar_flush_interval_secs() -> u64 {
    5
}

fn default_bar_ttl_secs() -> u64 {
    86_400
}

fn default_rolling_interval_secs() -> u64 {
    30
}

fn default_stat_ttl_secs() -> u64 {
    120
}

fn default_vwap_window_minutes() -> u32 {
    30
}

fn default_grading_interval_secs() -> u64 {
    60
}

fn default_grade_ttl_secs() -> u64 {
    3_600
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            status_interval_secs: default_status_interval_secs(),
            status_ttl_secs: default_status_ttl_secs(),
            ingest_interval_secs: default_ingest_interval_secs(),
            quote_ttl_secs: default_quote_ttl_secs(),
            bar_flush_interval_secs: default_bar_flush_interval_secs(),
            bar_ttl_secs: default_bar_ttl_secs(),
            rolling_interval_secs: default_rolling_interval_secs(),
            stat_ttl_secs: default_stat_ttl_secs(),
            vwap_window_minutes: default_vwap_window_minutes(),
            grading_interval_secs: default_grading_interval_secs(),
            grade_ttl_secs: default_grade_ttl_secs(),
        }
    }
}

/// Grading thresholds and governing exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingConfig {
    /// Exchange whose session calendar governs the graded symbols.
    #[serde(default = "default_grading_exchange")]
    pub exchange: String,
    /// Moves at or beyond this magnitude (percent) are Strong.
    #[serde(default = "default_strong_pct")]
    pub strong_pct: Decimal,
    /// Moves within this magnitude (percent) are Flat.
    #[serde(default = "default_flat_pct")]
    pub flat_pct: Decimal,
}

fn default_grading_exchange() -> String {
    "US".to_string()
}

fn default_strong_pct() -> Decimal {
    Decimal::TWO
}

fn default_flat_pct() -> Decimal {
    Decimal::new(2, 1) // 0.2
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            exchange: default_grading_exchange(),
            strong_pct: default_strong_pct(),
            flat_pct: default_flat_pct(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level filter when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tracked markets.
    pub markets: Vec<MarketEntry>,
    /// Subscribed instrument symbols.
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub bars: BarsConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub grading: GradingConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// When set, jobs write cache entries but skip publishes.
    #[serde(default)]
    pub suppress_publish: bool,
}

impl AppConfig {
    /// Load configuration from `PULSE_CONFIG` or the default path.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("PULSE_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Parse every market entry into its runtime definition.
    pub fn market_definitions(&self) -> AppResult<Vec<MarketDefinition>> {
        self.markets
            .iter()
            .map(|entry| entry.to_definition().map_err(AppError::Core))
            .collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            markets: vec![MarketEntry {
                exchange: "US".to_string(),
                time_zone: "America/New_York".to_string(),
                open: "09:30".to_string(),
                close: "16:00".to_string(),
                weekdays: ["Mon", "Tue", "Wed", "Thu", "Fri"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                holidays: Vec::new(),
            }],
            symbols: Vec::new(),
            heartbeat: HeartbeatConfig::default(),
            feed: FeedConfig::default(),
            bars: BarsConfig::default(),
            jobs: JobsConfig::default(),
            grading: GradingConfig::default(),
            telemetry: TelemetryConfig::default(),
            suppress_publish: false,
        }
    }
}
