//! Core domain types for the pulse market-state service.
//!
//! This crate provides the fundamental types used throughout the system:
//! - `ExchangeCode`, `SymbolId`: identifiers for markets and instruments
//! - `Price`, `Size`: precision-safe numeric types
//! - `MarketDefinition`, `MarketStatus`: trading-calendar model
//! - `Quote`, `Bar`: tick input and intraday aggregation unit
//! - `clock`: the pure session-state function over market definitions

pub mod clock;
pub mod decimal;
pub mod error;
pub mod market;
pub mod types;

pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use market::{ExchangeCode, MarketDefinition, MarketStatus, SessionStatus, SymbolId};
pub use types::{Bar, Quote};
