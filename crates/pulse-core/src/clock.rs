//! Market clock: pure session-state derivation.
//!
//! Maps `(MarketDefinition, instant)` to a trading-session state. No
//! hidden state: identical inputs always produce identical output.
//!
//! Rules:
//! - The instant is converted to the market's local time zone first.
//! - Non-trading weekdays and holiday dates are CLOSED all day.
//! - Regular sessions are open over the half-open interval
//!   `[open_time, close_time)` — the close instant itself is CLOSED.
//! - Overnight sessions (`open_time > close_time`) wrap across the local
//!   date boundary: open iff `local >= open_time || local < close_time`.

use crate::market::{MarketDefinition, MarketStatus, SessionStatus};
use chrono::{DateTime, Datelike, Utc};

/// Compute the session state of a market at an instant.
pub fn session_at(def: &MarketDefinition, now: DateTime<Utc>) -> SessionStatus {
    let local = now.with_timezone(&def.time_zone);

    if !def.trading_days.contains(&local.weekday()) {
        return SessionStatus::Closed;
    }
    if def.holidays.contains(&local.date_naive()) {
        return SessionStatus::Closed;
    }

    let time = local.time();
    let open = if def.is_overnight() {
        time >= def.open_time || time < def.close_time
    } else {
        time >= def.open_time && time < def.close_time
    };

    if open {
        SessionStatus::Open
    } else {
        SessionStatus::Closed
    }
}

/// Compute the full derived status value for a market at an instant.
pub fn status_at(def: &MarketDefinition, now: DateTime<Utc>) -> MarketStatus {
    MarketStatus {
        exchange: def.exchange.clone(),
        status: session_at(def, now),
        as_of: now,
    }
}

/// Whether any of the given markets is open at an instant.
pub fn any_open(defs: &[MarketDefinition], now: DateTime<Utc>) -> bool {
    defs.iter()
        .any(|def| session_at(def, now) == SessionStatus::Open)
}
