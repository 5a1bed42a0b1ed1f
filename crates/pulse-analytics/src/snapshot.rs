//! Session-open price snapshots.
//!
//! One snapshot per symbol per session date, captured on the first
//! opportunity after the market opens and never overwritten within the
//! same session.

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use pulse_core::{Price, SymbolId};
use serde::{Deserialize, Serialize};

/// Price captured at (or near) session open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenSnapshot {
    pub symbol: SymbolId,
    pub price: Price,
    pub session_date: NaiveDate,
    pub captured_at: DateTime<Utc>,
}

/// Per-symbol snapshot store.
#[derive(Default)]
pub struct SnapshotStore {
    snapshots: DashMap<SymbolId, OpenSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture a snapshot unless one already exists for this session
    /// date. A snapshot from an earlier session is replaced.
    ///
    /// Returns true if a snapshot was captured.
    pub fn capture_if_absent(
        &self,
        symbol: &SymbolId,
        price: Price,
        session_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> bool {
        let mut captured = false;
        self.snapshots
            .entry(symbol.clone())
            .and_modify(|existing| {
                if existing.session_date < session_date {
                    *existing = OpenSnapshot {
                        symbol: symbol.clone(),
                        price,
                        session_date,
                        captured_at: now,
                    };
                    captured = true;
                }
            })
            .or_insert_with(|| {
                captured = true;
                OpenSnapshot {
                    symbol: symbol.clone(),
                    price,
                    session_date,
                    captured_at: now,
                }
            });
        captured
    }

    /// The snapshot for a symbol's session date, if captured.
    pub fn get(&self, symbol: &SymbolId, session_date: NaiveDate) -> Option<OpenSnapshot> {
        self.snapshots
            .get(symbol)
            .filter(|snap| snap.session_date == session_date)
            .map(|snap| snap.clone())
    }
}
