//! In-progress and closed bar bookkeeping per symbol.
//!
//! Quotes fold into the in-progress bar for their period; on rollover
//! (observed through a later-period quote or an explicit flush) the bar
//! is closed, appended to the per-symbol history, and never mutated
//! again. At most one closed bar exists per `(symbol, period_start)`
//! regardless of how often flushing re-executes within a period.

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use pulse_core::types::period_start_of;
use pulse_core::{Bar, Quote, SymbolId};
use std::collections::VecDeque;
use tracing::trace;

/// Shared intraday bar state.
pub struct BarBook {
    period: TimeDelta,
    max_closed_per_symbol: usize,
    live: DashMap<SymbolId, Bar>,
    closed: DashMap<SymbolId, VecDeque<Bar>>,
    /// Bars closed since the last flush, whichever path closed them.
    pending: Mutex<Vec<Bar>>,
}

impl BarBook {
    /// Create a bar book aggregating over `period`, retaining at most
    /// `max_closed_per_symbol` closed bars per symbol.
    pub fn new(period: TimeDelta, max_closed_per_symbol: usize) -> Self {
        Self {
            period,
            max_closed_per_symbol,
            live: DashMap::new(),
            closed: DashMap::new(),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// The aggregation period.
    pub fn period(&self) -> TimeDelta {
        self.period
    }

    /// Fold a quote into the in-progress bar for its period.
    ///
    /// Quotes belonging to an already-closed period are dropped; they
    /// can neither reopen a closed bar nor create a duplicate.
    pub fn apply_quote(&self, quote: &Quote) {
        let start = period_start_of(quote.timestamp, self.period);

        if let Some(history) = self.closed.get(&quote.symbol) {
            if let Some(last) = history.back() {
                if start <= last.period_start {
                    trace!(symbol = %quote.symbol, %start, "Dropping quote for closed period");
                    return;
                }
            }
        }

        match self.live.entry(quote.symbol.clone()) {
            Entry::Occupied(mut occupied) => {
                let bar = occupied.get_mut();
                if start == bar.period_start {
                    bar.apply(quote);
                } else if start > bar.period_start {
                    // Rollover observed through the data itself.
                    let mut done = std::mem::replace(bar, Bar::open_from(quote, start));
                    done.mark_closed();
                    self.push_closed(done);
                } else {
                    trace!(symbol = %quote.symbol, %start, "Dropping out-of-order quote");
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Bar::open_from(quote, start));
            }
        }
    }

    /// Close every in-progress bar whose period has elapsed at `now`
    /// and return all bars closed since the last flush, including those
    /// closed by quote rollover. Idempotent: re-running within the same
    /// period yields nothing further.
    pub fn flush(&self, now: DateTime<Utc>) -> Vec<Bar> {
        let due: Vec<SymbolId> = self
            .live
            .iter()
            .filter(|entry| entry.value().period_start + self.period <= now)
            .map(|entry| entry.key().clone())
            .collect();

        for symbol in due {
            if let Some((_, mut bar)) = self
                .live
                .remove_if(&symbol, |_, bar| bar.period_start + self.period <= now)
            {
                bar.mark_closed();
                self.push_closed(bar);
            }
        }

        std::mem::take(&mut *self.pending.lock())
    }

    fn push_closed(&self, bar: Bar) {
        let mut history = self.closed.entry(bar.symbol.clone()).or_default();
        if let Some(last) = history.back() {
            if bar.period_start <= last.period_start {
                trace!(symbol = %bar.symbol, "Dropping duplicate closed bar");
                return;
            }
        }
        history.push_back(bar.clone());
        while history.len() > self.max_closed_per_symbol {
            history.pop_front();
        }
        self.pending.lock().push(bar);
    }

    /// Closed bars for a symbol, oldest first.
    pub fn closed_bars(&self, symbol: &SymbolId) -> Vec<Bar> {
        self.closed
            .get(symbol)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The in-progress bar for a symbol, if any.
    pub fn live_bar(&self, symbol: &SymbolId) -> Option<Bar> {
        self.live.get(symbol).map(|bar| bar.clone())
    }

    /// Symbols with any closed history.
    pub fn symbols(&self) -> Vec<SymbolId> {
        self.closed.iter().map(|entry| entry.key().clone()).collect()
    }
}
