//! Day-stepped streaming valuation over a ledger replay.
//!
//! One lot engine and one monotonic event cursor walk the active sequence
//! once; each calendar day applies the not-yet-applied events falling before
//! the day's exclusive end boundary, advances per-asset price cursors, and
//! emits a frozen valuation record. Incremental rebuilds replay everything
//! but emit only a trailing suffix, which must match a full rebuild exactly.

use crate::config::Settings;
use crate::domain::{AssetId, Decimal, EventId, LedgerEvent, PriceBook, PricePoint};
use crate::engine::LotEngine;
use crate::error::ReplayError;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Valuation of one held asset on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPosition {
    pub asset: AssetId,
    pub quantity: Decimal,
    pub market_value: Decimal,
    pub cost_basis: Decimal,
    pub unrealized_pnl: Decimal,
}

/// One frozen per-day valuation record. Never mutated after creation, only
/// regenerated wholesale or as a trailing suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub day: NaiveDate,
    pub total_value: Decimal,
    pub realized_pnl_to_date: Decimal,
    pub unrealized_pnl: Decimal,
    pub positions: Vec<SnapshotPosition>,
    /// Ids of events that happened on this day, in application order.
    pub event_markers: Vec<EventId>,
}

/// Snapshots plus the warnings accumulated while replaying; warnings are
/// surfaced, never dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotReport {
    pub snapshots: Vec<PortfolioSnapshot>,
    pub warnings: Vec<String>,
}

/// Window selection for a snapshot build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotWindow {
    /// Limit the window to the trailing `days_back` days before the last
    /// event day. `None` starts at the first event day.
    pub days_back: Option<i64>,
    /// Emit only snapshots from this day onward (incremental rebuild). All
    /// prior events are still replayed for correct lot state.
    pub emit_from: Option<NaiveDate>,
}

/// Streaming day-stepped snapshot builder.
pub struct SnapshotEngine {
    settings: Settings,
}

impl SnapshotEngine {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Produce one snapshot per day across the requested window.
    ///
    /// `active` must be the resolver's ordered active sequence. Returns an
    /// empty report when there are no active events.
    ///
    /// # Errors
    /// Propagates fatal replay faults from the lot engine.
    pub fn build(
        &self,
        active: &[LedgerEvent],
        prices: Vec<PricePoint>,
        window: &SnapshotWindow,
    ) -> Result<SnapshotReport, ReplayError> {
        let (Some(first), Some(last)) = (active.first(), active.last()) else {
            return Ok(SnapshotReport {
                snapshots: Vec::new(),
                warnings: Vec::new(),
            });
        };
        let first_day = first.timestamp.date_naive();
        let last_day = last.timestamp.date_naive();

        let mut window_start = first_day;
        if let Some(days_back) = window.days_back {
            let lower = last_day - Duration::days(days_back);
            if lower > window_start {
                window_start = lower;
            }
        }
        let emit_from = match window.emit_from {
            Some(day) => day.max(window_start),
            None => window_start,
        };
        debug!(%window_start, %last_day, %emit_from, "building snapshots");

        let mut engine = LotEngine::new(&self.settings);
        let mut prices = PriceBook::new(prices);
        let mut cursor = 0usize;
        let mut snapshots = Vec::new();

        let mut day = window_start;
        loop {
            let day_end = day_end_exclusive(day);
            // Latest instant that still belongs to this day.
            let price_bound = day_end - Duration::nanoseconds(1);

            let mut event_markers = Vec::new();
            while cursor < active.len() && active[cursor].timestamp < day_end {
                engine.apply_event(&active[cursor])?;
                // The first day also drains the pre-window backlog; only
                // same-day events become markers.
                if active[cursor].timestamp.date_naive() == day {
                    event_markers.push(active[cursor].id.clone());
                }
                cursor += 1;
            }

            let mut positions = Vec::new();
            let mut total_value = Decimal::zero();
            let mut unrealized_pnl = Decimal::zero();
            for position in engine.positions() {
                let market_value = match prices.advance_to(&position.asset, price_bound) {
                    Some(price) => position.quantity * price,
                    // No price known yet: fall back to cost so a freshly
                    // acquired asset does not show a phantom zero valuation.
                    None => position.cost_basis,
                };
                let unrealized = market_value - position.cost_basis;
                total_value += market_value;
                unrealized_pnl += unrealized;
                positions.push(SnapshotPosition {
                    asset: position.asset,
                    quantity: position.quantity,
                    market_value,
                    cost_basis: position.cost_basis,
                    unrealized_pnl: unrealized,
                });
            }

            if day >= emit_from {
                snapshots.push(PortfolioSnapshot {
                    day,
                    total_value,
                    realized_pnl_to_date: engine.realized_pnl_to_date(),
                    unrealized_pnl,
                    positions,
                    event_markers,
                });
            }

            if day == last_day {
                break;
            }
            day = day.succ_opt().expect("calendar overflow");
        }

        Ok(SnapshotReport {
            snapshots,
            warnings: engine.warnings().to_vec(),
        })
    }
}

/// Exclusive end boundary of a day: the next midnight UTC.
fn day_end_exclusive(day: NaiveDate) -> DateTime<Utc> {
    day.succ_opt()
        .expect("calendar overflow")
        .and_hms_opt(0, 0, 0)
        .expect("midnight is valid")
        .and_utc()
}
