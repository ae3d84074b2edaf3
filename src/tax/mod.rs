//! Year-scoped tax reporting over one full replay.
//!
//! Disposals are filtered by their derived tax year, income events by their
//! timestamp, and year-end holdings come from a second replay truncated at
//! the year boundary. Jurisdiction profiles may force the lot method; the
//! constraint is applied before replay.

use crate::config::{LotMethod, Settings};
use crate::domain::{AssetId, Decimal, EventId, LedgerEvent};
use crate::engine::{income_value, Disposal, LotEngine, Position};
use crate::error::ReplayError;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod export;

/// One income event (reward family) inside the report year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRow {
    pub event_id: EventId,
    pub asset: AssetId,
    pub timestamp: DateTime<Utc>,
    pub quantity: Decimal,
    /// Base-currency income value: zero or fair value, mirroring the lot
    /// engine's acquisition-cost rule.
    pub value_base: Decimal,
}

/// Decimal sums over the report's filtered rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxTotals {
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    pub fees: Decimal,
    pub realized_gain: Decimal,
    pub income: Decimal,
}

/// The full report for one calendar tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxYearReport {
    pub year: i32,
    pub lot_method: LotMethod,
    pub disposals: Vec<Disposal>,
    pub income: Vec<IncomeRow>,
    /// Positions as of the last event at or before December 31 of the year.
    pub holdings: Vec<Position>,
    pub totals: TaxTotals,
    pub warnings: Vec<String>,
}

/// Generate the tax report for `year` from the resolver's active sequence.
///
/// `method_override` takes precedence over the settings default but is still
/// subject to the jurisdiction profile's forced method.
///
/// # Errors
/// Propagates fatal replay faults from the lot engine.
pub fn generate_tax_report(
    active: &[LedgerEvent],
    settings: &Settings,
    year: i32,
    method_override: Option<LotMethod>,
) -> Result<TaxYearReport, ReplayError> {
    let lot_method = settings.effective_lot_method(method_override);
    debug!(year, method = %lot_method, "generating tax report");

    let mut engine = LotEngine::with_lot_method(settings, lot_method);
    engine.apply_all(active)?;

    let disposals: Vec<Disposal> = engine
        .disposals()
        .iter()
        .filter(|disposal| disposal.tax_year == year)
        .cloned()
        .collect();

    let mut income = Vec::new();
    for event in active {
        if event.timestamp.year() != year {
            continue;
        }
        if let Some(view) = event.kind.income() {
            // Missing fair value already produced a replay warning; the row
            // carries zero rather than disappearing.
            let value_base =
                income_value(&view, settings.rewards_basis).unwrap_or_else(Decimal::zero);
            income.push(IncomeRow {
                event_id: event.id.clone(),
                asset: view.asset.clone(),
                timestamp: event.timestamp,
                quantity: view.quantity.abs(),
                value_base,
            });
        }
    }

    // Year-end holdings: replay only the prefix up to the year boundary.
    // `active` is sorted, so the prefix is a partition point.
    let boundary = Utc
        .with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0)
        .single()
        .expect("UTC year boundary is unambiguous");
    let prefix_len = active.partition_point(|event| event.timestamp < boundary);
    let mut year_end = LotEngine::with_lot_method(settings, lot_method);
    year_end.apply_all(&active[..prefix_len])?;
    let holdings = year_end.positions();

    let mut totals = TaxTotals::default();
    for disposal in &disposals {
        totals.proceeds += disposal.proceeds;
        totals.cost_basis += disposal.cost_basis;
        totals.fees += disposal.fee;
        totals.realized_gain += disposal.realized_gain;
    }
    for row in &income {
        totals.income += row.value_base;
    }

    Ok(TaxYearReport {
        year,
        lot_method,
        disposals,
        income,
        holdings,
        totals,
        warnings: engine.warnings().to_vec(),
    })
}
