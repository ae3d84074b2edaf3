//! Pure computation engine for deterministic ledger replay.

use crate::config::RewardsBasisMode;
use crate::domain::{AssetId, Decimal, EventId, IncomeView, LotId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod lot_engine;
pub mod policy;

pub use lot_engine::LotEngine;

/// A discrete acquired quantity of an asset with its own remaining quantity
/// and remaining cost basis.
///
/// Lots are mutated in place as disposals consume them and are never removed
/// from their per-asset collection, even at zero remaining quantity; aggregation
/// skips empty lots instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub id: LotId,
    pub asset: AssetId,
    pub remaining_quantity: Decimal,
    pub remaining_cost_basis: Decimal,
    pub acquired_at: DateTime<Utc>,
    /// The acquisition event that created this lot.
    pub event_id: EventId,
}

impl Lot {
    /// Remaining cost per unit, zero for an empty lot.
    pub fn cost_per_unit(&self) -> Decimal {
        if self.remaining_quantity.is_zero() {
            Decimal::zero()
        } else {
            self.remaining_cost_basis / self.remaining_quantity
        }
    }
}

/// One lot's contribution to a disposal.
///
/// `lot_id` is `None` for the synthesized zero-cost match covering a
/// negative-inventory shortfall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotMatch {
    pub lot_id: Option<LotId>,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
}

/// The financial result of one disposal event (a sale or a swap's disposed
/// leg).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Disposal {
    pub event_id: EventId,
    pub asset: AssetId,
    pub timestamp: DateTime<Utc>,
    pub quantity: Decimal,
    /// Base-currency proceeds, net of fee.
    pub proceeds: Decimal,
    /// Cost basis consumed across the matched lots.
    pub cost_basis: Decimal,
    pub fee: Decimal,
    /// proceeds - cost basis.
    pub realized_gain: Decimal,
    pub matches: Vec<LotMatch>,
    /// Calendar year of `timestamp` (UTC).
    pub tax_year: i32,
}

/// Aggregated view over an asset's live lots. Recomputed on demand; an asset
/// with zero aggregate quantity has no position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub asset: AssetId,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub average_cost: Decimal,
}

/// Base-currency value of an income event under the configured rewards mode.
///
/// Returns `None` when fair-value accounting is selected but the event
/// carries neither a total valuation nor a per-unit price; callers decide
/// whether that is a rejection (importer) or a warning (engine, tax report).
pub fn income_value(income: &IncomeView<'_>, mode: RewardsBasisMode) -> Option<Decimal> {
    match mode {
        RewardsBasisMode::ZeroCost => Some(Decimal::zero()),
        RewardsBasisMode::FairValue => income
            .value_base
            .or_else(|| income.price_base.map(|price| income.quantity.abs() * price)),
    }
}
