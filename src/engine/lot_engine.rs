//! The replay kernel: folds active events into lots, disposals, and warnings.

use super::policy::select_lots;
use super::{income_value, Disposal, Lot, LotMatch, Position};
use crate::config::{LotMethod, RewardsBasisMode, Settings};
use crate::domain::{AssetId, Decimal, EventKind, LedgerEvent, LotId};
use crate::error::ReplayError;
use chrono::Datelike;
use std::collections::BTreeMap;
use tracing::debug;

/// Rolling per-asset pool backing the weighted-average method.
#[derive(Debug, Clone, Default)]
struct AvgPool {
    quantity: Decimal,
    cost: Decimal,
}

/// Per-asset inventory state accumulated over one replay.
///
/// The engine exclusively owns and mutates its lot collections; callers only
/// see read-only views taken after replay. One instance per replay, no state
/// shared across instances.
pub struct LotEngine {
    rewards_basis: RewardsBasisMode,
    lot_method: LotMethod,

    /// Arena of lots keyed by asset. Lots are appended in replay order and
    /// never removed, so indices stay stable for the audit trail.
    lots: BTreeMap<AssetId, Vec<Lot>>,
    pools: BTreeMap<AssetId, AvgPool>,

    // Outputs accumulated during processing.
    disposals: Vec<Disposal>,
    warnings: Vec<String>,
    realized_pnl: Decimal,
}

impl LotEngine {
    /// Create an engine using the settings' effective lot method.
    pub fn new(settings: &Settings) -> Self {
        let method = settings.effective_lot_method(None);
        Self::with_lot_method(settings, method)
    }

    /// Create an engine with an explicit lot-method override (still subject
    /// to the jurisdiction profile's constraint).
    pub fn with_lot_method(settings: &Settings, method: LotMethod) -> Self {
        Self {
            rewards_basis: settings.rewards_basis,
            lot_method: settings.effective_lot_method(Some(method)),
            lots: BTreeMap::new(),
            pools: BTreeMap::new(),
            disposals: Vec::new(),
            warnings: Vec::new(),
            realized_pnl: Decimal::zero(),
        }
    }

    /// Replay a full active event sequence on a fresh engine.
    ///
    /// # Errors
    /// Propagates the first fatal fault; see [`apply_event`](Self::apply_event).
    pub fn replay(settings: &Settings, events: &[LedgerEvent]) -> Result<Self, ReplayError> {
        let mut engine = Self::new(settings);
        engine.apply_all(events)?;
        Ok(engine)
    }

    /// Apply a sequence of events in order.
    pub fn apply_all(&mut self, events: &[LedgerEvent]) -> Result<(), ReplayError> {
        debug!(count = events.len(), method = %self.lot_method, "replaying events");
        for event in events {
            self.apply_event(event)?;
        }
        Ok(())
    }

    /// Apply one event, mutating lot state and accumulating outputs.
    ///
    /// Callers must apply events in `(timestamp, id)` order; the resolver's
    /// active sequence already is.
    ///
    /// # Errors
    /// Fatal only for structural invariant violations the engine cannot
    /// safely default around: a token fee lacking its base-currency value.
    /// Everything else degrades to a warning so replay always completes.
    pub fn apply_event(&mut self, event: &LedgerEvent) -> Result<(), ReplayError> {
        let fee = self.fee_base(event)?;

        match &event.kind {
            EventKind::Buy {
                asset,
                quantity,
                price_base,
            } => {
                let quantity = quantity.abs();
                let cost = quantity * price_base.unwrap_or_else(Decimal::zero) + fee;
                self.acquire(event, asset, quantity, cost);
            }
            EventKind::Sell {
                asset,
                quantity,
                price_base,
            } => {
                let quantity = quantity.abs();
                let proceeds = quantity * price_base.unwrap_or_else(Decimal::zero) - fee;
                self.dispose(event, asset, quantity, proceeds, fee);
            }
            EventKind::Swap {
                asset_in,
                quantity_in,
                asset_out,
                quantity_out,
                value_base,
            } => {
                let (asset_in, quantity_in) = (asset_in.clone(), quantity_in.abs());
                let (asset_out, quantity_out) = (asset_out.clone(), quantity_out.abs());
                let gross = match value_base {
                    Some(value) => *value,
                    None => {
                        self.warn(format!(
                            "event {}: swap has no valuation; disposal recorded with zero proceeds",
                            event.id
                        ));
                        Decimal::zero()
                    }
                };

                // Fee is charged to the disposed leg only; the acquired lot
                // books the gross valuation.
                self.dispose(event, &asset_in, quantity_in, gross - fee, fee);
                match asset_out {
                    Some(asset_out) => self.acquire(event, &asset_out, quantity_out, gross),
                    None => self.warn(format!(
                        "event {}: swap has no output asset; acquisition leg skipped",
                        event.id
                    )),
                }
            }
            EventKind::Transfer { asset, quantity } => {
                let (asset, quantity) = (asset.clone(), *quantity);
                if quantity.is_positive() {
                    // External deposit: cost basis unknown to this engine.
                    self.acquire(event, &asset, quantity, Decimal::zero());
                } else if quantity.is_negative() {
                    // Internal movement: consumes inventory, not taxable.
                    self.consume(event, &asset, quantity.abs());
                }
            }
            EventKind::Reward { .. }
            | EventKind::StakingReward { .. }
            | EventKind::Airdrop { .. }
            | EventKind::Interest { .. } => {
                let income = event
                    .kind
                    .income()
                    .expect("reward-family kinds carry income fields");
                let (asset, quantity) = (income.asset.clone(), income.quantity.abs());
                let basis = match income_value(&income, self.rewards_basis) {
                    Some(value) => value,
                    None => {
                        self.warn(format!(
                            "event {}: reward has no fair-market valuation; acquisition treated as zero cost",
                            event.id
                        ));
                        Decimal::zero()
                    }
                };
                self.acquire(event, &asset, quantity, basis);
            }
            EventKind::LpWithdraw { asset, quantity } | EventKind::Borrow { asset, quantity } => {
                let (asset, quantity) = (asset.clone(), quantity.abs());
                self.acquire(event, &asset, quantity, Decimal::zero());
            }
            EventKind::LpDeposit { asset, quantity }
            | EventKind::Lend { asset, quantity }
            | EventKind::Repay { asset, quantity } => {
                let (asset, quantity) = (asset.clone(), quantity.abs());
                self.consume(event, &asset, quantity);
            }
        }

        Ok(())
    }

    /// The lot method this engine runs with.
    pub fn lot_method(&self) -> LotMethod {
        self.lot_method
    }

    /// Current positions, one per asset with non-zero aggregate quantity,
    /// in asset order.
    pub fn positions(&self) -> Vec<Position> {
        self.lots
            .iter()
            .filter_map(|(asset, lots)| {
                let mut quantity = Decimal::zero();
                let mut cost_basis = Decimal::zero();
                for lot in lots {
                    quantity += lot.remaining_quantity;
                    cost_basis += lot.remaining_cost_basis;
                }
                if quantity.is_zero() {
                    return None;
                }
                if self.lot_method == LotMethod::AvgCost {
                    // The pool is authoritative for basis under AVG_COST; the
                    // lot arena keeps FIFO bookkeeping only.
                    if let Some(pool) = self.pools.get(asset) {
                        cost_basis = pool.cost;
                    }
                }
                Some(Position {
                    asset: asset.clone(),
                    quantity,
                    cost_basis,
                    average_cost: cost_basis / quantity,
                })
            })
            .collect()
    }

    /// Disposals accumulated so far, in application order.
    pub fn disposals(&self) -> &[Disposal] {
        &self.disposals
    }

    /// Non-fatal warnings accumulated so far.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Sum of realized gains across all disposals so far.
    pub fn realized_pnl_to_date(&self) -> Decimal {
        self.realized_pnl
    }

    fn fee_base(&self, event: &LedgerEvent) -> Result<Decimal, ReplayError> {
        match &event.fee {
            None => Ok(Decimal::zero()),
            Some(fee) => fee.base_value().ok_or_else(|| ReplayError::TokenFeeMissingValue {
                event_id: event.id.clone(),
            }),
        }
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    /// Create one lot and grow the asset's average pool.
    fn acquire(&mut self, event: &LedgerEvent, asset: &AssetId, quantity: Decimal, cost: Decimal) {
        self.lots.entry(asset.clone()).or_default().push(Lot {
            id: LotId::for_event(&event.id, 0),
            asset: asset.clone(),
            remaining_quantity: quantity,
            remaining_cost_basis: cost,
            acquired_at: event.timestamp,
            event_id: event.id.clone(),
        });
        let pool = self.pools.entry(asset.clone()).or_default();
        pool.quantity += quantity;
        pool.cost += cost;
    }

    /// Consume inventory via the configured policy.
    ///
    /// Returns the per-lot matches (including a synthesized zero-cost match
    /// for any shortfall) and the cost basis charged to the disposal.
    fn consume(
        &mut self,
        event: &LedgerEvent,
        asset: &AssetId,
        quantity: Decimal,
    ) -> (Vec<LotMatch>, Decimal) {
        let (mut matches, shortfall) = {
            let lots = self.lots.entry(asset.clone()).or_default();
            select_lots(lots, quantity, self.lot_method)
        };
        let covered = quantity - shortfall;
        let matched_cost = matches
            .iter()
            .fold(Decimal::zero(), |acc, m| acc + m.cost_basis);

        let pool = self.pools.entry(asset.clone()).or_default();
        let cost_basis = if self.lot_method == LotMethod::AvgCost {
            let basis = if !pool.quantity.is_positive() {
                Decimal::zero()
            } else if covered == pool.quantity {
                pool.cost
            } else {
                pool.cost * covered / pool.quantity
            };
            pool.quantity -= covered;
            pool.cost -= basis;
            basis
        } else {
            pool.quantity -= covered;
            pool.cost -= matched_cost;
            matched_cost
        };

        if shortfall.is_positive() {
            self.warn(format!(
                "event {}: disposal of {} {} exceeds held inventory by {}; shortfall matched at zero cost basis",
                event.id, quantity, asset, shortfall
            ));
            matches.push(LotMatch {
                lot_id: None,
                quantity: shortfall,
                cost_basis: Decimal::zero(),
            });
        }

        (matches, cost_basis)
    }

    /// Consume inventory and record the taxable disposal.
    fn dispose(
        &mut self,
        event: &LedgerEvent,
        asset: &AssetId,
        quantity: Decimal,
        proceeds: Decimal,
        fee: Decimal,
    ) {
        let (matches, cost_basis) = self.consume(event, asset, quantity);
        let realized_gain = proceeds - cost_basis;
        self.realized_pnl += realized_gain;
        self.disposals.push(Disposal {
            event_id: event.id.clone(),
            asset: asset.clone(),
            timestamp: event.timestamp,
            quantity,
            proceeds,
            cost_basis,
            fee,
            realized_gain,
            matches,
            tax_year: event.timestamp.year(),
        });
    }
}
