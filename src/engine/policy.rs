//! Lot-selection policies: which inventory is deemed consumed by a disposal.
//!
//! All policies consume lots in place, reducing remaining quantity and a
//! proportional share of remaining cost basis. Lots are appended to the
//! per-asset arena in replay order, so arena order is acquisition order.

use super::{Lot, LotMatch};
use crate::config::LotMethod;
use crate::domain::Decimal;

/// Consume `quantity` from `lots` according to `method`.
///
/// Returns the per-lot matches in consumption order plus the unmatched
/// shortfall (zero when inventory sufficed). The AvgCost method decrements
/// the arena FIFO; its pool-average cost math lives in the engine, which
/// overrides the disposal-level cost basis while keeping these per-lot
/// records for the audit trail.
pub fn select_lots(lots: &mut [Lot], quantity: Decimal, method: LotMethod) -> (Vec<LotMatch>, Decimal) {
    let mut matches = Vec::new();
    let mut want = quantity;

    while want.is_positive() {
        let index = match method {
            LotMethod::Fifo | LotMethod::AvgCost => next_nonempty(lots, false),
            LotMethod::Lifo => next_nonempty(lots, true),
            LotMethod::Hifo => highest_cost_per_unit(lots),
        };
        let Some(index) = index else { break };
        let matched = consume_from(&mut lots[index], want);
        want -= matched.quantity;
        matches.push(matched);
    }

    (matches, want)
}

/// First lot with remaining quantity, scanning from the back when `newest_first`.
fn next_nonempty(lots: &[Lot], newest_first: bool) -> Option<usize> {
    if newest_first {
        lots.iter().rposition(|lot| lot.remaining_quantity.is_positive())
    } else {
        lots.iter().position(|lot| lot.remaining_quantity.is_positive())
    }
}

/// Lot with the highest remaining cost per unit, re-evaluated per call since
/// the candidate set shrinks as lots empty. Earlier lots win per-unit ties.
fn highest_cost_per_unit(lots: &[Lot]) -> Option<usize> {
    let mut best: Option<(usize, Decimal)> = None;
    for (index, lot) in lots.iter().enumerate() {
        if !lot.remaining_quantity.is_positive() {
            continue;
        }
        let per_unit = lot.cost_per_unit();
        match best {
            Some((_, best_per_unit)) if best_per_unit >= per_unit => {}
            _ => best = Some((index, per_unit)),
        }
    }
    best.map(|(index, _)| index)
}

/// Take up to `want` from a lot, reducing its basis proportionally.
///
/// A full consumption transfers the exact remaining basis so no residue is
/// left behind by rounding.
fn consume_from(lot: &mut Lot, want: Decimal) -> LotMatch {
    let take = want.min(lot.remaining_quantity);
    let cost = if take == lot.remaining_quantity {
        lot.remaining_cost_basis
    } else {
        lot.remaining_cost_basis * take / lot.remaining_quantity
    };
    lot.remaining_quantity -= take;
    lot.remaining_cost_basis -= cost;
    LotMatch {
        lot_id: Some(lot.id.clone()),
        quantity: take,
        cost_basis: cost,
    }
}
