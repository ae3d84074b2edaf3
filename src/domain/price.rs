//! Time-indexed price series with monotonic per-asset cursors.

use crate::domain::{AssetId, Decimal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single observed price for an asset, in the base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub asset: AssetId,
    pub timestamp: DateTime<Utc>,
    pub price_base: Decimal,
}

#[derive(Debug, Clone, Default)]
struct Series {
    /// Points sorted by timestamp; insertion order preserved on ties, so the
    /// later-inserted point wins a same-timestamp conflict.
    points: Vec<(DateTime<Utc>, Decimal)>,
    cursor: usize,
    last: Option<Decimal>,
}

/// Per-asset price series supporting forward-only "latest at or before" reads.
///
/// The snapshot engine steps days forward monotonically, so each asset keeps
/// a cursor that only ever advances. Construction from an unordered point set
/// is deterministic.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    series: BTreeMap<AssetId, Series>,
}

impl PriceBook {
    /// Build a price book from an unordered collection of points.
    pub fn new(points: Vec<PricePoint>) -> Self {
        let mut series: BTreeMap<AssetId, Series> = BTreeMap::new();
        for point in points {
            series
                .entry(point.asset)
                .or_default()
                .points
                .push((point.timestamp, point.price_base));
        }
        for s in series.values_mut() {
            // Stable: equal timestamps keep insertion order.
            s.points.sort_by_key(|(ts, _)| *ts);
        }
        PriceBook { series }
    }

    /// Advance the asset's cursor to `at` and return the latest price with
    /// timestamp at or before it, if any has been observed yet.
    ///
    /// Calls for one asset must pass non-decreasing `at` values; the cursor
    /// never rewinds.
    pub fn advance_to(&mut self, asset: &AssetId, at: DateTime<Utc>) -> Option<Decimal> {
        let s = self.series.get_mut(asset)?;
        while s.cursor < s.points.len() && s.points[s.cursor].0 <= at {
            s.last = Some(s.points[s.cursor].1);
            s.cursor += 1;
        }
        s.last
    }

    /// True when no points exist for any asset.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
