//! Domain types and determinism layer for the ledger-replay engine.
//!
//! This module provides:
//! - Exact numeric handling via the Decimal wrapper
//! - Domain primitives: EventId, AssetId, AccountId, LotId
//! - The LedgerEvent envelope and closed EventKind sum type
//! - Stable ordering keys for deterministic replay and revision resolution
//! - Time-indexed price series for valuation

pub mod decimal;
pub mod event;
pub mod ordering;
pub mod price;
pub mod primitives;

pub use decimal::Decimal;
pub use event::{EventKind, Fee, IncomeView, LedgerEvent};
pub use ordering::{sort_events_deterministic, EventOrderingKey, RevisionKey};
pub use price::{PriceBook, PricePoint};
pub use primitives::{AccountId, AssetId, EventId, LotId};
