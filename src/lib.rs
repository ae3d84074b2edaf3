pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod snapshot;
pub mod tax;

pub use config::{LotMethod, RewardsBasisMode, Settings, TaxProfile};
pub use domain::{
    AssetId, Decimal, EventId, EventKind, Fee, LedgerEvent, LotId, PriceBook, PricePoint,
};
pub use engine::{Disposal, Lot, LotEngine, LotMatch, Position};
pub use error::{ReplayError, ValidationError};
pub use ledger::{resolve_active, ActiveLedger};
pub use snapshot::{
    PortfolioSnapshot, SnapshotEngine, SnapshotPosition, SnapshotReport, SnapshotWindow,
};
pub use tax::{generate_tax_report, IncomeRow, TaxTotals, TaxYearReport};
