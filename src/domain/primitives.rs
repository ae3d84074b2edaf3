//! Domain primitives: EventId, AssetId, AccountId, LotId.

use serde::{Deserialize, Serialize};

/// Stable identifier of a ledger event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    /// Create an EventId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        EventId(id.into())
    }

    /// Get the id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asset symbol (e.g. "BTC", "ETH").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    /// Create an AssetId from a string.
    pub fn new(asset: impl Into<String>) -> Self {
        AssetId(asset.into())
    }

    /// Get the asset as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account or wallet identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    /// Create an AccountId from a string.
    pub fn new(account: impl Into<String>) -> Self {
        AccountId(account.into())
    }

    /// Get the account as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an inventory lot.
///
/// Lot ids are minted deterministically from the acquiring event id plus a
/// per-event leg index, so a replay of the same ledger always yields the same
/// ids. Randomness would leak into disposal records and break replay
/// comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LotId(pub String);

impl LotId {
    /// Mint the lot id for the `leg`-th lot created by `event_id`.
    pub fn for_event(event_id: &EventId, leg: u32) -> Self {
        LotId(format!("{}/{}", event_id.as_str(), leg))
    }

    /// Get the id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
