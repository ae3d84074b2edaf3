//! Ledger event model: append-only envelope plus a closed kind sum type.
//!
//! Events are immutable once appended. Edits and deletions are themselves
//! appended as replacement/tombstone events; the ledger resolver collapses
//! them into the active view.

use crate::config::RewardsBasisMode;
use crate::domain::{AccountId, AssetId, Decimal, EventId};
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fee attached to an event.
///
/// Either already expressed in the base currency, or denominated in a token.
/// A token fee must carry its base-currency valuation to be usable; the
/// importer rejects events where it is missing and the engine treats one
/// slipping through as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fee {
    /// Token-denominated fee with its base-currency valuation.
    Token {
        #[serde(rename = "assetId")]
        asset_id: AssetId,
        amount: Decimal,
        #[serde(rename = "valueBase", default, skip_serializing_if = "Option::is_none")]
        value_base: Option<Decimal>,
    },
    /// Fee already expressed in the base currency.
    Base { base: Decimal },
}

impl Fee {
    /// The fee's base-currency value, if resolvable.
    pub fn base_value(&self) -> Option<Decimal> {
        match self {
            Fee::Base { base } => Some(*base),
            Fee::Token { value_base, .. } => *value_base,
        }
    }
}

/// The closed set of event kinds, each carrying exactly its required fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Acquisition against the base currency.
    Buy {
        asset: AssetId,
        quantity: Decimal,
        #[serde(rename = "priceBase", default, skip_serializing_if = "Option::is_none")]
        price_base: Option<Decimal>,
    },
    /// Disposal against the base currency.
    Sell {
        asset: AssetId,
        quantity: Decimal,
        #[serde(rename = "priceBase", default, skip_serializing_if = "Option::is_none")]
        price_base: Option<Decimal>,
    },
    /// Atomic disposal of one asset and acquisition of another.
    ///
    /// `asset_out` is optional because degraded producer payloads exist; the
    /// engine keeps the disposal leg and warns instead of dropping the event.
    Swap {
        #[serde(rename = "assetIn")]
        asset_in: AssetId,
        #[serde(rename = "quantityIn")]
        quantity_in: Decimal,
        #[serde(rename = "assetOut", default, skip_serializing_if = "Option::is_none")]
        asset_out: Option<AssetId>,
        #[serde(rename = "quantityOut")]
        quantity_out: Decimal,
        #[serde(rename = "valueBase", default, skip_serializing_if = "Option::is_none")]
        value_base: Option<Decimal>,
    },
    /// Signed inventory movement: positive is an external deposit, negative
    /// an internal withdrawal. Never taxable.
    Transfer { asset: AssetId, quantity: Decimal },
    /// Generic reward income.
    Reward {
        asset: AssetId,
        quantity: Decimal,
        #[serde(rename = "valueBase", default, skip_serializing_if = "Option::is_none")]
        value_base: Option<Decimal>,
        #[serde(rename = "priceBase", default, skip_serializing_if = "Option::is_none")]
        price_base: Option<Decimal>,
    },
    /// Staking yield.
    StakingReward {
        asset: AssetId,
        quantity: Decimal,
        #[serde(rename = "valueBase", default, skip_serializing_if = "Option::is_none")]
        value_base: Option<Decimal>,
        #[serde(rename = "priceBase", default, skip_serializing_if = "Option::is_none")]
        price_base: Option<Decimal>,
    },
    /// Airdropped tokens.
    Airdrop {
        asset: AssetId,
        quantity: Decimal,
        #[serde(rename = "valueBase", default, skip_serializing_if = "Option::is_none")]
        value_base: Option<Decimal>,
        #[serde(rename = "priceBase", default, skip_serializing_if = "Option::is_none")]
        price_base: Option<Decimal>,
    },
    /// Lending/LP interest paid out in kind.
    Interest {
        asset: AssetId,
        quantity: Decimal,
        #[serde(rename = "valueBase", default, skip_serializing_if = "Option::is_none")]
        value_base: Option<Decimal>,
        #[serde(rename = "priceBase", default, skip_serializing_if = "Option::is_none")]
        price_base: Option<Decimal>,
    },
    /// Liquidity provided to a pool (inventory leaves the wallet).
    LpDeposit { asset: AssetId, quantity: Decimal },
    /// Liquidity withdrawn from a pool.
    LpWithdraw { asset: AssetId, quantity: Decimal },
    /// Principal supplied to a lending protocol.
    Lend { asset: AssetId, quantity: Decimal },
    /// Principal borrowed from a lending protocol.
    Borrow { asset: AssetId, quantity: Decimal },
    /// Borrowed principal repaid.
    Repay { asset: AssetId, quantity: Decimal },
}

/// Borrowed view of the income fields shared by the reward-family kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomeView<'a> {
    pub asset: &'a AssetId,
    pub quantity: Decimal,
    pub value_base: Option<Decimal>,
    pub price_base: Option<Decimal>,
}

impl EventKind {
    /// Whether this kind is income (the reward family).
    pub fn is_income(&self) -> bool {
        self.income().is_some()
    }

    /// The income fields, when this kind belongs to the reward family.
    pub fn income(&self) -> Option<IncomeView<'_>> {
        match self {
            EventKind::Reward {
                asset,
                quantity,
                value_base,
                price_base,
            }
            | EventKind::StakingReward {
                asset,
                quantity,
                value_base,
                price_base,
            }
            | EventKind::Airdrop {
                asset,
                quantity,
                value_base,
                price_base,
            }
            | EventKind::Interest {
                asset,
                quantity,
                value_base,
                price_base,
            } => Some(IncomeView {
                asset,
                quantity: *quantity,
                value_base: *value_base,
                price_base: *price_base,
            }),
            _ => None,
        }
    }
}

/// A single append-only ledger event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEvent {
    /// Stable unique identifier.
    pub id: EventId,
    /// When the event record was created.
    pub created_at: DateTime<Utc>,
    /// When the event record was last updated, if ever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// When the financial event happened.
    pub timestamp: DateTime<Utc>,
    /// Originating account/wallet, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountId>,
    /// Free-text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Free-text tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Dedupe key assigned by an importer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,
    /// When set, this event supersedes the referenced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces_event_id: Option<EventId>,
    /// Tombstone flag.
    #[serde(default)]
    pub deleted: bool,
    /// Fee attached to the event, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Fee>,
    /// Kind-specific payload.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl LedgerEvent {
    /// The timestamp that orders competing revisions of the same target:
    /// `updated_at` when present, else `created_at`.
    pub fn revised_at(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// Import-time structural validation.
    ///
    /// # Errors
    /// Rejects a token fee lacking its base-currency valuation or carrying a
    /// non-positive amount.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(Fee::Token {
            amount, value_base, ..
        }) = &self.fee
        {
            if value_base.is_none() {
                return Err(ValidationError::TokenFeeMissingValue {
                    event_id: self.id.clone(),
                });
            }
            if !amount.is_positive() {
                return Err(ValidationError::TokenFeeNonPositiveAmount {
                    event_id: self.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Importer-side strictness for fair-value reward accounting: a reward
    /// with neither a total valuation nor a per-unit price is rejected here,
    /// while the engine itself only warns (see the lot engine).
    ///
    /// # Errors
    /// Rejects an income event with no resolvable valuation under
    /// [`RewardsBasisMode::FairValue`].
    pub fn validate_reward_valuation(
        &self,
        mode: RewardsBasisMode,
    ) -> Result<(), ValidationError> {
        if mode != RewardsBasisMode::FairValue {
            return Ok(());
        }
        if let Some(income) = self.kind.income() {
            if income.value_base.is_none() && income.price_base.is_none() {
                return Err(ValidationError::RewardMissingFairValue {
                    event_id: self.id.clone(),
                });
            }
        }
        Ok(())
    }
}
