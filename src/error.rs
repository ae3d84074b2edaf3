//! Two-tier error model.
//!
//! [`ValidationError`] is the import-time gate: structurally broken events
//! are rejected before they enter the engine. [`ReplayError`] is fatal inside
//! a replay; everything the engine can safely default around is reported as a
//! warning string instead, so ambiguous data never disappears without trace.

use crate::domain::EventId;
use thiserror::Error;

/// Import-time rejection of a structurally invalid event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("event {event_id}: token fee has no resolvable base-currency value")]
    TokenFeeMissingValue { event_id: EventId },
    #[error("event {event_id}: token fee amount must be positive")]
    TokenFeeNonPositiveAmount { event_id: EventId },
    #[error("event {event_id}: reward has no fair-market valuation")]
    RewardMissingFairValue { event_id: EventId },
}

/// Fatal fault halting an in-progress replay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("event {event_id}: token fee has no resolvable base-currency value")]
    TokenFeeMissingValue { event_id: EventId },
}
