//! Stable event ordering for deterministic replay.

use crate::domain::{EventId, LedgerEvent};
use chrono::{DateTime, Utc};

/// Stable ordering key for active events.
///
/// Ensures deterministic ordering of events with the same timestamp.
/// Ordering: timestamp -> event id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventOrderingKey {
    /// Event timestamp (primary sort).
    pub timestamp: DateTime<Utc>,
    /// Event id (tie-break).
    pub id: EventId,
}

impl EventOrderingKey {
    /// Create an ordering key from an event.
    pub fn from_event(event: &LedgerEvent) -> Self {
        EventOrderingKey {
            timestamp: event.timestamp,
            id: event.id.clone(),
        }
    }
}

/// Ordering key for competing revisions of the same target event.
///
/// A replacement wins over another replacement of the same target when its
/// `(revised_at, id)` key compares greater. Ties on the timestamp are broken
/// by the event id so the winner is total-ordered even when clocks coincide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RevisionKey {
    /// `updated_at` when present, else `created_at` (primary sort).
    pub revised_at: DateTime<Utc>,
    /// Event id (tie-break).
    pub id: EventId,
}

impl RevisionKey {
    /// Create a revision key from an event.
    pub fn from_event(event: &LedgerEvent) -> Self {
        RevisionKey {
            revised_at: event.revised_at(),
            id: event.id.clone(),
        }
    }
}

/// Sort events deterministically by `(timestamp, id)`.
pub fn sort_events_deterministic(events: &mut [LedgerEvent]) {
    events.sort_by(|a, b| {
        let key_a = EventOrderingKey::from_event(a);
        let key_b = EventOrderingKey::from_event(b);
        key_a.cmp(&key_b)
    });
}
