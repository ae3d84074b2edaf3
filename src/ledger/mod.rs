//! Ledger view resolver.
//!
//! Collapses the raw append-only event log into the authoritative ordered
//! sequence of active events, resolving replacement and tombstone events
//! deterministically: the latest replacement per target wins by
//! `(revised_at, id)`, and a replaced event is excluded whether or not its
//! replacement also tombstoned it (producers forget to).

use crate::domain::{sort_events_deterministic, EventId, LedgerEvent, RevisionKey};
use std::collections::{BTreeMap, HashMap};

/// The resolved, replay-ready view of the event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLedger {
    /// Active events ordered by `(timestamp, id)` ascending.
    pub events: Vec<LedgerEvent>,
    /// Superseded event id -> id of the replacement that won.
    pub superseded_by: BTreeMap<EventId, EventId>,
}

impl ActiveLedger {
    /// Number of active events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when no events survive resolution.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Resolve the active view of the full (unsorted) event log.
///
/// Output is independent of the input slice order: the winning replacement
/// per target is picked by comparing [`RevisionKey`]s, and the active
/// sequence is sorted by the stable event ordering key.
pub fn resolve_active(events: &[LedgerEvent]) -> ActiveLedger {
    let mut winners: HashMap<EventId, (RevisionKey, EventId)> = HashMap::new();
    for event in events {
        if let Some(target) = &event.replaces_event_id {
            let key = RevisionKey::from_event(event);
            match winners.get(target) {
                Some((best, _)) if *best >= key => {}
                _ => {
                    winners.insert(target.clone(), (key, event.id.clone()));
                }
            }
        }
    }

    let mut active: Vec<LedgerEvent> = events
        .iter()
        .filter(|event| !event.deleted && !winners.contains_key(&event.id))
        .cloned()
        .collect();
    sort_events_deterministic(&mut active);

    let superseded_by = winners
        .into_iter()
        .map(|(target, (_, winner))| (target, winner))
        .collect();

    ActiveLedger {
        events: active,
        superseded_by,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssetId, Decimal, EventKind};
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    fn transfer(id: &str, ts_min: u32) -> LedgerEvent {
        LedgerEvent {
            id: EventId::new(id),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            updated_at: None,
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 0, ts_min, 0).unwrap(),
            account: None,
            note: None,
            tags: Vec::new(),
            external_ref: None,
            replaces_event_id: None,
            deleted: false,
            fee: None,
            kind: EventKind::Transfer {
                asset: AssetId::new("BTC"),
                quantity: Decimal::from_str("1").unwrap(),
            },
        }
    }

    fn replacement(id: &str, target: &str, updated_min: u32) -> LedgerEvent {
        let mut event = transfer(id, 0);
        event.replaces_event_id = Some(EventId::new(target));
        event.updated_at = Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, updated_min, 0).unwrap());
        event
    }

    fn active_ids(ledger: &ActiveLedger) -> Vec<&str> {
        ledger.events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_plain_events_sorted_by_timestamp() {
        let ledger = resolve_active(&[transfer("b", 2), transfer("a", 1), transfer("c", 3)]);
        assert_eq!(active_ids(&ledger), vec!["a", "b", "c"]);
        assert!(ledger.superseded_by.is_empty());
    }

    #[test]
    fn test_tombstone_excluded() {
        let mut dead = transfer("dead", 1);
        dead.deleted = true;
        let ledger = resolve_active(&[dead, transfer("alive", 2)]);
        assert_eq!(active_ids(&ledger), vec!["alive"]);
    }

    #[test]
    fn test_replacement_excludes_target() {
        let events = vec![transfer("e1", 1), replacement("r1", "e1", 10)];
        let ledger = resolve_active(&events);
        assert_eq!(active_ids(&ledger), vec!["r1"]);
        assert_eq!(
            ledger.superseded_by.get(&EventId::new("e1")),
            Some(&EventId::new("r1"))
        );
    }

    #[test]
    fn test_latest_replacement_wins_by_timestamp() {
        let events = vec![
            transfer("e1", 1),
            replacement("r1", "e1", 10),
            replacement("r2", "e1", 20),
        ];
        let ledger = resolve_active(&events);
        assert_eq!(active_ids(&ledger), vec!["r2"]);
        assert_eq!(
            ledger.superseded_by.get(&EventId::new("e1")),
            Some(&EventId::new("r2"))
        );
    }

    #[test]
    fn test_replacement_tie_broken_by_id() {
        let events = vec![
            transfer("e1", 1),
            replacement("ra", "e1", 10),
            replacement("rb", "e1", 10),
        ];
        let ledger = resolve_active(&events);
        assert_eq!(active_ids(&ledger), vec!["rb"]);
    }

    #[test]
    fn test_replacement_chain_resolves() {
        let events = vec![
            transfer("e1", 1),
            replacement("r1", "e1", 10),
            replacement("r2", "r1", 20),
        ];
        let ledger = resolve_active(&events);
        assert_eq!(active_ids(&ledger), vec!["r2"]);
        assert_eq!(
            ledger.superseded_by.get(&EventId::new("r1")),
            Some(&EventId::new("r2"))
        );
    }

    #[test]
    fn test_resolution_independent_of_input_order() {
        let mut events = vec![
            transfer("e1", 1),
            transfer("e2", 2),
            replacement("r1", "e1", 10),
            replacement("r2", "e1", 20),
        ];
        let forward = resolve_active(&events);
        events.reverse();
        let reversed = resolve_active(&events);
        assert_eq!(forward, reversed);
    }
}
