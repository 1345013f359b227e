//! Journal overview for dashboards.

use chrono::{DateTime, Utc};
use iqraa_core::journal::JournalEntry;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_LAST_EVENTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalOverview {
    pub total_events: usize,
    pub last_event_at: Option<DateTime<Utc>>,
    pub event_type_counts: BTreeMap<String, usize>,
    /// The newest events, oldest of them first.
    pub last_events: Vec<JournalEntry>,
}

pub fn summarize(events: &[JournalEntry], max_last: usize) -> JournalOverview {
    let mut event_type_counts = BTreeMap::new();
    for event in events {
        *event_type_counts
            .entry(event.event_type.as_str().to_string())
            .or_insert(0) += 1;
    }

    let start = events.len().saturating_sub(max_last);
    JournalOverview {
        total_events: events.len(),
        last_event_at: events.last().and_then(|e| e.timestamp),
        event_type_counts,
        last_events: events[start..].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iqraa_core::journal::{Actor, EventType, Scope};

    fn event(kind: EventType) -> JournalEntry {
        JournalEntry::new(kind, Scope::Sync, Actor::System).with_timestamp(Utc::now())
    }

    #[test]
    fn counts_by_event_type() {
        let events = vec![
            event(EventType::SyncStart),
            event(EventType::SyncComplete),
            event(EventType::SyncStart),
        ];
        let overview = summarize(&events, DEFAULT_LAST_EVENTS);
        assert_eq!(overview.total_events, 3);
        assert_eq!(overview.event_type_counts["memory:sync:start"], 2);
        assert_eq!(overview.event_type_counts["memory:sync:complete"], 1);
        assert_eq!(overview.last_event_at, events[2].timestamp);
    }

    #[test]
    fn keeps_only_newest_events() {
        let events: Vec<_> = (0..8).map(|_| event(EventType::ProjectUpdate)).collect();
        let overview = summarize(&events, 3);
        assert_eq!(overview.last_events.len(), 3);
        assert_eq!(overview.last_events[2], events[7]);
    }

    #[test]
    fn empty_journal_overview() {
        let overview = summarize(&[], DEFAULT_LAST_EVENTS);
        assert_eq!(overview.total_events, 0);
        assert!(overview.last_event_at.is_none());
        assert!(overview.last_events.is_empty());
    }
}
