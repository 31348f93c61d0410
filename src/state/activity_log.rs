use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::types::{now_ns, Engine};

/// One scoring event. Append-only; evicted oldest-first past capacity.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    /// Nanosecond UTC epoch timestamp.
    pub at_ns: i64,
    pub engine: Engine,
    pub entity: String,
    pub detail: String,
}

/// Bounded in-memory activity log. Holds the most recent `capacity` events;
/// process restart clears it — score snapshots in SQLite are the durable
/// record.
pub struct ActivityLog {
    events: Mutex<VecDeque<ActivityEvent>>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        })
    }

    /// Append a pre-built event. Exposed so tests can control timestamps.
    pub fn push(&self, event: ActivityEvent) {
        let Ok(mut events) = self.events.lock() else {
            return;
        };
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Append an event stamped with the current time.
    pub fn record(&self, engine: Engine, entity: impl Into<String>, detail: impl Into<String>) {
        self.push(ActivityEvent {
            at_ns: now_ns(),
            engine,
            entity: entity.into(),
            detail: detail.into(),
        });
    }

    /// Most recent events first, at most `limit`.
    pub fn recent(&self, limit: usize) -> Vec<ActivityEvent> {
        let Ok(events) = self.events.lock() else {
            return Vec::new();
        };
        events.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(at_ns: i64, entity: &str) -> ActivityEvent {
        ActivityEvent {
            at_ns,
            engine: Engine::Health,
            entity: entity.to_string(),
            detail: String::new(),
        }
    }

    #[test]
    fn recent_returns_newest_first() {
        let log = ActivityLog::new(10);
        log.push(event(1, "a"));
        log.push(event(2, "b"));
        log.push(event(3, "c"));

        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].entity, "c");
        assert_eq!(recent[1].entity, "b");
    }

    #[test]
    fn capacity_evicts_oldest() {
        let log = ActivityLog::new(3);
        for i in 0..5 {
            log.push(event(i, &format!("e{i}")));
        }

        assert_eq!(log.len(), 3);
        let recent = log.recent(10);
        assert_eq!(recent[0].entity, "e4");
        assert_eq!(recent[2].entity, "e2");
    }

    #[test]
    fn record_stamps_a_timestamp() {
        let log = ActivityLog::new(10);
        log.record(Engine::Edge, "lebron james", "edge +7.1");

        let recent = log.recent(1);
        assert_eq!(recent.len(), 1);
        assert!(recent[0].at_ns > 0);
        assert_eq!(recent[0].entity, "lebron james");
    }
}
