//! Per-event serialization locks.
//!
//! Assignment generation, ballot intake and results computation for one
//! event must not interleave; each takes the event's lock for the duration
//! of its read–validate–write cycle. The map itself is the only process-wide
//! mutable state in the engine and can be swapped for database advisory
//! locks when scaling across processes.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use rv_core::ids::EventId;

pub(crate) struct EventLocks {
    map: Mutex<HashMap<EventId, Arc<Mutex<()>>>>,
}

impl EventLocks {
    pub fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }

    /// Handle for one event's lock; lock it for the operation's scope.
    pub fn handle(&self, event: &EventId) -> Arc<Mutex<()>> {
        self.map
            .lock()
            .entry(event.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_event_shares_one_lock() {
        let locks = EventLocks::new();
        let e: EventId = "evt".parse().unwrap();
        let a = locks.handle(&e);
        let b = locks.handle(&e);
        assert!(Arc::ptr_eq(&a, &b));

        let other = locks.handle(&"evt2".parse().unwrap());
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[test]
    fn lock_excludes_a_second_holder() {
        let locks = EventLocks::new();
        let e: EventId = "evt".parse().unwrap();
        let h = locks.handle(&e);
        let guard = h.lock();
        assert!(locks.handle(&e).try_lock().is_none());
        drop(guard);
        assert!(locks.handle(&e).try_lock().is_some());
    }
}
