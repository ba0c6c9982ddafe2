use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use stats_core::limits::BUFFER_CAP_FACTOR;
use stats_core::EventRecord;
use telemetry::metrics;
use tracing::warn;

struct Inner {
    events: VecDeque<EventRecord>,
    oldest_at: Option<Instant>,
}

/// In-memory staging area for events awaiting flush. Bounded at
/// `BUFFER_CAP_FACTOR * batch_size`; when a failed flush re-buffers
/// more than fits, the oldest events are discarded.
pub struct EventBuffer {
    inner: Mutex<Inner>,
    batch_size: usize,
    capacity: usize,
}

impl EventBuffer {
    pub fn new(batch_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                events: VecDeque::with_capacity(batch_size),
                oldest_at: None,
            }),
            batch_size,
            capacity: batch_size * BUFFER_CAP_FACTOR,
        }
    }

    /// Appends one event. Returns the pending batch when the buffer
    /// has reached `batch_size`.
    pub fn append(&self, event: EventRecord) -> Option<Vec<EventRecord>> {
        let mut inner = self.inner.lock();
        if inner.events.is_empty() {
            inner.oldest_at = Some(Instant::now());
        }
        inner.events.push_back(event);
        let taken = if inner.events.len() >= self.batch_size {
            Some(Self::drain(&mut inner))
        } else {
            None
        };
        metrics().buffer_depth.set(inner.events.len() as u64);
        taken
    }

    /// Takes everything pending, if the oldest event has waited at
    /// least `max_age`. Used by the periodic flush tick.
    pub fn take_aged(&self, max_age: Duration) -> Option<Vec<EventRecord>> {
        let mut inner = self.inner.lock();
        let aged = inner
            .oldest_at
            .is_some_and(|oldest| oldest.elapsed() >= max_age);
        if !aged || inner.events.is_empty() {
            return None;
        }
        let taken = Self::drain(&mut inner);
        metrics().buffer_depth.set(0);
        Some(taken)
    }

    /// Takes everything pending unconditionally. Used at shutdown.
    pub fn take_all(&self) -> Vec<EventRecord> {
        let mut inner = self.inner.lock();
        let taken = Self::drain(&mut inner);
        metrics().buffer_depth.set(0);
        taken
    }

    /// Puts a failed batch back at the front so ordering is preserved
    /// for the retry. Overflow beyond capacity discards the oldest.
    pub fn restore(&self, events: Vec<EventRecord>) {
        let mut inner = self.inner.lock();
        for event in events.into_iter().rev() {
            inner.events.push_front(event);
        }
        if inner.events.len() > self.capacity {
            let excess = inner.events.len() - self.capacity;
            inner.events.drain(..excess);
            metrics().events_dropped_overflow.inc_by(excess as u64);
            warn!(dropped = excess, "buffer over capacity, oldest events discarded");
        }
        if inner.oldest_at.is_none() && !inner.events.is_empty() {
            inner.oldest_at = Some(Instant::now());
        }
        metrics().buffer_depth.set(inner.events.len() as u64);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn drain(inner: &mut Inner) -> Vec<EventRecord> {
        inner.oldest_at = None;
        inner.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(event_type: &str) -> EventRecord {
        EventRecord {
            event_type: event_type.to_string(),
            object_id: 1,
            object_type: "post".to_string(),
            session_id: "a".repeat(32),
            timestamp: Utc::now(),
            value: None,
            referrer_domain: None,
            user_agent_hash: None,
            meta: None,
        }
    }

    #[test]
    fn test_append_returns_batch_at_size() {
        let buffer = EventBuffer::new(2);
        assert!(buffer.append(event("pageview")).is_none());
        let batch = buffer.append(event("pageview")).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_take_aged_respects_age() {
        let buffer = EventBuffer::new(10);
        buffer.append(event("pageview"));
        assert!(buffer.take_aged(Duration::from_secs(60)).is_none());
        let batch = buffer.take_aged(Duration::ZERO).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_restore_preserves_order() {
        let buffer = EventBuffer::new(10);
        buffer.append(event("a"));
        let mut failed = vec![event("x"), event("y")];
        failed[0].object_id = 100;
        failed[1].object_id = 200;
        buffer.restore(failed);
        let all = buffer.take_all();
        assert_eq!(all[0].object_id, 100);
        assert_eq!(all[1].object_id, 200);
        assert_eq!(all[2].event_type, "a");
    }

    #[test]
    fn test_restore_drops_oldest_past_capacity() {
        let buffer = EventBuffer::new(1); // capacity = BUFFER_CAP_FACTOR
        let over = (0..BUFFER_CAP_FACTOR + 3).map(|_| event("pageview")).collect();
        buffer.restore(over);
        assert_eq!(buffer.len(), BUFFER_CAP_FACTOR);
    }
}
