use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;

/// Running pageview count for the current UTC day, used as the
/// sampling trigger. Resets itself when the date rolls over.
pub struct DailyVolume {
    count: AtomicU64,
    day: RwLock<NaiveDate>,
}

impl DailyVolume {
    /// Seeds the counter, typically from a store query at boot.
    pub fn new(day: NaiveDate, initial: u64) -> Self {
        Self {
            count: AtomicU64::new(initial),
            day: RwLock::new(day),
        }
    }

    pub fn today(initial: u64) -> Self {
        Self::new(Utc::now().date_naive(), initial)
    }

    /// Increments and returns the count after this event.
    pub fn record(&self) -> u64 {
        self.roll_if_needed();
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn current(&self) -> u64 {
        self.roll_if_needed();
        self.count.load(Ordering::Relaxed)
    }

    fn roll_if_needed(&self) {
        let today = Utc::now().date_naive();
        if *self.day.read() == today {
            return;
        }
        let mut day = self.day.write();
        // another writer may have rolled while we waited for the lock
        if *day != today {
            self.count.store(0, Ordering::Relaxed);
            *day = today;
        }
    }
}
