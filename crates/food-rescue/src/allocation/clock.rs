use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

use super::domain::{ActivityId, LotId};

/// Source of "now" for expiry comparisons and record timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant, for demos and reproducible runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Mints identifiers for lots created at intake and for activity records.
pub trait IdGenerator: Send + Sync {
    fn next_lot_id(&self) -> LotId;
    fn next_activity_id(&self) -> ActivityId;
}

/// Process-local counters rendered as `lot-000001` / `act-000001`.
#[derive(Debug)]
pub struct SequentialIds {
    lots: AtomicU64,
    activities: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            lots: AtomicU64::new(first),
            activities: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_lot_id(&self) -> LotId {
        let id = self.lots.fetch_add(1, Ordering::Relaxed);
        LotId(format!("lot-{id:06}"))
    }

    fn next_activity_id(&self) -> ActivityId {
        let id = self.activities.fetch_add(1, Ordering::Relaxed);
        ActivityId(format!("act-{id:06}"))
    }
}
