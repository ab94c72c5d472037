//! Aggregated result of a sync run

use std::ops::AddAssign;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Counts from one or more sync runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Destinations written (or that would be written in a dry run)
    pub updated: usize,
    /// Destinations already byte-identical to their artifact
    pub up_to_date: usize,
    /// Protos with no generator in their BUILD file
    pub unresolved: usize,
}

impl SyncOutcome {
    /// Whether any destination changed.
    pub fn changed(&self) -> bool {
        self.updated > 0
    }
}

impl AddAssign for SyncOutcome {
    fn add_assign(&mut self, rhs: Self) {
        self.updated += rhs.updated;
        self.up_to_date += rhs.up_to_date;
        self.unresolved += rhs.unresolved;
    }
}

/// Lock-free counters shared by workers during a run.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    updated: AtomicUsize,
    up_to_date: AtomicUsize,
    unresolved: AtomicUsize,
}

impl Counters {
    pub(crate) fn updated(&self) {
        self.updated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn up_to_date(&self) {
        self.up_to_date.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn unresolved(&self) {
        self.unresolved.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> SyncOutcome {
        SyncOutcome {
            updated: self.updated.load(Ordering::Relaxed),
            up_to_date: self.up_to_date.load(Ordering::Relaxed),
            unresolved: self.unresolved.load(Ordering::Relaxed),
        }
    }
}
