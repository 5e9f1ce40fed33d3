use chrono::{DateTime, Utc};

use crate::models::range::RangeWindow;
use crate::models::snapshot::Snapshot;

/// Time-window filtering over snapshot sequences.
pub struct SnapshotService;

impl SnapshotService {
    pub fn new() -> Self {
        Self
    }

    /// Keep snapshots with `timestamp >= lower bound of window`.
    ///
    /// Order is preserved as given; `All` returns everything unchanged.
    pub fn filter_by_range<'a>(
        &self,
        snapshots: &'a [Snapshot],
        window: RangeWindow,
        now: DateTime<Utc>,
    ) -> Vec<&'a Snapshot> {
        match window.lower_bound_millis(now) {
            Some(from) => snapshots.iter().filter(|s| s.timestamp >= from).collect(),
            None => snapshots.iter().collect(),
        }
    }
}

impl Default for SnapshotService {
    fn default() -> Self {
        Self::new()
    }
}
