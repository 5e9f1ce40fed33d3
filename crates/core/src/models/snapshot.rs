use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::totals::{Totals, TypeBreakdown};

/// Maximum number of snapshots kept; older ones are evicted first.
pub const MAX_SNAPSHOTS: usize = 20;

/// An immutable capture of `Totals` at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub date: DateTime<Utc>,

    /// Milliseconds since the Unix epoch. Ordering key.
    pub timestamp: i64,

    pub total_value: f64,

    /// Older documents named these after the default people.
    #[serde(alias = "deanTotal")]
    pub p1_total: f64,
    #[serde(alias = "samTotal")]
    pub p2_total: f64,

    #[serde(default)]
    pub by_type: TypeBreakdown,

    #[serde(default)]
    pub asset_count: usize,
}

impl Snapshot {
    pub fn capture(totals: &Totals, asset_count: usize, now: DateTime<Utc>) -> Self {
        Self {
            date: now,
            timestamp: now.timestamp_millis(),
            total_value: totals.combined.value,
            p1_total: totals.p1.value,
            p2_total: totals.p2.value,
            by_type: totals.by_type,
            asset_count,
        }
    }
}

/// Bounded, insertion-ordered snapshot log.
///
/// Serializes as a plain array; loading an over-long array keeps the
/// newest entries. Insertion order is assumed to be chronological; nothing
/// here re-sorts it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Snapshot>", into = "Vec<Snapshot>")]
pub struct SnapshotHistory {
    entries: Vec<Snapshot>,
}

impl SnapshotHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from existing snapshots, keeping only the newest
    /// `MAX_SNAPSHOTS` by position.
    pub fn from_snapshots(mut entries: Vec<Snapshot>) -> Self {
        if entries.len() > MAX_SNAPSHOTS {
            entries.drain(..entries.len() - MAX_SNAPSHOTS);
        }
        Self { entries }
    }

    /// Capture `totals` at `now`, append it, and evict the oldest entries
    /// beyond `MAX_SNAPSHOTS`. Returns the new snapshot.
    pub fn append(&mut self, totals: &Totals, asset_count: usize, now: DateTime<Utc>) -> &Snapshot {
        self.push(Snapshot::capture(totals, asset_count, now));
        &self.entries[self.entries.len() - 1]
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.entries.push(snapshot);
        if self.entries.len() > MAX_SNAPSHOTS {
            let excess = self.entries.len() - MAX_SNAPSHOTS;
            self.entries.drain(..excess);
        }
    }

    /// Remove every snapshot with this timestamp. Returns how many were removed.
    pub fn remove(&mut self, timestamp: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|s| s.timestamp != timestamp);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn as_slice(&self) -> &[Snapshot] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.last()
    }

    /// Snapshots sorted newest first, for list display.
    pub fn newest_first(&self) -> Vec<&Snapshot> {
        let mut sorted: Vec<&Snapshot> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted
    }
}

impl From<Vec<Snapshot>> for SnapshotHistory {
    fn from(entries: Vec<Snapshot>) -> Self {
        Self::from_snapshots(entries)
    }
}

impl From<SnapshotHistory> for Vec<Snapshot> {
    fn from(history: SnapshotHistory) -> Self {
        history.entries
    }
}
