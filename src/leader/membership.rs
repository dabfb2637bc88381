//! Membership table
//!
//! Leader-side registry of known nodes keyed by address. All mutation goes
//! through one table-wide mutex: concurrent telemetry sessions never
//! interleave a read-modify-write, and snapshots observe a consistent state.
//! Records are replaced in place on upsert so score ties keep their
//! insertion order. No suspension point ever holds the lock.

use crate::common::score;
use crate::protocol::NodeRecord;
use std::sync::Mutex;

pub struct MembershipTable {
    inner: Mutex<Vec<NodeRecord>>,
}

impl MembershipTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
        }
    }

    /// Insert or replace the record for `record.address`.
    ///
    /// The score is recomputed from the incoming profile and metrics before
    /// the record lands, so the table never holds a stale score.
    pub fn upsert(&self, mut record: NodeRecord) {
        record.score = score::calculate(&record.profile, &record.metrics);
        let mut inner = self.inner.lock().unwrap();
        match inner.iter_mut().find(|r| r.address == record.address) {
            Some(existing) => *existing = record,
            None => inner.push(record),
        }
    }

    /// Remove the record for `address`. Returns whether it existed.
    pub fn remove(&self, address: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.len();
        inner.retain(|r| r.address != address);
        inner.len() != before
    }

    pub fn get(&self, address: &str) -> Option<NodeRecord> {
        let inner = self.inner.lock().unwrap();
        inner.iter().find(|r| r.address == address).cloned()
    }

    /// Point-in-time copy ordered by descending score; ties keep insertion
    /// order (stable sort).
    pub fn snapshot(&self) -> Vec<NodeRecord> {
        let inner = self.inner.lock().unwrap();
        let mut records = inner.clone();
        records.sort_by(|a, b| b.score.cmp(&a.score));
        records
    }

    /// The `n` highest-scored entries as `(address, score)` pairs.
    pub fn top_candidates(&self, n: usize) -> Vec<(String, i32)> {
        self.snapshot()
            .into_iter()
            .take(n)
            .map(|r| (r.address, r.score))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

impl Default for MembershipTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ConnectionState, DynamicMetrics, NodeRole, StaticProfile};

    fn record(address: &str, memory_free: &str) -> NodeRecord {
        NodeRecord {
            role: NodeRole::Follower,
            address: address.to_string(),
            hostname: format!("host-{}", address),
            profile: StaticProfile {
                processor_model: "Intel Core i5".to_string(),
                processor_speed: "3.00 GHz".to_string(),
                core_count: "4".to_string(),
                disk_capacity: "500.00 GB".to_string(),
                os_version: "Linux 6.1".to_string(),
            },
            metrics: DynamicMetrics {
                cpu_free: "50.00 %".to_string(),
                memory_free: memory_free.to_string(),
                disk_free: "250.00 GB".to_string(),
                bandwidth_free: "50.00 %".to_string(),
            },
            score: 0,
            connection: ConnectionState::Connected,
        }
    }

    #[test]
    fn test_upsert_is_idempotent_per_address() {
        let table = MembershipTable::new();
        table.upsert(record("10.0.0.2", "8.00 GB"));
        table.upsert(record("10.0.0.2", "16.00 GB"));
        assert_eq!(table.len(), 1);

        let stored = table.get("10.0.0.2").unwrap();
        assert_eq!(stored.metrics.memory_free, "16.00 GB");
    }

    #[test]
    fn test_score_recomputed_on_upsert() {
        let table = MembershipTable::new();
        let mut rec = record("10.0.0.2", "8.00 GB");
        rec.score = 9999; // stale value must be overwritten
        table.upsert(rec);

        let stored = table.get("10.0.0.2").unwrap();
        assert_eq!(
            stored.score,
            score::calculate(&stored.profile, &stored.metrics)
        );
        assert_ne!(stored.score, 9999);
    }

    #[test]
    fn test_remove() {
        let table = MembershipTable::new();
        table.upsert(record("10.0.0.2", "8.00 GB"));
        assert!(table.remove("10.0.0.2"));
        assert!(!table.remove("10.0.0.2"));
        assert!(table.get("10.0.0.2").is_none());
        assert!(table.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_ordered_by_score_desc() {
        let table = MembershipTable::new();
        table.upsert(record("10.0.0.2", "4.00 GB"));
        table.upsert(record("10.0.0.3", "30.00 GB"));
        table.upsert(record("10.0.0.4", "16.00 GB"));

        let snapshot = table.snapshot();
        assert_eq!(snapshot[0].address, "10.0.0.3");
        assert_eq!(snapshot[1].address, "10.0.0.4");
        assert_eq!(snapshot[2].address, "10.0.0.2");
    }

    #[test]
    fn test_top_candidates() {
        let table = MembershipTable::new();
        table.upsert(record("10.0.0.2", "4.00 GB"));
        table.upsert(record("10.0.0.3", "30.00 GB"));
        table.upsert(record("10.0.0.4", "16.00 GB"));
        table.upsert(record("10.0.0.5", "8.00 GB"));

        let top = table.top_candidates(3);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].0, "10.0.0.3");
        assert_eq!(top[1].0, "10.0.0.4");
        assert!(top[0].1 >= top[1].1 && top[1].1 >= top[2].1);
    }

    #[test]
    fn test_ties_preserve_insertion_order() {
        let table = MembershipTable::new();
        table.upsert(record("10.0.0.2", "8.00 GB"));
        table.upsert(record("10.0.0.3", "8.00 GB"));
        table.upsert(record("10.0.0.4", "8.00 GB"));

        let top = table.top_candidates(3);
        assert_eq!(top[0].0, "10.0.0.2");
        assert_eq!(top[1].0, "10.0.0.3");
        assert_eq!(top[2].0, "10.0.0.4");
    }

    #[test]
    fn test_update_does_not_move_to_back_on_tie() {
        let table = MembershipTable::new();
        table.upsert(record("10.0.0.2", "8.00 GB"));
        table.upsert(record("10.0.0.3", "8.00 GB"));
        // Refresh the first entry; it keeps its position
        table.upsert(record("10.0.0.2", "8.00 GB"));

        let top = table.top_candidates(2);
        assert_eq!(top[0].0, "10.0.0.2");
    }
}
