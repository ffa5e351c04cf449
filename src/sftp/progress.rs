//! Transfer progress registry
//!
//! One record per logical file transfer, written by the task driving that
//! transfer and read by any number of pollers. The registry is constructed
//! explicitly and shared by handle; there is no process-global instance.
//!
//! Records are never evicted by the engine; history accumulates until the
//! host calls [`ProgressRegistry::prune_terminal`].

use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

use super::types::{TransferDirection, TransferSnapshot, TransferState};

#[derive(Debug, Clone)]
struct TransferRecord {
    batch: Option<Uuid>,
    done: u64,
    total: u64,
    state: TransferState,
    error: Option<String>,
}

/// Registry of transfer progress records
#[derive(Default)]
pub struct ProgressRegistry {
    records: RwLock<HashMap<Uuid, TransferRecord>>,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending record.
    ///
    /// Called before the transfer task runs so the identifier is pollable as
    /// soon as the caller receives it. `batch` groups the per-file records of
    /// one directory transfer.
    pub fn register(&self, id: Uuid, batch: Option<Uuid>) {
        let mut records = self.records.write();
        records.insert(
            id,
            TransferRecord {
                batch,
                done: 0,
                total: 0,
                state: TransferState::Pending,
                error: None,
            },
        );
    }

    /// Move a pending record to its active direction once the source size is
    /// known, before the first byte moves.
    pub fn start(&self, id: Uuid, total: u64, direction: TransferDirection) {
        let mut records = self.records.write();
        if let Some(record) = records.get_mut(&id) {
            if record.state.is_terminal() {
                return;
            }
            record.total = total;
            record.state = match direction {
                TransferDirection::Upload => TransferState::Uploading,
                TransferDirection::Download => TransferState::Downloading,
            };
        }
    }

    /// Overwrite the byte counters with the latest snapshot.
    ///
    /// `done` never regresses and terminal records are left untouched, so the
    /// monotonicity pollers rely on holds no matter how updates race.
    pub fn update(&self, id: Uuid, done: u64, total: u64) {
        let mut records = self.records.write();
        if let Some(record) = records.get_mut(&id) {
            if record.state.is_terminal() {
                return;
            }
            record.done = record.done.max(done);
            // A source that grows after the initial stat would otherwise push
            // done past total.
            record.total = total.max(record.done);
        }
    }

    /// Mark a transfer as successfully finished.
    pub fn complete(&self, id: Uuid) {
        let mut records = self.records.write();
        if let Some(record) = records.get_mut(&id) {
            if record.state.is_terminal() {
                return;
            }
            record.done = record.total;
            record.state = TransferState::Done;
        }
    }

    /// Mark a transfer as failed.
    pub fn fail(&self, id: Uuid, message: impl Into<String>) {
        let mut records = self.records.write();
        if let Some(record) = records.get_mut(&id) {
            if record.state.is_terminal() {
                return;
            }
            record.state = TransferState::Error;
            record.error = Some(message.into());
        }
    }

    /// Point-in-time view of one transfer; unknown identifiers yield the
    /// sentinel snapshot instead of an error.
    pub fn snapshot(&self, id: Uuid) -> TransferSnapshot {
        let records = self.records.read();
        match records.get(&id) {
            Some(record) => snapshot_of(id, record),
            None => TransferSnapshot::unknown(id),
        }
    }

    /// All per-file snapshots belonging to one directory-transfer batch.
    pub fn batch_snapshots(&self, batch: Uuid) -> Vec<TransferSnapshot> {
        let records = self.records.read();
        records
            .iter()
            .filter(|(_, record)| record.batch == Some(batch))
            .map(|(id, record)| snapshot_of(*id, record))
            .collect()
    }

    /// Drop records that reached a terminal state; returns how many were
    /// removed. The engine never calls this; the host decides when history
    /// may be discarded.
    pub fn prune_terminal(&self) -> usize {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, record| !record.state.is_terminal());
        before - records.len()
    }

    /// Number of tracked records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

fn snapshot_of(id: Uuid, record: &TransferRecord) -> TransferSnapshot {
    TransferSnapshot {
        id,
        done: record.done,
        total: record.total,
        state: record.state,
        error: record.error.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_id_yields_sentinel() {
        let registry = ProgressRegistry::new();
        let snapshot = registry.snapshot(Uuid::new_v4());
        assert_eq!(snapshot.done, 0);
        assert_eq!(snapshot.total, 0);
        assert_eq!(snapshot.state, TransferState::Unknown);
    }

    #[test]
    fn lifecycle_runs_pending_to_done() {
        let registry = ProgressRegistry::new();
        let id = Uuid::new_v4();

        registry.register(id, None);
        assert_eq!(registry.snapshot(id).state, TransferState::Pending);

        registry.start(id, 100, TransferDirection::Upload);
        let snapshot = registry.snapshot(id);
        assert_eq!(snapshot.state, TransferState::Uploading);
        assert_eq!(snapshot.total, 100);
        assert_eq!(snapshot.done, 0);

        registry.update(id, 40, 100);
        assert_eq!(registry.snapshot(id).done, 40);

        registry.complete(id);
        let snapshot = registry.snapshot(id);
        assert_eq!(snapshot.state, TransferState::Done);
        assert_eq!(snapshot.done, 100);
    }

    #[test]
    fn done_never_regresses() {
        let registry = ProgressRegistry::new();
        let id = Uuid::new_v4();
        registry.register(id, None);
        registry.start(id, 100, TransferDirection::Download);

        registry.update(id, 60, 100);
        registry.update(id, 30, 100);
        assert_eq!(registry.snapshot(id).done, 60);
    }

    #[test]
    fn total_keeps_pace_with_overrun_done() {
        let registry = ProgressRegistry::new();
        let id = Uuid::new_v4();
        registry.register(id, None);
        registry.start(id, 100, TransferDirection::Upload);

        // Source grew after the initial stat.
        registry.update(id, 120, 100);
        let snapshot = registry.snapshot(id);
        assert!(snapshot.done <= snapshot.total);
        assert_eq!(snapshot.total, 120);
    }

    #[test]
    fn terminal_states_are_absorbing() {
        let registry = ProgressRegistry::new();
        let id = Uuid::new_v4();
        registry.register(id, None);
        registry.start(id, 10, TransferDirection::Upload);
        registry.complete(id);

        registry.update(id, 3, 10);
        registry.fail(id, "late failure");
        let snapshot = registry.snapshot(id);
        assert_eq!(snapshot.state, TransferState::Done);
        assert_eq!(snapshot.done, 10);
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn failed_transfer_keeps_partial_progress() {
        let registry = ProgressRegistry::new();
        let id = Uuid::new_v4();
        registry.register(id, None);
        registry.start(id, 100, TransferDirection::Download);
        registry.update(id, 25, 100);
        registry.fail(id, "connection reset");

        let snapshot = registry.snapshot(id);
        assert_eq!(snapshot.state, TransferState::Error);
        assert_eq!(snapshot.done, 25);
        assert!(snapshot.done <= snapshot.total);
        assert_eq!(snapshot.error.as_deref(), Some("connection reset"));
    }

    #[test]
    fn batch_snapshots_enumerate_only_that_batch() {
        let registry = ProgressRegistry::new();
        let batch = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let lone = Uuid::new_v4();

        registry.register(a, Some(batch));
        registry.register(b, Some(batch));
        registry.register(lone, None);

        let snapshots = registry.batch_snapshots(batch);
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots.iter().any(|s| s.id == a));
        assert!(snapshots.iter().any(|s| s.id == b));
    }

    #[test]
    fn prune_terminal_keeps_live_records() {
        let registry = ProgressRegistry::new();
        let live = Uuid::new_v4();
        let finished = Uuid::new_v4();

        registry.register(live, None);
        registry.start(live, 10, TransferDirection::Upload);
        registry.register(finished, None);
        registry.start(finished, 10, TransferDirection::Upload);
        registry.complete(finished);

        assert_eq!(registry.prune_terminal(), 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.snapshot(live).state, TransferState::Uploading);
        assert_eq!(registry.snapshot(finished).state, TransferState::Unknown);
    }
}
