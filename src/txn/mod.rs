//! Transaction buffer: pairs undo/redo records by XID, accumulates
//! per-transaction change lists, and releases them in commit-SCN order.
//!
//! Grounded on the per-XID linked-chain design in
//! `original_source/src/RedoLog.h`; commit ordering (and, in
//! `output::writer`, message ordering) uses `std::collections::BinaryHeap`
//! in place of a hand-rolled sift-down.

pub mod arena;

use crate::common::{CommitKey, Scn, Xid};
use crate::error::{ErrorPosition, OlrError, Result, RuntimeErrorKind};
use crate::parser::record::RedoLogRecord;
use arena::{ChunkCounter, StoredRecord};
use parking_lot::{Condvar, Mutex};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealKind {
    Committed,
    RolledBack,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub xid: Xid,
    pub pairs: Vec<(StoredRecord, StoredRecord)>,
    pub commit_key: Option<CommitKey>,
    pub seal: Option<SealKind>,
}

impl Transaction {
    fn new(xid: Xid) -> Self {
        Self {
            xid,
            pairs: Vec::new(),
            commit_key: None,
            seal: None,
        }
    }
}

/// Shared memory budget bounded by `[memory_min_mb, memory_max_mb]`.
/// `charge` fails once `used` would exceed the max;
/// the Parser throttles by waiting on `wait_for_space` until the Writer's
/// `confirm_message` path frees enough via `release`.
pub struct MemoryBudget {
    used: AtomicU64,
    min_bytes: u64,
    max_bytes: u64,
    mutex: Mutex<()>,
    cv: Condvar,
}

impl MemoryBudget {
    pub fn new(min_mb: u64, max_mb: u64) -> Arc<Self> {
        Arc::new(Self {
            used: AtomicU64::new(0),
            min_bytes: min_mb * 1024 * 1024,
            max_bytes: max_mb * 1024 * 1024,
            mutex: Mutex::new(()),
            cv: Condvar::new(),
        })
    }

    pub fn used_bytes(&self) -> u64 {
        self.used.load(AtomicOrdering::Relaxed)
    }

    pub fn min_bytes(&self) -> u64 {
        self.min_bytes
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Reserves `bytes`. Returns a `MemoryExhausted` runtime error if the
    /// budget is already at its ceiling with nothing freed.
    pub fn charge(&self, bytes: u64) -> Result<()> {
        let prev = self.used.fetch_add(bytes, AtomicOrdering::SeqCst);
        if prev + bytes > self.max_bytes {
            self.used.fetch_sub(bytes, AtomicOrdering::SeqCst);
            return Err(OlrError::runtime(
                RuntimeErrorKind::MemoryExhausted,
                ErrorPosition::default(),
                format!(
                    "memory budget exhausted: {} + {} > max {}",
                    prev, bytes, self.max_bytes
                ),
            ));
        }
        Ok(())
    }

    pub fn release(&self, bytes: u64) {
        self.used.fetch_sub(bytes.min(self.used_bytes()), AtomicOrdering::SeqCst);
        let _guard = self.mutex.lock();
        self.cv.notify_all();
    }

    pub fn is_full(&self) -> bool {
        self.used_bytes() >= self.max_bytes
    }

    /// Blocks until below the max, or returns immediately if already
    /// under it. A real pipeline wakes this via `release` called from the
    /// Writer's confirm path.
    pub fn wait_for_space(&self) {
        let mut guard = self.mutex.lock();
        while self.is_full() {
            self.cv.wait(&mut guard);
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct TransactionBufferStats {
    pub committed: u64,
    pub rolled_back: u64,
    pub dml_paired: u64,
}

pub struct TransactionBuffer {
    open: HashMap<Xid, Transaction>,
    /// Per-XID chain of staged, unpaired undo records, oldest first. A DML
    /// vector's UBA back-pointer is matched against this chain to find the
    /// undo entry it depends on, rather than assuming a single outstanding
    /// undo per XID.
    pending_undo: HashMap<Xid, Vec<StoredRecord>>,
    committed: HashMap<Xid, Transaction>,
    ready: BinaryHeap<Reverse<(CommitKey, Xid)>>,
    chunk_counters: HashMap<Xid, ChunkCounter>,
    budget: Arc<MemoryBudget>,
    stats: TransactionBufferStats,
    /// XID of the most recently staged undo vector. Within one change,
    /// Oracle places the undo vector immediately before its paired redo
    /// vector, so a DML vector with no XID field of its own pairs with
    /// whichever undo was staged last.
    last_undo_xid: Option<Xid>,
}

impl TransactionBuffer {
    pub fn new(budget: Arc<MemoryBudget>) -> Self {
        Self {
            open: HashMap::new(),
            pending_undo: HashMap::new(),
            committed: HashMap::new(),
            ready: BinaryHeap::new(),
            chunk_counters: HashMap::new(),
            budget,
            stats: TransactionBufferStats::default(),
            last_undo_xid: None,
        }
    }

    pub fn stats(&self) -> TransactionBufferStats {
        self.stats.clone()
    }

    fn charge_for(&mut self, xid: Xid, stored: &StoredRecord) -> Result<()> {
        let counter = self.chunk_counters.entry(xid).or_default();
        let grew = counter.account(stored.byte_size());
        if grew > 0 {
            self.budget.charge(grew as u64)?;
        }
        Ok(())
    }

    /// Feeds one decoded vector into the buffer. Begin/undo records are
    /// staged; DML records are paired with the most recent staged undo
    /// for the same XID; commit/rollback seal and release or discard the
    /// transaction.
    pub fn ingest(&mut self, record: &RedoLogRecord<'_>) -> Result<()> {
        match (record.layer, record.subcode) {
            (5, 2) => {
                if let Some(xid) = record.xid {
                    self.open.entry(xid).or_insert_with(|| Transaction::new(xid));
                }
                Ok(())
            }
            (5, 1) => {
                if let Some(xid) = record.xid {
                    self.open.entry(xid).or_insert_with(|| Transaction::new(xid));
                    let stored = StoredRecord::from(record);
                    self.charge_for(xid, &stored)?;
                    self.pending_undo.entry(xid).or_default().push(stored);
                    self.last_undo_xid = Some(xid);
                }
                Ok(())
            }
            (11, _) => {
                let xid = record.xid.or(self.last_undo_xid);
                let xid = match xid {
                    Some(x) => x,
                    None => return Ok(()),
                };
                let undo = {
                    let chain = match self.pending_undo.get_mut(&xid) {
                        Some(c) if !c.is_empty() => c,
                        _ => {
                            return Err(OlrError::runtime(
                                RuntimeErrorKind::SchemaInconsistent,
                                ErrorPosition {
                                    scn: Some(record.scn),
                                    ..Default::default()
                                },
                                format!("DML for xid {xid} arrived with no staged undo record"),
                            ));
                        }
                    };
                    match record.uba {
                        Some(uba) => match chain.iter().position(|u| u.uba == Some(uba)) {
                            Some(pos) => chain.remove(pos),
                            None => chain.remove(0),
                        },
                        None => chain.remove(0),
                    }
                };
                if self.pending_undo.get(&xid).is_some_and(|c| c.is_empty()) {
                    self.pending_undo.remove(&xid);
                }
                let redo = StoredRecord::from(record);
                self.charge_for(xid, &redo)?;
                let txn = self.open.entry(xid).or_insert_with(|| Transaction::new(xid));
                txn.pairs.push((undo, redo));
                self.stats.dml_paired += 1;
                Ok(())
            }
            (5, 4) => {
                let xid = record.xid;
                if let Some(xid) = xid {
                    if let Some(mut txn) = self.open.remove(&xid) {
                        let key = CommitKey::new(record.scn, record.sub_scn);
                        txn.commit_key = Some(key);
                        txn.seal = Some(SealKind::Committed);
                        self.ready.push(Reverse((key, xid)));
                        self.committed.insert(xid, txn);
                        self.stats.committed += 1;
                    }
                    self.pending_undo.remove(&xid);
                    self.chunk_counters.remove(&xid);
                }
                Ok(())
            }
            (5, 6) | (5, 11) => {
                if let Some(xid) = record.xid {
                    self.open.remove(&xid);
                    self.pending_undo.remove(&xid);
                    self.chunk_counters.remove(&xid);
                    self.stats.rolled_back += 1;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// The minimum commit-relevant SCN across transactions still open;
    /// gates release so nothing jumps ahead of an in-flight transaction
    /// that might still commit at a lower SCN than something already
    /// queued. Returns `None` when nothing is open (no gate needed).
    pub fn release_watermark(&self) -> Option<Scn> {
        self.open
            .values()
            .flat_map(|t| t.pairs.iter().map(|(_, redo)| redo.scn))
            .chain(self.pending_undo.values().flat_map(|chain| chain.iter().map(|u| u.scn)))
            .min()
    }

    /// Drains committed transactions ready for emission: every entry with
    /// `commit_key.scn <= watermark` (or all of them, if nothing is open),
    /// in ascending commit order.
    pub fn release_ready(&mut self) -> Vec<Transaction> {
        let watermark = self.release_watermark();
        let mut out = Vec::new();
        while let Some(Reverse((key, xid))) = self.ready.peek().copied() {
            if let Some(wm) = watermark {
                if key.scn > wm {
                    break;
                }
            }
            self.ready.pop();
            if let Some(txn) = self.committed.remove(&xid) {
                out.push(txn);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Dba;

    fn record<'a>(layer: u8, subcode: u8, scn: Scn, xid: Option<Xid>, vector: &'a [u8]) -> RedoLogRecord<'a> {
        RedoLogRecord {
            layer,
            subcode,
            scn,
            sub_scn: 0,
            xid,
            obj: Some(1),
            data_obj: Some(1),
            dba: Some(Dba::new(1, 1)),
            slot: Some(0),
            uba: None,
            vector,
            nulls_delta: None,
            col_nums_delta: None,
        }
    }

    fn record_with_uba<'a>(
        layer: u8,
        subcode: u8,
        scn: Scn,
        xid: Option<Xid>,
        uba: Option<crate::common::Uba>,
        vector: &'a [u8],
    ) -> RedoLogRecord<'a> {
        let mut r = record(layer, subcode, scn, xid, vector);
        r.uba = uba;
        r
    }

    #[test]
    fn undo_redo_pairs_then_commit_releases() {
        let budget = MemoryBudget::new(1, 64);
        let mut buf = TransactionBuffer::new(budget);
        let xid = Xid::new(1, 1, 1);
        let v = [0u8; 4];

        buf.ingest(&record(5, 2, 100, Some(xid), &v)).unwrap();
        buf.ingest(&record(5, 1, 100, Some(xid), &v)).unwrap();
        buf.ingest(&record(11, 2, 100, Some(xid), &v)).unwrap();
        buf.ingest(&record(5, 4, 100, Some(xid), &v)).unwrap();

        let ready = buf.release_ready();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].pairs.len(), 1);
        assert_eq!(buf.stats().committed, 1);
    }

    #[test]
    fn rollback_discards_without_release() {
        let budget = MemoryBudget::new(1, 64);
        let mut buf = TransactionBuffer::new(budget);
        let xid = Xid::new(2, 2, 2);
        let v = [0u8; 4];

        buf.ingest(&record(5, 2, 10, Some(xid), &v)).unwrap();
        buf.ingest(&record(5, 1, 10, Some(xid), &v)).unwrap();
        buf.ingest(&record(11, 3, 10, Some(xid), &v)).unwrap();
        buf.ingest(&record(5, 11, 10, Some(xid), &v)).unwrap();

        assert!(buf.release_ready().is_empty());
        assert_eq!(buf.stats().rolled_back, 1);
    }

    #[test]
    fn lower_commit_scn_released_before_higher_even_if_committed_later() {
        let budget = MemoryBudget::new(1, 64);
        let mut buf = TransactionBuffer::new(budget);
        let a = Xid::new(1, 1, 1);
        let b = Xid::new(2, 2, 2);
        let v = [0u8; 4];

        buf.ingest(&record(5, 1, 90, Some(a), &v)).unwrap();
        buf.ingest(&record(11, 2, 90, Some(a), &v)).unwrap();
        buf.ingest(&record(5, 1, 95, Some(b), &v)).unwrap();
        buf.ingest(&record(11, 2, 95, Some(b), &v)).unwrap();
        buf.ingest(&record(5, 4, 100, Some(a), &v)).unwrap();
        buf.ingest(&record(5, 4, 99, Some(b), &v)).unwrap();

        let ready = buf.release_ready();
        assert_eq!(ready.len(), 2);
        assert_eq!(ready[0].xid, b);
        assert_eq!(ready[1].xid, a);
    }

    #[test]
    fn dml_without_staged_undo_is_schema_inconsistent_error() {
        let budget = MemoryBudget::new(1, 64);
        let mut buf = TransactionBuffer::new(budget);
        let xid = Xid::new(9, 9, 9);
        let v = [0u8; 4];
        buf.ingest(&record(5, 2, 1, Some(xid), &v)).unwrap();
        let err = buf.ingest(&record(11, 2, 1, Some(xid), &v)).unwrap_err();
        assert!(err.to_string().contains("schema inconsistent"));
    }

    #[test]
    fn two_staged_undos_pair_by_uba_not_overwrite() {
        let budget = MemoryBudget::new(1, 64);
        let mut buf = TransactionBuffer::new(budget);
        let xid = Xid::new(3, 3, 3);
        let v = [0u8; 4];
        let uba_a = crate::common::Uba {
            dba: Dba::new(1, 1),
            sequence: 1,
            record: 1,
        };
        let uba_b = crate::common::Uba {
            dba: Dba::new(1, 1),
            sequence: 1,
            record: 2,
        };

        buf.ingest(&record(5, 2, 10, Some(xid), &v)).unwrap();
        buf.ingest(&record_with_uba(5, 1, 10, Some(xid), Some(uba_a), &v)).unwrap();
        buf.ingest(&record_with_uba(5, 1, 11, Some(xid), Some(uba_b), &v)).unwrap();

        buf.ingest(&record_with_uba(11, 2, 12, Some(xid), Some(uba_b), &v)).unwrap();
        buf.ingest(&record_with_uba(11, 3, 13, Some(xid), Some(uba_a), &v)).unwrap();
        buf.ingest(&record(5, 4, 20, Some(xid), &v)).unwrap();

        let ready = buf.release_ready();
        assert_eq!(ready.len(), 1);
        let txn = &ready[0];
        assert_eq!(txn.pairs.len(), 2);
        assert_eq!(txn.pairs[0].0.uba, Some(uba_b));
        assert_eq!(txn.pairs[1].0.uba, Some(uba_a));
    }

    #[test]
    fn memory_budget_rejects_overflow() {
        let budget = MemoryBudget::new(1, 1);
        budget.charge(1).unwrap();
        assert!(budget.charge(2 * 1024 * 1024).is_err());
    }
}
