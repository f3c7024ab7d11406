//! Writer: drains the OutputBuffer, publishes to the sink, tracks
//! confirmations through a priority heap keyed by enqueue id, and
//! checkpoints.
//!
//! Grounded on `original_source/src/Writer.cpp`'s `sortQueue`/
//! `confirmMessage`/`writeCheckpoint` trio, with the hand-rolled
//! sift-down replaced by `std::collections::BinaryHeap`.

use super::OutputBuffer;
use crate::checkpoint::CheckpointRecord;
use crate::common::Scn;
use crate::error::Result;
use crate::sink::SinkTransport;
use crate::state::StateStore;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Default, Clone)]
pub struct WriterStats {
    pub messages_sent: u64,
    pub messages_confirmed: u64,
    pub checkpoints_written: u64,
}

/// One message published but not yet confirmed; ordered by enqueue id so
/// `confirmed_prefix` pops the lowest-id entries first regardless of the
/// order confirmations actually arrive in.
struct InFlight {
    id: u64,
    scn: Scn,
}
impl PartialEq for InFlight {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for InFlight {}
impl PartialOrd for InFlight {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for InFlight {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

pub struct Writer {
    buffer: Arc<OutputBuffer>,
    sink: Arc<dyn SinkTransport>,
    state: Arc<dyn StateStore>,
    database: String,
    resetlogs: u32,
    activation: u32,
    checkpoint_interval: Duration,
    in_flight: BinaryHeap<Reverse<InFlight>>,
    confirmed_ids: HashSet<u64>,
    confirmed_scn: AtomicU64,
    last_checkpoint: Option<Instant>,
    stats: WriterStats,
}

impl Writer {
    pub fn new(
        buffer: Arc<OutputBuffer>,
        sink: Arc<dyn SinkTransport>,
        state: Arc<dyn StateStore>,
        database: String,
        resetlogs: u32,
        activation: u32,
        checkpoint_interval_s: u64,
    ) -> Self {
        Self {
            buffer,
            sink,
            state,
            database,
            resetlogs,
            activation,
            checkpoint_interval: Duration::from_secs(checkpoint_interval_s),
            in_flight: BinaryHeap::new(),
            confirmed_ids: HashSet::new(),
            confirmed_scn: AtomicU64::new(0),
            last_checkpoint: None,
            stats: WriterStats::default(),
        }
    }

    pub fn stats(&self) -> WriterStats {
        self.stats.clone()
    }

    pub fn confirmed_scn(&self) -> Scn {
        self.confirmed_scn.load(AtomicOrdering::Acquire)
    }

    /// Pulls every message currently queued and publishes it to the sink.
    /// Non-blocking: returns the count published, `0` if the buffer was
    /// empty.
    pub fn publish_pending(&mut self) -> Result<usize> {
        let mut n = 0;
        while let Some(msg) = self.buffer.try_dequeue() {
            self.sink.send_message(&msg.bytes, msg.id)?;
            self.in_flight.push(Reverse(InFlight { id: msg.id, scn: msg.scn }));
            self.stats.messages_sent += 1;
            n += 1;
        }
        Ok(n)
    }

    /// Marks `id` confirmed and advances `confirmed_scn` across the
    /// maximum contiguous prefix of now-confirmed ids, freeing their
    /// in-flight entries.
    pub fn confirm_message(&mut self, id: u64) {
        self.confirmed_ids.insert(id);
        self.stats.messages_confirmed += 1;

        while let Some(Reverse(head)) = self.in_flight.peek() {
            if self.confirmed_ids.contains(&head.id) {
                let head = self.in_flight.pop().map(|Reverse(h)| h).unwrap();
                self.confirmed_ids.remove(&head.id);
                self.confirmed_scn.fetch_max(head.scn, AtomicOrdering::AcqRel);
            } else {
                break;
            }
        }
    }

    /// Writes a checkpoint if the interval has elapsed, or immediately
    /// when `force` is set (the "schemaScn >= confirmedScn" condition is
    /// evaluated by the caller, which passes `force` in that case).
    pub fn maybe_checkpoint(&mut self, now: Instant, force: bool) -> Result<bool> {
        let due = match self.last_checkpoint {
            Some(last) => now.duration_since(last) >= self.checkpoint_interval,
            None => true,
        };
        if !due && !force {
            return Ok(false);
        }

        let record = CheckpointRecord {
            database: self.database.clone(),
            scn: self.confirmed_scn(),
            resetlogs: self.resetlogs,
            activation: self.activation,
        };
        self.state.write(&CheckpointRecord::state_key(&self.database), &record.to_bytes()?)?;
        self.last_checkpoint = Some(now);
        self.stats.checkpoints_written += 1;
        info!(scn = record.scn, "checkpoint written");
        Ok(true)
    }

    pub fn read_checkpoint(&self) -> Result<Option<CheckpointRecord>> {
        match self.state.read(&CheckpointRecord::state_key(&self.database), 1 << 20)? {
            Some(bytes) => Ok(Some(CheckpointRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputBuffer;
    use crate::state::FileStateStore;
    use parking_lot::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    struct MockSink {
        sent: Mutex<Vec<u64>>,
    }
    impl SinkTransport for MockSink {
        fn send_message(&self, _bytes: &[u8], id: u64) -> Result<()> {
            self.sent.lock().push(id);
            Ok(())
        }
        fn poll_interval(&self) -> Duration {
            Duration::from_millis(1)
        }
        fn poll_confirmations(&self) -> Result<Option<u64>> {
            Ok(None)
        }
    }

    fn writer(dir: &TempDir) -> Writer {
        let buffer = Arc::new(OutputBuffer::new(16));
        let sink: Arc<dyn SinkTransport> = Arc::new(MockSink { sent: Mutex::new(Vec::new()) });
        let state: Arc<dyn StateStore> = Arc::new(FileStateStore::new(dir.path()).unwrap());
        Writer::new(buffer, sink, state, "orcl".into(), 1, 1, 10)
    }

    #[test]
    fn confirm_out_of_order_advances_only_contiguous_prefix() {
        let dir = TempDir::new().unwrap();
        let mut w = writer(&dir);
        w.buffer.enqueue(0, 100, vec![1]);
        w.buffer.enqueue(0, 101, vec![2]);
        w.buffer.enqueue(0, 102, vec![3]);
        w.publish_pending().unwrap();

        w.confirm_message(3);
        assert_eq!(w.confirmed_scn(), 0);

        w.confirm_message(1);
        assert_eq!(w.confirmed_scn(), 100);

        w.confirm_message(2);
        assert_eq!(w.confirmed_scn(), 102);
    }

    #[test]
    fn checkpoint_round_trips_through_state_store() {
        let dir = TempDir::new().unwrap();
        let mut w = writer(&dir);
        w.buffer.enqueue(0, 500, vec![9]);
        w.publish_pending().unwrap();
        w.confirm_message(1);

        w.maybe_checkpoint(Instant::now(), true).unwrap();
        let record = w.read_checkpoint().unwrap().unwrap();
        assert_eq!(record.scn, 500);
        assert_eq!(record.database, "orcl");
    }

    #[test]
    fn checkpoint_not_written_before_interval_unless_forced() {
        let dir = TempDir::new().unwrap();
        let mut w = writer(&dir);
        w.maybe_checkpoint(Instant::now(), false).unwrap();
        assert_eq!(w.stats().checkpoints_written, 1);
        assert!(!w.maybe_checkpoint(Instant::now(), false).unwrap());
        assert_eq!(w.stats().checkpoints_written, 1);
    }
}
