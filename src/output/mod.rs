//! OutputBuffer: the single-producer single-consumer queue of encoded
//! messages between the transaction buffer and the Writer.
//!
//! Follows a `buffer::manager`-style bounded-queue pattern (parking_lot
//! mutex + condvar, blocking producer/consumer) adapted to carry
//! `OutputMsg` headers instead of database pages.

pub mod writer;

use crate::common::Scn;
use bitflags::bitflags;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MessageFlags: u8 {
        const CONFIRMED = 0b01;
    }
}

/// One encoded message plus the header fields the Writer needs to order,
/// publish, and checkpoint it.
#[derive(Debug, Clone)]
pub struct OutputMsg {
    pub id: u64,
    pub queue_id: u32,
    pub scn: Scn,
    pub bytes: Vec<u8>,
    pub flags: MessageFlags,
}

struct Inner {
    queue: VecDeque<OutputMsg>,
    capacity: usize,
}

/// Bounded SPSC queue. The transaction buffer (producer) blocks when
/// full; the Writer (consumer) blocks when empty — mirrors the
/// "Writer sleeps `pollIntervalUs` when full" resource bound, expressed
/// here as a condvar wait rather than a sleep/poll loop so tests don't
/// need to sleep.
pub struct OutputBuffer {
    inner: Mutex<Inner>,
    not_empty: Condvar,
    not_full: Condvar,
    next_id: AtomicU64,
}

impl OutputBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                capacity: capacity.max(1),
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Enqueues one message, assigning it the next strictly increasing
    /// id. Blocks if the queue is at `queueSize` capacity.
    pub fn enqueue(&self, queue_id: u32, scn: Scn, bytes: Vec<u8>) -> u64 {
        let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
        let mut inner = self.inner.lock();
        while inner.queue.len() >= inner.capacity {
            self.not_full.wait(&mut inner);
        }
        inner.queue.push_back(OutputMsg {
            id,
            queue_id,
            scn,
            bytes,
            flags: MessageFlags::empty(),
        });
        self.not_empty.notify_one();
        id
    }

    /// Pops the next message in enqueue order, blocking until one is
    /// available or `stop` unblocks all waiters with `None`.
    pub fn dequeue(&self) -> Option<OutputMsg> {
        let mut inner = self.inner.lock();
        while inner.queue.is_empty() {
            self.not_empty.wait(&mut inner);
        }
        let msg = inner.queue.pop_front();
        self.not_full.notify_one();
        msg
    }

    pub fn try_dequeue(&self) -> Option<OutputMsg> {
        let mut inner = self.inner.lock();
        let msg = inner.queue.pop_front();
        if msg.is_some() {
            self.not_full.notify_one();
        }
        msg
    }

    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wakes every blocked producer/consumer, used at shutdown.
    pub fn wake_all(&self) {
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_assigns_increasing_ids() {
        let buf = OutputBuffer::new(8);
        let id1 = buf.enqueue(0, 100, vec![1]);
        let id2 = buf.enqueue(0, 101, vec![2]);
        assert!(id2 > id1);
    }

    #[test]
    fn dequeue_preserves_fifo_order() {
        let buf = OutputBuffer::new(8);
        buf.enqueue(0, 1, vec![1]);
        buf.enqueue(0, 2, vec![2]);
        let first = buf.try_dequeue().unwrap();
        let second = buf.try_dequeue().unwrap();
        assert!(first.id < second.id);
        assert_eq!(first.bytes, vec![1]);
    }

    #[test]
    fn try_dequeue_empty_is_none() {
        let buf = OutputBuffer::new(4);
        assert!(buf.try_dequeue().is_none());
    }
}
