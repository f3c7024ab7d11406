//! Reader: presents one redo log file as a sequence of validated blocks,
//! bounded in memory by a ring of fixed chunks.
//!
//! Follows a `storage::disk`-style I/O-scheduling pattern (state machine
//! driven by an atomic + condvar, bounded ring of buffers) adapted from
//! page-cache semantics to streaming a single append-only file.

pub mod block;

use crate::error::{OlrError, Result};
use block::{checksum as oracle_checksum, parse_file_header, verify_checksum, FileHeader, REDO_BAD_CDC_MAX_CNT};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of `Reader::open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenResult {
    Ok,
    Overwritten,
    Empty,
    SequenceMismatch,
    CrcError,
}

/// Terminal outcome of a read loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Finished,
    Stopped,
    Overwritten,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Sleeping,
    Check,
    Update,
    Read,
}

#[derive(Debug, Default, Clone)]
pub struct ReaderStats {
    pub blocks_read: u64,
    pub crc_retries: u64,
    pub crc_failures: u64,
}

struct RingInner {
    chunks: VecDeque<Vec<u8>>,
    capacity: usize,
    next_block: u32,
}

/// One redo log group's reader. Owns the file handle and the ring of
/// block buffers the Parser drains via `advance_to`.
pub struct Reader {
    path: PathBuf,
    block_size: usize,
    expected_sequence: u32,
    expected_resetlogs: u32,
    expected_activation: u32,
    header: Option<FileHeader>,
    state: Mutex<ReaderState>,
    state_cv: Condvar,
    ring: Mutex<RingInner>,
    ring_cv: Condvar,
    shutdown: Arc<AtomicBool>,
    stats: Mutex<ReaderStats>,
    disable_block_sum: bool,
    /// File length observed as of the last ring cycle; a shrink between
    /// cycles means the log group was reused out from under this Reader.
    last_len: Mutex<Option<u64>>,
}

impl Reader {
    pub fn new(
        path: impl AsRef<Path>,
        expected_sequence: u32,
        expected_resetlogs: u32,
        expected_activation: u32,
        ring_capacity: usize,
        shutdown: Arc<AtomicBool>,
        disable_block_sum: bool,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            block_size: block::BLOCK_SIZE_512,
            expected_sequence,
            expected_resetlogs,
            expected_activation,
            header: None,
            state: Mutex::new(ReaderState::Sleeping),
            state_cv: Condvar::new(),
            ring: Mutex::new(RingInner {
                chunks: VecDeque::with_capacity(ring_capacity),
                capacity: ring_capacity.max(1),
                next_block: 0,
            }),
            ring_cv: Condvar::new(),
            shutdown,
            stats: Mutex::new(ReaderStats::default()),
            disable_block_sum,
            last_len: Mutex::new(None),
        }
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats.lock().clone()
    }

    fn set_state(&self, next: ReaderState) {
        *self.state.lock() = next;
        self.state_cv.notify_all();
    }

    /// Validates the file header against the caller's expectations for
    /// this log group and primes the ring for streaming.
    pub fn open(&mut self) -> Result<OpenResult> {
        self.set_state(ReaderState::Check);
        let mut file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) => return Err(OlrError::Io(e)),
        };

        let current_len = file.metadata()?.len();
        if let Some(prev) = *self.last_len.lock() {
            if current_len < prev {
                warn!(path = %self.path.display(), prev_len = prev, current_len, "redo log shrank since this reader last saw it, group was overwritten");
                return Ok(OpenResult::Overwritten);
            }
        }

        let mut probe = vec![0u8; block::BLOCK_SIZE_512];
        let n = file.read(&mut probe)?;
        if n == 0 {
            return Ok(OpenResult::Empty);
        }
        let block_size = block::detect_block_size(&probe[..n])?;
        self.block_size = block_size;

        file.seek(SeekFrom::Start(0))?;
        let mut header_block = vec![0u8; block_size];
        file.read_exact(&mut header_block)?;
        let header = parse_file_header(&header_block)?;

        if header.sequence != self.expected_sequence
            || header.resetlogs != self.expected_resetlogs
            || header.activation != self.expected_activation
        {
            return Ok(OpenResult::SequenceMismatch);
        }

        *self.last_len.lock() = Some(current_len);
        self.header = Some(header);
        self.set_state(ReaderState::Sleeping);
        Ok(OpenResult::Ok)
    }

    pub fn state(&self) -> ReaderState {
        *self.state.lock()
    }

    /// Streams blocks starting at `start_block` into the ring until the
    /// ring is full, the file ends, or shutdown is requested. Returns the
    /// terminal outcome; the caller loops on `Sleeping`/backpressure.
    pub fn read_to_ring(&self, start_block: u32) -> Result<ReadOutcome> {
        self.set_state(ReaderState::Read);
        let mut file = std::fs::File::open(&self.path)?;
        file.seek(SeekFrom::Start(start_block as u64 * self.block_size as u64))?;

        loop {
            if self.shutdown.load(AtomicOrdering::Relaxed) {
                self.set_state(ReaderState::Sleeping);
                return Ok(ReadOutcome::Stopped);
            }

            let current_len = file.metadata()?.len();
            {
                let mut last_len = self.last_len.lock();
                if let Some(prev) = *last_len {
                    if current_len < prev {
                        warn!(path = %self.path.display(), prev_len = prev, current_len, "redo log shrank since last read, group was overwritten");
                        self.set_state(ReaderState::Sleeping);
                        return Ok(ReadOutcome::Overwritten);
                    }
                }
                *last_len = Some(current_len);
            }

            {
                let mut ring = self.ring.lock();
                while ring.chunks.len() >= ring.capacity {
                    self.ring_cv.wait(&mut ring);
                    if self.shutdown.load(AtomicOrdering::Relaxed) {
                        self.set_state(ReaderState::Sleeping);
                        return Ok(ReadOutcome::Stopped);
                    }
                }
            }

            let mut block = vec![0u8; self.block_size];
            match file.read_exact(&mut block) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    self.set_state(ReaderState::Sleeping);
                    return Ok(ReadOutcome::Finished);
                }
                Err(e) => return Err(OlrError::Io(e)),
            }

            if !self.disable_block_sum {
                let mut attempts = 0;
                while !verify_checksum(&block) {
                    attempts += 1;
                    {
                        let mut s = self.stats.lock();
                        s.crc_retries += 1;
                    }
                    if attempts >= REDO_BAD_CDC_MAX_CNT {
                        self.stats.lock().crc_failures += 1;
                        warn!(path = %self.path.display(), block = start_block, expected = oracle_checksum(&block), "block checksum mismatch after max retries");
                        return Ok(ReadOutcome::Error);
                    }
                    file.seek(SeekFrom::Current(-(self.block_size as i64)))?;
                    file.read_exact(&mut block)?;
                }
            }

            {
                let mut ring = self.ring.lock();
                ring.chunks.push_back(block);
                ring.next_block += 1;
            }
            self.ring_cv.notify_all();
            self.stats.lock().blocks_read += 1;
            debug!(path = %self.path.display(), "block buffered");
        }
    }

    /// Parser-side call: blocks until `block_number` is resident in the
    /// ring or a terminal condition is reached, then pops and returns it.
    pub fn advance_to(&self, block_number: u32) -> Option<Vec<u8>> {
        let mut ring = self.ring.lock();
        while ring.chunks.is_empty() {
            if self.shutdown.load(AtomicOrdering::Relaxed) {
                return None;
            }
            self.ring_cv.wait(&mut ring);
        }
        let _ = block_number;
        let block = ring.chunks.pop_front();
        self.ring_cv.notify_all();
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn header_block(sequence: u32, resetlogs: u32, activation: u32) -> Vec<u8> {
        let mut b = vec![0u8; block::BLOCK_SIZE_512];
        b[20..24].copy_from_slice(&12_200u32.to_le_bytes());
        b[24..28].copy_from_slice(&activation.to_le_bytes());
        b[28..32].copy_from_slice(&resetlogs.to_le_bytes());
        b[32..40].copy_from_slice(&1u64.to_le_bytes());
        b[48..52].copy_from_slice(&sequence.to_le_bytes());
        b
    }

    #[test]
    fn open_detects_resetlogs_mismatch() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(&header_block(1, 1, 1)).unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut reader = Reader::new(f.path(), 1, 2, 1, 4, shutdown, false);
        assert_eq!(reader.open().unwrap(), OpenResult::SequenceMismatch);
    }

    #[test]
    fn open_detects_wrong_sequence() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(&header_block(5, 1, 1)).unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut reader = Reader::new(f.path(), 6, 1, 1, 4, shutdown, false);
        assert_eq!(reader.open().unwrap(), OpenResult::SequenceMismatch);
    }

    #[test]
    fn open_empty_file_reports_empty() {
        let f = NamedTempFile::new().unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut reader = Reader::new(f.path(), 1, 1, 1, 4, shutdown, false);
        assert_eq!(reader.open().unwrap(), OpenResult::Empty);
    }

    #[test]
    fn reopen_after_shrink_reports_overwritten() {
        let mut f = NamedTempFile::new().unwrap();
        let mut block = header_block(1, 1, 1);
        block.extend(vec![0u8; block::BLOCK_SIZE_512]);
        f.write_all(&block).unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut reader = Reader::new(f.path(), 1, 1, 1, 4, shutdown, false);
        assert_eq!(reader.open().unwrap(), OpenResult::Ok);

        f.as_file().set_len(block::BLOCK_SIZE_512 as u64).unwrap();
        assert_eq!(reader.open().unwrap(), OpenResult::Overwritten);
    }

    #[test]
    fn open_matching_header_is_ok() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(&header_block(1, 1, 1)).unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut reader = Reader::new(f.path(), 1, 1, 1, 4, shutdown, false);
        assert_eq!(reader.open().unwrap(), OpenResult::Ok);
    }

    #[test]
    fn read_to_ring_detects_shrink_mid_stream() {
        let mut f = NamedTempFile::new().unwrap();
        let mut block = header_block(1, 1, 1);
        block.extend(vec![0u8; block::BLOCK_SIZE_512]);
        f.write_all(&block).unwrap();
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut reader = Reader::new(f.path(), 1, 1, 1, 4, shutdown, true);
        assert_eq!(reader.open().unwrap(), OpenResult::Ok);

        f.as_file().set_len(block::BLOCK_SIZE_512 as u64).unwrap();
        assert_eq!(reader.read_to_ring(0).unwrap(), ReadOutcome::Overwritten);
    }
}
