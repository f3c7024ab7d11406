//! Per-transaction arena: the one mandatory copy out of the LWN arena.
//!
//! `RedoLogRecord` borrows into the LWN's block buffers; once a record
//! must survive past that LWN (it belongs to a transaction still open
//! when the LWN is recycled) its bytes are copied into a chunked arena
//! owned by the transaction, sized in `MEMORY_CHUNK_SIZE` steps and
//! charged against the global memory budget.

use crate::common::{Dba, DataObjId, ObjId, Scn, SubScn, Uba, Xid};
use crate::parser::record::RedoLogRecord;

pub const MEMORY_CHUNK_SIZE: usize = 64 * 1024;

/// An owned copy of one decoded vector, safe to hold past LWN recycling.
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub layer: u8,
    pub subcode: u8,
    pub scn: Scn,
    pub sub_scn: SubScn,
    pub xid: Option<Xid>,
    pub obj: Option<ObjId>,
    pub data_obj: Option<DataObjId>,
    pub dba: Option<Dba>,
    pub slot: Option<u16>,
    pub uba: Option<Uba>,
    pub vector: Vec<u8>,
    pub nulls_delta: Option<usize>,
    pub col_nums_delta: Option<usize>,
}

impl StoredRecord {
    pub fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.vector.len()
    }
}

impl<'a> From<&RedoLogRecord<'a>> for StoredRecord {
    fn from(r: &RedoLogRecord<'a>) -> Self {
        StoredRecord {
            layer: r.layer,
            subcode: r.subcode,
            scn: r.scn,
            sub_scn: r.sub_scn,
            xid: r.xid,
            obj: r.obj,
            data_obj: r.data_obj,
            dba: r.dba,
            slot: r.slot,
            uba: r.uba,
            vector: r.vector.to_vec(),
            nulls_delta: r.nulls_delta,
            col_nums_delta: r.col_nums_delta,
        }
    }
}

impl StoredRecord {
    pub fn is_null(&self, column_index: usize) -> bool {
        match self.nulls_delta {
            Some(delta) if delta + column_index / 8 < self.vector.len() => {
                let byte = self.vector[delta + column_index / 8];
                (byte >> (column_index % 8)) & 1 == 1
            }
            _ => false,
        }
    }
}

/// Tracks arena growth in fixed-size chunks purely for memory accounting;
/// the actual storage is the `Vec<StoredRecord>` each `Transaction` owns.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChunkCounter {
    bytes_used: usize,
    chunks: usize,
}

impl ChunkCounter {
    pub fn account(&mut self, additional_bytes: usize) -> usize {
        self.bytes_used += additional_bytes;
        let needed_chunks = self.bytes_used.div_ceil(MEMORY_CHUNK_SIZE);
        let grew_by = needed_chunks.saturating_sub(self.chunks);
        self.chunks = needed_chunks;
        grew_by * MEMORY_CHUNK_SIZE
    }

    pub fn bytes_used(&self) -> usize {
        self.bytes_used
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_counter_rounds_up_to_chunk_boundary() {
        let mut counter = ChunkCounter::default();
        let grew = counter.account(1);
        assert_eq!(grew, MEMORY_CHUNK_SIZE);
        let grew2 = counter.account(MEMORY_CHUNK_SIZE);
        assert_eq!(grew2, MEMORY_CHUNK_SIZE);
    }
}
