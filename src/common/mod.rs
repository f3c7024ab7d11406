//! Core addressing and identity types shared across the pipeline.
//!
//! These mirror the Oracle redo-log wire concepts directly: `Scn` is the
//! database's monotonic commit clock, `Xid` identifies an in-flight
//! transaction by its undo-segment coordinates, `Uba` chains a redo
//! record back to the undo record it depends on.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Oracle System Change Number: a 64-bit logical clock advanced at commit.
pub type Scn = u64;

/// Sub-SCN: a tie-breaker within one Scn, used to order records that share
/// a commit SCN (see `(scn, subScn, block)` ordering in the Parser).
pub type SubScn = u16;

/// Data Block Address: `(file#, block#)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dba {
    pub file: u32,
    pub block: u32,
}

impl Dba {
    pub const fn new(file: u32, block: u32) -> Self {
        Self { file, block }
    }
}

impl fmt::Display for Dba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}.{:08x}", self.file, self.block)
    }
}

/// Row identifier: `(data object id, relative file, block, row slot)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId {
    pub data_obj: u32,
    pub afn: u32,
    pub block: u32,
    pub slot: u16,
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}.{:04x}.{:08x}",
            self.data_obj, self.slot, self.block
        )
    }
}

/// Transaction identifier: `(undo segment#, slot, sequence)`.
///
/// Unique among in-flight transactions; Oracle reuses `(seg, slot)` pairs
/// across time, so `sequence` disambiguates successive transactions that
/// reuse the same undo slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Xid {
    pub undo_segment: u16,
    pub slot: u16,
    pub sequence: u32,
}

impl Xid {
    pub const fn new(undo_segment: u16, slot: u16, sequence: u32) -> Self {
        Self {
            undo_segment,
            slot,
            sequence,
        }
    }
}

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:04x}.{:04x}.{:08x}",
            self.undo_segment, self.slot, self.sequence
        )
    }
}

/// Undo Block Address: links a redo record back to its predecessor undo
/// record within the same transaction's undo chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uba {
    pub dba: Dba,
    pub sequence: u16,
    pub record: u16,
}

impl fmt::Display for Uba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:04x}.{:04x}", self.dba, self.sequence, self.record)
    }
}

/// An `(scn, subScn)` pair, the commit-order sort key used throughout the
/// pipeline (LWN sort, Writer priority heap, transaction release order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitKey {
    pub scn: Scn,
    pub sub_scn: SubScn,
}

impl CommitKey {
    pub const fn new(scn: Scn, sub_scn: SubScn) -> Self {
        Self { scn, sub_scn }
    }
}

impl PartialOrd for CommitKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CommitKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scn
            .cmp(&other.scn)
            .then_with(|| self.sub_scn.cmp(&other.sub_scn))
    }
}

/// Object id in the replicated data dictionary (`SYS.OBJ$.OBJ#`).
pub type ObjId = u32;

/// Data-layer object id (`SYS.OBJ$.DATAOBJ#`), distinct from `ObjId` for
/// partitioned tables where one logical object spans many data objects.
pub type DataObjId = u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_key_orders_by_scn_then_subscn() {
        let a = CommitKey::new(100, 0);
        let b = CommitKey::new(100, 1);
        let c = CommitKey::new(101, 0);
        assert!(a < b);
        assert!(b < c);
        assert!(a < c);
    }

    #[test]
    fn xid_display_is_stable() {
        let xid = Xid::new(1, 2, 3);
        assert_eq!(format!("{xid}"), "0x0001.0002.00000003");
    }
}
