//! LWN grouping and the bounded sort-by-commit-order heap.
//!
//! An LWN (Log Write Number) is a set of physical records LGWR flushed
//! together; on disk they appear in write order, not commit order, so the
//! Parser buffers one LWN's members and sorts them by `(scn, subScn,
//! block)` before dispatch.

use crate::common::{CommitKey, Scn, SubScn};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Cap mirroring the source's `MAX_RECORDS_IN_LWN`; exceeding it during a
/// single LWN is structural corruption (a header never arrived).
pub const MAX_RECORDS_IN_LWN: usize = 1 << 20;

pub const VECTOR_MAX_LENGTH: usize = 512;

/// One reassembled logical record spanning one or more physical blocks.
#[derive(Debug, Clone)]
pub struct LwnMember {
    pub scn: Scn,
    pub sub_scn: SubScn,
    pub block: u32,
    pub offset: usize,
    pub length: usize,
    pub layer: u8,
    pub subcode: u8,
}

impl LwnMember {
    fn sort_key(&self) -> (CommitKey, u32, usize) {
        (CommitKey::new(self.scn, self.sub_scn), self.block, self.offset)
    }
}

impl PartialEq for LwnMember {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}
impl Eq for LwnMember {}

impl PartialOrd for LwnMember {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LwnMember {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Accumulates one LWN's members, then drains them in commit order.
/// Backed by a `BinaryHeap` (max-heap); members pop out smallest-first via
/// `std::cmp::Reverse` wrapping at push time would also work, but draining
/// a max-heap into a reversed vec is simpler and matches the one-shot
/// drain-then-dispatch usage pattern.
#[derive(Default)]
pub struct LwnGroup {
    members: Vec<LwnMember>,
    header_scn: Option<Scn>,
}

impl LwnGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_header_scn(&mut self, scn: Scn) {
        self.header_scn = Some(scn);
    }

    pub fn header_scn(&self) -> Option<Scn> {
        self.header_scn
    }

    pub fn push(&mut self, member: LwnMember) -> crate::error::Result<()> {
        if self.members.len() >= MAX_RECORDS_IN_LWN {
            return Err(crate::error::OlrError::runtime(
                crate::error::RuntimeErrorKind::UnexpectedState,
                crate::error::ErrorPosition {
                    scn: Some(member.scn),
                    ..Default::default()
                },
                "LWN exceeded MAX_RECORDS_IN_LWN without a header boundary",
            ));
        }
        self.members.push(member);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Drains all members sorted by `(scn, subScn, block)`, resetting the
    /// group for the next LWN.
    pub fn drain_sorted(&mut self) -> Vec<LwnMember> {
        let mut heap: BinaryHeap<std::cmp::Reverse<MemberByKey>> = self
            .members
            .drain(..)
            .map(|m| std::cmp::Reverse(MemberByKey(m)))
            .collect();
        self.header_scn = None;
        let mut out = Vec::with_capacity(heap.len());
        while let Some(std::cmp::Reverse(MemberByKey(m))) = heap.pop() {
            out.push(m);
        }
        out
    }
}

struct MemberByKey(LwnMember);
impl PartialEq for MemberByKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}
impl Eq for MemberByKey {}
impl PartialOrd for MemberByKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for MemberByKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}
