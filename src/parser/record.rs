//! `RedoLogRecord`: one decoded vector, and the field cursor opcode
//! handlers use to walk it.

use crate::common::{Dba, Scn, SubScn, Uba, Xid};

/// A typed field extracted by `FieldCursor::next_field`, tagged with a
/// debug id for tracing (mirrors the source's `0x0B0201`-style ids).
#[derive(Debug, Clone, Copy)]
pub struct FieldRef {
    pub debug_id: u32,
    pub offset: usize,
    pub len: usize,
}

/// Walks a vector's field list. Fields are length-prefixed (2-byte LE
/// length, rounded to a 4-byte boundary) runs inside the owning block
/// slice; the cursor never copies.
pub struct FieldCursor<'a> {
    data: &'a [u8],
    pos: usize,
    debug_prefix: u32,
    field_index: u32,
}

impl<'a> FieldCursor<'a> {
    pub fn new(data: &'a [u8], debug_prefix: u32) -> Self {
        Self {
            data,
            pos: 0,
            debug_prefix,
            field_index: 0,
        }
    }

    /// Consumes the next field; `None` once the vector is exhausted.
    /// Optional fields at the tail of a vector are absent, not malformed —
    /// callers distinguish via `next_field_opt`.
    pub fn next_field_opt(&mut self) -> Option<FieldRef> {
        if self.pos + 2 > self.data.len() {
            return None;
        }
        let len = u16::from_le_bytes([self.data[self.pos], self.data[self.pos + 1]]) as usize;
        let start = self.pos + 2;
        if start + len > self.data.len() {
            return None;
        }
        self.field_index += 1;
        let field = FieldRef {
            debug_id: (self.debug_prefix << 8) | (self.field_index & 0xff),
            offset: start,
            len,
        };
        let padded = (len + 3) & !3;
        self.pos = start + padded;
        Some(field)
    }

    /// Like `next_field_opt` but for fields the caller requires to be
    /// present; a missing mandatory field is structural corruption.
    pub fn next_field(&mut self) -> Result<FieldRef, crate::error::OlrError> {
        self.next_field_opt().ok_or_else(|| {
            crate::error::OlrError::runtime(
                crate::error::RuntimeErrorKind::FieldOverrun,
                crate::error::ErrorPosition::default(),
                "expected field, vector exhausted",
            )
        })
    }

    pub fn field_bytes(&self, field: FieldRef) -> &'a [u8] {
        &self.data[field.offset..field.offset + field.len]
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }
}

/// One decoded opcode vector: non-owning references into the LWN arena
/// that produced it. Must not outlive the arena.
#[derive(Debug, Clone)]
pub struct RedoLogRecord<'a> {
    pub layer: u8,
    pub subcode: u8,
    pub scn: Scn,
    pub sub_scn: SubScn,
    pub xid: Option<Xid>,
    pub obj: Option<crate::common::ObjId>,
    pub data_obj: Option<crate::common::DataObjId>,
    pub dba: Option<Dba>,
    pub slot: Option<u16>,
    /// For an undo vector (5.1), this entry's own position in the undo
    /// chain. For a DML vector (11.x), the back-pointer to the undo entry
    /// it depends on. The transaction buffer matches the two by equality.
    pub uba: Option<Uba>,
    /// Raw bytes of the vector this record was decoded from, for handlers
    /// needing to re-walk fields (e.g. the undo side of a DML pair).
    pub vector: &'a [u8],
    /// Byte offset of the null-indicator bitmap within `vector`, when the
    /// opcode has one (DML row vectors).
    pub nulls_delta: Option<usize>,
    /// Byte offset of the column-number array, for updates that touch a
    /// subset of columns.
    pub col_nums_delta: Option<usize>,
}

impl<'a> RedoLogRecord<'a> {
    pub fn opcode(&self) -> (u8, u8) {
        (self.layer, self.subcode)
    }

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

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_field(bytes: &[u8]) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
        v.extend_from_slice(bytes);
        while v.len() % 4 != 0 {
            v.push(0);
        }
        v
    }

    #[test]
    fn cursor_walks_padded_fields() {
        let mut data = encode_field(b"ab");
        data.extend(encode_field(b"cde"));
        let mut cursor = FieldCursor::new(&data, 0x0B02);
        let f1 = cursor.next_field().unwrap();
        assert_eq!(cursor.field_bytes(f1), b"ab");
        let f2 = cursor.next_field().unwrap();
        assert_eq!(cursor.field_bytes(f2), b"cde");
        assert!(cursor.next_field_opt().is_none());
    }

    #[test]
    fn missing_mandatory_field_errors() {
        let data: Vec<u8> = Vec::new();
        let mut cursor = FieldCursor::new(&data, 0);
        assert!(cursor.next_field().is_err());
    }

    #[test]
    fn null_bitmap_reports_per_column() {
        let mut vector = vec![0u8; 8];
        vector[4] = 0b0000_0010;
        let record = RedoLogRecord {
            layer: 11,
            subcode: 2,
            scn: 0,
            sub_scn: 0,
            xid: None,
            obj: None,
            data_obj: None,
            dba: None,
            slot: None,
            uba: None,
            vector: &vector,
            nulls_delta: Some(4),
            col_nums_delta: None,
        };
        assert!(record.is_null(1));
        assert!(!record.is_null(0));
    }
}
