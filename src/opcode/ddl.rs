//! 19.1 (LWN header) and 24.x (DDL/logminer control) vectors.

use super::field_overrun;
use crate::common::{Scn, SubScn};
use crate::error::Result;
use crate::parser::record::{FieldCursor, RedoLogRecord};

/// 19.1: carries the SCN and timestamp LWN boundary; the Parser reads the
/// SCN directly off the block header rather than this vector in practice,
/// but the opcode is still dispatched so `dumpRedoLog` tracing sees it.
pub fn decode_lwn_header<'a>(
    cursor: &mut FieldCursor<'a>,
    vector: &'a [u8],
    scn: Scn,
    sub_scn: SubScn,
) -> Result<RedoLogRecord<'a>> {
    let _ = cursor.next_field_opt();
    Ok(RedoLogRecord {
        layer: 19,
        subcode: 1,
        scn,
        sub_scn,
        xid: None,
        obj: None,
        data_obj: None,
        dba: None,
        slot: None,
        uba: None,
        vector,
        nulls_delta: None,
        col_nums_delta: None,
    })
}

/// 24.x: DDL text capture. The statement text is carried as a field; the
/// SystemTransaction layer only needs to know a DDL occurred against
/// `obj`, not the text itself, so we record the object id and leave the
/// raw vector available for an eventual DDL-replay collaborator.
pub fn decode_ddl<'a>(
    cursor: &mut FieldCursor<'a>,
    vector: &'a [u8],
    scn: Scn,
    sub_scn: SubScn,
) -> Result<RedoLogRecord<'a>> {
    let obj_field = cursor.next_field().map_err(|_| field_overrun(scn, "24.x missing object id field"))?;
    let obj_bytes = cursor.field_bytes(obj_field);
    let obj = if obj_bytes.len() >= 4 {
        Some(u32::from_le_bytes(obj_bytes[0..4].try_into().unwrap()))
    } else {
        None
    };

    Ok(RedoLogRecord {
        layer: 24,
        subcode: 0,
        scn,
        sub_scn,
        xid: None,
        obj,
        data_obj: None,
        dba: None,
        slot: None,
        uba: None,
        vector,
        nulls_delta: None,
        col_nums_delta: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(bytes: &[u8]) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
        v.extend_from_slice(bytes);
        while v.len() % 4 != 0 {
            v.push(0);
        }
        v
    }

    #[test]
    fn ddl_extracts_object_id() {
        let vector = field(&[42, 0, 0, 0]);
        let mut cursor = FieldCursor::new(&vector, 0x1801);
        let record = decode_ddl(&mut cursor, &vector, 700, 0).unwrap();
        assert_eq!(record.obj, Some(42));
    }
}
