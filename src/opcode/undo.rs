//! 5.x layer: undo vectors, transaction begin/commit/rollback markers.

use super::{field_overrun, read_uba, read_xid, OpcodeKind};
use crate::common::{Scn, SubScn};
use crate::error::Result;
use crate::parser::record::{FieldCursor, RedoLogRecord};

/// 5.1: an undo change vector. Field 0 carries the XID, field 1 this
/// entry's own UBA — its position in the undo chain, which a later DML
/// vector's UBA back-pointer matches to find its paired undo record.
pub fn decode_undo<'a>(
    cursor: &mut FieldCursor<'a>,
    vector: &'a [u8],
    scn: Scn,
    sub_scn: SubScn,
) -> Result<RedoLogRecord<'a>> {
    let xid_field = cursor.next_field().map_err(|_| field_overrun(scn, "5.1 missing xid field"))?;
    let xid = read_xid(cursor.field_bytes(xid_field));
    let uba = cursor.next_field_opt().and_then(|f| read_uba(cursor.field_bytes(f)));

    Ok(RedoLogRecord {
        layer: 5,
        subcode: 1,
        scn,
        sub_scn,
        xid,
        obj: None,
        data_obj: None,
        dba: None,
        slot: None,
        uba,
        vector,
        nulls_delta: None,
        col_nums_delta: None,
    })
}

/// 5.2: transaction begin, creates the XID the buffer will key on.
pub fn decode_begin<'a>(
    cursor: &mut FieldCursor<'a>,
    vector: &'a [u8],
    scn: Scn,
    sub_scn: SubScn,
) -> Result<RedoLogRecord<'a>> {
    let xid = cursor
        .next_field_opt()
        .map(|f| read_xid(cursor.field_bytes(f)))
        .flatten();

    Ok(RedoLogRecord {
        layer: 5,
        subcode: 2,
        scn,
        sub_scn,
        xid,
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

/// 5.4 (commit/rollback), 5.6 (partial rollback), 5.11 (rollback marker):
/// all three just seal a transaction with a terminal marker; the
/// transaction buffer distinguishes them by `subcode`.
pub fn decode_transaction_seal<'a>(
    kind: OpcodeKind,
    cursor: &mut FieldCursor<'a>,
    vector: &'a [u8],
    scn: Scn,
    sub_scn: SubScn,
) -> Result<RedoLogRecord<'a>> {
    let subcode = match kind {
        OpcodeKind::Commit => 4,
        OpcodeKind::PartialRollback => 6,
        OpcodeKind::RollbackMarker => 11,
        _ => unreachable!("decode_transaction_seal called with non-seal kind"),
    };

    let xid = cursor
        .next_field_opt()
        .map(|f| read_xid(cursor.field_bytes(f)))
        .flatten();

    Ok(RedoLogRecord {
        layer: 5,
        subcode,
        scn,
        sub_scn,
        xid,
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

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_xid_field(xid_bytes: [u8; 8]) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&8u16.to_le_bytes());
        v.extend_from_slice(&xid_bytes);
        v
    }

    #[test]
    fn undo_extracts_xid() {
        let data = encode_xid_field([1, 0, 2, 0, 3, 0, 0, 0]);
        let mut cursor = FieldCursor::new(&data, 0x0501);
        let record = decode_undo(&mut cursor, &data, 100, 0).unwrap();
        let xid = record.xid.unwrap();
        assert_eq!(xid.undo_segment, 1);
        assert_eq!(xid.slot, 2);
        assert_eq!(xid.sequence, 3);
    }

    #[test]
    fn commit_seal_uses_subcode_4() {
        let data = encode_xid_field([1, 0, 0, 0, 0, 0, 0, 0]);
        let mut cursor = FieldCursor::new(&data, 0x0504);
        let record =
            decode_transaction_seal(OpcodeKind::Commit, &mut cursor, &data, 200, 0).unwrap();
        assert_eq!(record.opcode(), (5, 4));
    }
}
