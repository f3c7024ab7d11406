//! 11.x layer: row-level DML vectors (insert/update/delete and their
//! multi-row variants).
//!
//! Field layout (common across 11.x, grounded on `OpCode0B02.cpp`'s
//! `nextField` sequence): field 0 is `(obj#, dataobj#)`, field 1 is
//! `(dba, slot)`, field 2 is the null-indicator bitmap, remaining fields
//! are column data. `nulls_delta`/`col_nums_delta` record byte offsets
//! into the vector so handlers never copy column bytes.

use super::{field_overrun, read_dba, read_uba};
use crate::common::{DataObjId, ObjId, Scn, SubScn, Uba};
use crate::error::Result;
use crate::parser::record::{FieldCursor, RedoLogRecord};

struct CommonHeader {
    obj: Option<ObjId>,
    data_obj: Option<DataObjId>,
    dba: Option<crate::common::Dba>,
    slot: Option<u16>,
    uba: Option<Uba>,
    nulls_delta: Option<usize>,
}

fn parse_common_header<'a>(cursor: &mut FieldCursor<'a>, scn: Scn) -> Result<CommonHeader> {
    let obj_field = cursor.next_field().map_err(|_| field_overrun(scn, "DML missing object id field"))?;
    let obj_bytes = cursor.field_bytes(obj_field);
    let (obj, data_obj) = if obj_bytes.len() >= 8 {
        (
            Some(u32::from_le_bytes(obj_bytes[0..4].try_into().unwrap())),
            Some(u32::from_le_bytes(obj_bytes[4..8].try_into().unwrap())),
        )
    } else {
        (None, None)
    };

    let loc_field = cursor.next_field().map_err(|_| field_overrun(scn, "DML missing location field"))?;
    let loc_bytes = cursor.field_bytes(loc_field);
    let dba = read_dba(loc_bytes);
    let slot = if loc_bytes.len() >= 10 {
        Some(u16::from_le_bytes([loc_bytes[8], loc_bytes[9]]))
    } else {
        None
    };

    let uba = cursor.next_field_opt().and_then(|f| read_uba(cursor.field_bytes(f)));
    let nulls_delta = cursor.next_field_opt().map(|f| f.offset);

    Ok(CommonHeader {
        obj,
        data_obj,
        dba,
        slot,
        uba,
        nulls_delta,
    })
}

fn build_record<'a>(
    subcode: u8,
    header: CommonHeader,
    vector: &'a [u8],
    scn: Scn,
    sub_scn: SubScn,
) -> RedoLogRecord<'a> {
    RedoLogRecord {
        layer: 11,
        subcode,
        scn,
        sub_scn,
        xid: None,
        obj: header.obj,
        data_obj: header.data_obj,
        dba: header.dba,
        slot: header.slot,
        uba: header.uba,
        vector,
        nulls_delta: header.nulls_delta,
        col_nums_delta: None,
    }
}

pub fn decode_insert<'a>(cursor: &mut FieldCursor<'a>, vector: &'a [u8], scn: Scn, sub_scn: SubScn) -> Result<RedoLogRecord<'a>> {
    let header = parse_common_header(cursor, scn)?;
    Ok(build_record(2, header, vector, scn, sub_scn))
}

pub fn decode_delete<'a>(cursor: &mut FieldCursor<'a>, vector: &'a [u8], scn: Scn, sub_scn: SubScn) -> Result<RedoLogRecord<'a>> {
    let header = parse_common_header(cursor, scn)?;
    Ok(build_record(3, header, vector, scn, sub_scn))
}

pub fn decode_update<'a>(cursor: &mut FieldCursor<'a>, vector: &'a [u8], scn: Scn, sub_scn: SubScn) -> Result<RedoLogRecord<'a>> {
    let header = parse_common_header(cursor, scn)?;
    let col_nums_delta = cursor.next_field_opt().map(|f| f.offset);
    let mut record = build_record(5, header, vector, scn, sub_scn);
    record.col_nums_delta = col_nums_delta;
    Ok(record)
}

pub fn decode_row_overwrite<'a>(cursor: &mut FieldCursor<'a>, vector: &'a [u8], scn: Scn, sub_scn: SubScn) -> Result<RedoLogRecord<'a>> {
    let header = parse_common_header(cursor, scn)?;
    Ok(build_record(6, header, vector, scn, sub_scn))
}

pub fn decode_multi_insert<'a>(cursor: &mut FieldCursor<'a>, vector: &'a [u8], scn: Scn, sub_scn: SubScn) -> Result<RedoLogRecord<'a>> {
    let header = parse_common_header(cursor, scn)?;
    Ok(build_record(11, header, vector, scn, sub_scn))
}

pub fn decode_multi_delete<'a>(cursor: &mut FieldCursor<'a>, vector: &'a [u8], scn: Scn, sub_scn: SubScn) -> Result<RedoLogRecord<'a>> {
    let header = parse_common_header(cursor, scn)?;
    Ok(build_record(12, header, vector, scn, sub_scn))
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

    fn sample_vector() -> Vec<u8> {
        let mut v = Vec::new();
        v.extend(field(&[7, 0, 0, 0, 9, 0, 0, 0])); // obj=7, dataobj=9
        let mut loc = vec![1, 0, 0, 0, 2, 0, 0, 0]; // dba file=1 block=2
        loc.extend_from_slice(&5u16.to_le_bytes()); // slot=5
        v.extend(field(&loc));
        let mut uba = vec![3, 0, 0, 0, 4, 0, 0, 0]; // uba dba file=3 block=4
        uba.extend_from_slice(&1u16.to_le_bytes()); // uba sequence=1
        uba.extend_from_slice(&2u16.to_le_bytes()); // uba record=2
        v.extend(field(&uba));
        v.extend(field(&[0b0000_0001])); // nulls bitmap
        v
    }

    #[test]
    fn insert_extracts_object_and_location() {
        let vector = sample_vector();
        let mut cursor = FieldCursor::new(&vector, 0x0B02);
        let record = decode_insert(&mut cursor, &vector, 500, 0).unwrap();
        assert_eq!(record.obj, Some(7));
        assert_eq!(record.data_obj, Some(9));
        assert_eq!(record.slot, Some(5));
        assert_eq!(record.dba.unwrap().block, 2);
        assert_eq!(record.uba.unwrap().record, 2);
        assert!(record.is_null(0));
    }

    #[test]
    fn truncated_vector_is_field_overrun() {
        let vector: Vec<u8> = Vec::new();
        let mut cursor = FieldCursor::new(&vector, 0x0B02);
        assert!(decode_insert(&mut cursor, &vector, 1, 0).is_err());
    }
}
