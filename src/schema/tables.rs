//! Row shapes for the subset of Oracle's data dictionary this crate
//! replicates, keyed by `RowId`.

use crate::common::{DataObjId, ObjId, RowId};
use crate::uint256::Uint256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysObj {
    pub row_id: RowId,
    pub obj: ObjId,
    pub data_obj: Option<DataObjId>,
    pub owner: u32,
    pub name: String,
    pub obj_type: u16,
    pub flags: Uint256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysTab {
    pub row_id: RowId,
    pub obj: ObjId,
    pub data_obj: Option<DataObjId>,
    pub cluster_cols: u16,
    pub property: Uint256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysCol {
    pub row_id: RowId,
    pub obj: ObjId,
    pub col_num: u16,
    pub seg_col: u16,
    pub name: String,
    pub col_type: u16,
    pub length: u32,
    pub nullable: bool,
    pub charset_form: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysCCol {
    pub row_id: RowId,
    pub obj: ObjId,
    pub con: u32,
    pub int_col: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysCDef {
    pub row_id: RowId,
    pub obj: ObjId,
    pub con: u32,
    pub con_type: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysECol {
    pub row_id: RowId,
    pub obj: ObjId,
    pub col_num: u16,
    pub guard_id: i16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysDeferredStg {
    pub row_id: RowId,
    pub obj: ObjId,
    pub flags_stg: Uint256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysTabPart {
    pub row_id: RowId,
    pub obj: ObjId,
    pub data_obj: Option<DataObjId>,
    pub bo: ObjId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysTabComPart {
    pub row_id: RowId,
    pub obj: ObjId,
    pub data_obj: Option<DataObjId>,
    pub bo: ObjId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysTabSubPart {
    pub row_id: RowId,
    pub obj: ObjId,
    pub data_obj: Option<DataObjId>,
    pub p_obj: ObjId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysUser {
    pub row_id: RowId,
    pub user_id: u32,
    pub name: String,
    pub spare1: Uint256,
}
