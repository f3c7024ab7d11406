//! Schema replica and SystemTransaction: maintains a decode-time copy of
//! Oracle's data dictionary, updated in-band by watching DML against the
//! dictionary tables themselves.
//!
//! Grounded on `original_source/src/SysObj.h`'s row shape and
//! `SystemTransaction.h`'s `processInsert/Update/Delete` + `commit(scn)`
//! protocol. Dictionary maps use `dashmap` (read-mostly, many Parser
//! readers vs. one committing writer) the way the other pack repos reach
//! for concurrent maps in a similar role.

pub mod tables;

use crate::common::{ObjId, RowId, Scn};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tables::*;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub col_num: u16,
    pub col_type: u16,
    pub length: u32,
    pub nullable: bool,
    pub charset_form: u8,
}

/// The assembled, decode-ready view of one object: its columns in
/// position order. Rebuilt whenever a SystemTransaction touches any row
/// belonging to this `obj#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaObject {
    pub obj: ObjId,
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

/// One versioned snapshot of `SchemaObject`, tagged with the commit SCN
/// of the SystemTransaction that produced it — lets decoders pick the
/// pre- or post-commit view by comparing against a DML record's SCN,
/// per the schema-atomicity property.
#[derive(Debug, Clone)]
struct Versioned {
    effective_from: Scn,
    object: Arc<SchemaObject>,
}

pub struct Schema {
    objs: DashMap<RowId, SysObj>,
    tabs: DashMap<RowId, SysTab>,
    cols: DashMap<RowId, SysCol>,
    ccols: DashMap<RowId, SysCCol>,
    cdefs: DashMap<RowId, SysCDef>,
    ecols: DashMap<RowId, SysECol>,
    deferred_stg: DashMap<RowId, SysDeferredStg>,
    tab_parts: DashMap<RowId, SysTabPart>,
    tab_com_parts: DashMap<RowId, SysTabComPart>,
    tab_sub_parts: DashMap<RowId, SysTabSubPart>,
    users: DashMap<RowId, SysUser>,
    versions: DashMap<ObjId, Vec<Versioned>>,
    commit_lock: Mutex<()>,
    current_scn: AtomicU64,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    pub fn new() -> Self {
        Self {
            objs: DashMap::new(),
            tabs: DashMap::new(),
            cols: DashMap::new(),
            ccols: DashMap::new(),
            cdefs: DashMap::new(),
            ecols: DashMap::new(),
            deferred_stg: DashMap::new(),
            tab_parts: DashMap::new(),
            tab_com_parts: DashMap::new(),
            tab_sub_parts: DashMap::new(),
            users: DashMap::new(),
            versions: DashMap::new(),
            commit_lock: Mutex::new(()),
            current_scn: AtomicU64::new(0),
        }
    }

    /// Bootstrap load from the external dictionary collaborator: seeds
    /// the base tables before any redo is processed. Does not go
    /// through `SystemTransaction` since there is no prior view to
    /// protect atomicity against.
    pub fn bootstrap_obj(&self, row: SysObj) {
        let obj = row.obj;
        self.objs.insert(row.row_id, row);
        self.rebuild_object(obj, 0);
    }

    pub fn bootstrap_col(&self, row: SysCol) {
        let obj = row.obj;
        self.cols.insert(row.row_id, row);
        self.rebuild_object(obj, 0);
    }

    fn rebuild_object(&self, obj: ObjId, effective_from: Scn) {
        let name = self
            .objs
            .iter()
            .find(|e| e.obj == obj)
            .map(|e| e.name.clone())
            .unwrap_or_default();

        let mut columns: Vec<ColumnDef> = self
            .cols
            .iter()
            .filter(|e| e.obj == obj)
            .map(|e| ColumnDef {
                name: e.name.clone(),
                col_num: e.col_num,
                col_type: e.col_type,
                length: e.length,
                nullable: e.nullable,
                charset_form: e.charset_form,
            })
            .collect();
        columns.sort_by_key(|c| c.col_num);

        let object = Arc::new(SchemaObject { obj, name, columns });
        let mut entry = self.versions.entry(obj).or_default();
        entry.push(Versioned {
            effective_from,
            object,
        });
        entry.sort_by_key(|v| v.effective_from);
    }

    /// Looks up the version of `obj` in effect at `scn`: the latest
    /// version with `effective_from <= scn`. Returns `None` if the object
    /// had no dictionary entry yet at that point in the stream.
    pub fn lookup_at(&self, obj: ObjId, scn: Scn) -> Option<Arc<SchemaObject>> {
        self.versions.get(&obj).and_then(|versions| {
            versions
                .iter()
                .rev()
                .find(|v| v.effective_from <= scn)
                .map(|v| v.object.clone())
        })
    }

    pub fn current_scn(&self) -> Scn {
        self.current_scn.load(AtomicOrdering::Acquire)
    }
}

/// One row write observed against a replicated dictionary table, staged
/// until the owning transaction commits.
#[derive(Debug, Clone)]
pub enum SysWrite {
    Obj(SysObj),
    Tab(SysTab),
    Col(SysCol),
    CCol(SysCCol),
    CDef(SysCDef),
    ECol(SysECol),
    DeferredStg(SysDeferredStg),
    TabPart(SysTabPart),
    TabComPart(SysTabComPart),
    TabSubPart(SysTabSubPart),
    User(SysUser),
}

impl SysWrite {
    fn affected_obj(&self) -> Option<ObjId> {
        match self {
            SysWrite::Obj(r) => Some(r.obj),
            SysWrite::Tab(r) => Some(r.obj),
            SysWrite::Col(r) => Some(r.obj),
            SysWrite::CCol(r) => Some(r.obj),
            SysWrite::CDef(r) => Some(r.obj),
            SysWrite::ECol(r) => Some(r.obj),
            SysWrite::DeferredStg(r) => Some(r.obj),
            SysWrite::TabPart(r) => Some(r.obj),
            SysWrite::TabComPart(r) => Some(r.obj),
            SysWrite::TabSubPart(r) => Some(r.obj),
            SysWrite::User(_) => None,
        }
    }
}

/// Accumulates writes against the dictionary tables for one transaction;
/// applied to `Schema` atomically at that transaction's commit, exactly
/// like a user transaction's DML is applied to the transaction buffer.
#[derive(Default)]
pub struct SystemTransaction {
    writes: Vec<SysWrite>,
}

impl SystemTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, write: SysWrite) {
        self.writes.push(write);
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Applies all staged writes to `schema` and rebuilds every affected
    /// object's `SchemaObject` version, all under one lock acquisition so
    /// no reader observes a partially-applied DDL transaction.
    pub fn commit(self, schema: &Schema, scn: Scn) {
        let _guard = schema.commit_lock.lock();
        let mut affected = std::collections::HashSet::new();

        for write in &self.writes {
            if let Some(obj) = write.affected_obj() {
                affected.insert(obj);
            }
            match write {
                SysWrite::Obj(r) => {
                    schema.objs.insert(r.row_id, r.clone());
                }
                SysWrite::Tab(r) => {
                    schema.tabs.insert(r.row_id, r.clone());
                }
                SysWrite::Col(r) => {
                    schema.cols.insert(r.row_id, r.clone());
                }
                SysWrite::CCol(r) => {
                    schema.ccols.insert(r.row_id, r.clone());
                }
                SysWrite::CDef(r) => {
                    schema.cdefs.insert(r.row_id, r.clone());
                }
                SysWrite::ECol(r) => {
                    schema.ecols.insert(r.row_id, r.clone());
                }
                SysWrite::DeferredStg(r) => {
                    schema.deferred_stg.insert(r.row_id, r.clone());
                }
                SysWrite::TabPart(r) => {
                    schema.tab_parts.insert(r.row_id, r.clone());
                }
                SysWrite::TabComPart(r) => {
                    schema.tab_com_parts.insert(r.row_id, r.clone());
                }
                SysWrite::TabSubPart(r) => {
                    schema.tab_sub_parts.insert(r.row_id, r.clone());
                }
                SysWrite::User(r) => {
                    schema.users.insert(r.row_id, r.clone());
                }
            }
        }

        for obj in &affected {
            schema.rebuild_object(*obj, scn);
        }
        schema.current_scn.store(scn, AtomicOrdering::Release);
        info!(scn, objects_rebuilt = affected.len(), "system transaction committed");
    }
}
