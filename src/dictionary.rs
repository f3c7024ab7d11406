//! Dictionary collaborator: the query interface the core uses to seed
//! and refresh its schema replica. Grounded on
//! `original_source/src/OracleAnalyzerOnline.h`'s `SQL_GET_*` method
//! list; no concrete OCI client ships here.

use crate::common::Scn;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileInfo {
    pub path: String,
    pub sequence: u32,
    pub first_scn: Scn,
    pub next_scn: Option<Scn>,
}

/// A dictionary row, returned as raw named columns — the core doesn't
/// know the wire format the concrete client used to fetch them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictRow {
    pub columns: Vec<(String, Vec<u8>)>,
}

pub trait DictionaryClient: Send + Sync {
    fn list_log_files(&self, since_scn: Scn) -> Result<Vec<LogFileInfo>>;
    fn scn_from_time(&self, unix_time: i64) -> Result<Scn>;
    fn sequence_from_scn(&self, scn: Scn) -> Result<u32>;
    fn fetch_sys_table(&self, name: &str, filter: Option<&str>) -> Result<Vec<DictRow>>;
}
