//! Checkpoint record: the durable `{database, scn, resetlogs,
//! activation}` tuple written to the state store, keyed by
//! `"<database>-chkpt"`, grounded on
//! `original_source/src/Writer.cpp::writeCheckpoint`.

use crate::common::Scn;
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub database: String,
    pub scn: Scn,
    pub resetlogs: u32,
    pub activation: u32,
}

impl CheckpointRecord {
    pub fn state_key(database: &str) -> String {
        format!("{database}-chkpt")
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let record = CheckpointRecord {
            database: "orcl".into(),
            scn: 12345,
            resetlogs: 1,
            activation: 2,
        };
        let bytes = record.to_bytes().unwrap();
        let back = CheckpointRecord::from_bytes(&bytes).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn json_has_exact_key_set() {
        let record = CheckpointRecord {
            database: "orcl".into(),
            scn: 1,
            resetlogs: 1,
            activation: 1,
        };
        let value: serde_json::Value = serde_json::from_slice(&record.to_bytes().unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<_> = obj.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["activation", "database", "resetlogs", "scn"]);
    }

    #[test]
    fn state_key_matches_convention() {
        assert_eq!(CheckpointRecord::state_key("orcl"), "orcl-chkpt");
    }
}
