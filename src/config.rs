//! Engine configuration.
//!
//! Mirrors the recognized options from the external configuration file:
//! memory bounds, buffer sizing, checkpoint cadence, dump verbosity, which
//! sanity checks to skip, and where to start reading from. Parsing the
//! surrounding config file format is out of scope (an external
//! collaborator's concern) — this module only validates the in-memory
//! struct the loader hands us.

use crate::error::{OlrError, Result};
use bitflags::bitflags;

bitflags! {
    /// Named sanity checks that can be disabled. Bit assignments are not
    /// specified upstream; these names are this implementation's choice.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DisableChecks: u32 {
        /// Skip verifying the querying user has SELECT ANY DICTIONARY / grants.
        const GRANTS = 0b001;
        /// Skip verifying supplemental logging is enabled for tracked tables.
        const SUPPLEMENTAL_LOG = 0b010;
        /// Skip verifying each redo block's checksum.
        const BLOCK_SUM = 0b100;
    }
}

impl Default for DisableChecks {
    fn default() -> Self {
        DisableChecks::empty()
    }
}

/// Verbosity of the optional redo-vector dump trace (`dumpRedoLog`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum DumpLevel {
    #[default]
    Off = 0,
    Headers = 1,
    Vectors = 2,
    Full = 3,
}

impl DumpLevel {
    pub fn from_u8(v: u8) -> Result<Self> {
        match v {
            0 => Ok(DumpLevel::Off),
            1 => Ok(DumpLevel::Headers),
            2 => Ok(DumpLevel::Vectors),
            3 => Ok(DumpLevel::Full),
            other => Err(OlrError::Configuration(format!(
                "dumpRedoLog must be 0..=3, got {other}"
            ))),
        }
    }
}

/// Where to begin reading the redo stream on startup. Exactly one variant
/// is chosen by the caller; a checkpoint read at Writer startup overrides
/// this with `Scn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPosition {
    Scn(crate::common::Scn),
    Sequence(u32),
    Time(String),
    TimeRelative(i64),
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub database: String,
    pub memory_min_mb: u64,
    pub memory_max_mb: u64,
    pub read_buffer_max: usize,
    pub checkpoint_interval_s: u64,
    pub poll_interval_us: u64,
    pub queue_size: usize,
    pub max_message_mb: u64,
    pub dump_redo_log: DumpLevel,
    pub dump_raw_data: bool,
    pub disable_checks: DisableChecks,
    pub start_position: StartPosition,
    pub character_set: String,
}

impl EngineConfig {
    /// Validates the invariants the runtime depends on. Called eagerly at
    /// construction so misconfiguration fails fast at startup rather than
    /// surfacing as a confusing runtime error mid-stream.
    pub fn validate(&self) -> Result<()> {
        if self.database.is_empty() {
            return Err(OlrError::Configuration("database name must not be empty".into()));
        }
        if self.memory_min_mb > self.memory_max_mb {
            return Err(OlrError::Configuration(format!(
                "memoryMinMb ({}) must not exceed memoryMaxMb ({})",
                self.memory_min_mb, self.memory_max_mb
            )));
        }
        if self.memory_max_mb == 0 {
            return Err(OlrError::Configuration("memoryMaxMb must be > 0".into()));
        }
        if self.read_buffer_max == 0 {
            return Err(OlrError::Configuration("readBufferMax must be > 0".into()));
        }
        if self.queue_size == 0 {
            return Err(OlrError::Configuration("queueSize must be > 0".into()));
        }
        if self.max_message_mb == 0 {
            return Err(OlrError::Configuration("maxMessageMb must be > 0".into()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database: "orcl".to_string(),
            memory_min_mb: 32,
            memory_max_mb: 1024,
            read_buffer_max: 32,
            checkpoint_interval_s: 10,
            poll_interval_us: 1_000,
            queue_size: 65_536,
            max_message_mb: 100,
            dump_redo_log: DumpLevel::Off,
            dump_raw_data: false,
            disable_checks: DisableChecks::empty(),
            start_position: StartPosition::Scn(0),
            character_set: "AL32UTF8".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_memory_bounds() {
        let mut cfg = EngineConfig::default();
        cfg.memory_min_mb = 2048;
        cfg.memory_max_mb = 1024;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn disable_checks_are_named_bits() {
        let flags = DisableChecks::GRANTS | DisableChecks::BLOCK_SUM;
        assert!(flags.contains(DisableChecks::GRANTS));
        assert!(!flags.contains(DisableChecks::SUPPLEMENTAL_LOG));
    }
}
