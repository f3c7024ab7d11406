//! Error taxonomy for the analyzer pipeline.
//!
//! Collapsed to the kinds the error-handling design actually distinguishes:
//! configuration failures are fatal at startup, network errors drive a
//! reconnect loop at the Writer boundary, runtime errors are structural
//! corruption that kills the pipeline, and transient I/O / CRC errors are
//! retried locally before escalating.

use crate::common::Scn;
use thiserror::Error;

/// Specific runtime invariant that was violated. Carried alongside position
/// information so a single fatal message can report `{kind, scn, sequence,
/// block, offset}` as required by the error-handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// A record's length field extends past the end of its containing block.
    CorruptRecord,
    /// A field cursor walked past the end of its record.
    FieldOverrun,
    /// A DML vector referenced a schema object that was not resolvable.
    SchemaInconsistent,
    /// Transaction memory reached `memory_max_mb` with no progress.
    MemoryExhausted,
    /// An internal invariant (e.g. release watermark) was violated.
    UnexpectedState,
}

impl std::fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RuntimeErrorKind::CorruptRecord => "corrupt record",
            RuntimeErrorKind::FieldOverrun => "field overrun",
            RuntimeErrorKind::SchemaInconsistent => "schema inconsistent",
            RuntimeErrorKind::MemoryExhausted => "memory exhausted",
            RuntimeErrorKind::UnexpectedState => "unexpected state",
        };
        f.write_str(s)
    }
}

/// Position context attached to a fatal runtime error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorPosition {
    pub scn: Option<Scn>,
    pub sequence: Option<u32>,
    pub block: Option<u32>,
    pub offset: Option<u64>,
}

#[derive(Error, Debug)]
pub enum OlrError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("runtime error [{kind}] at scn={scn:?} seq={sequence:?} block={block:?} offset={offset:?}: {message}",
        scn = position.scn, sequence = position.sequence, block = position.block, offset = position.offset)]
    Runtime {
        kind: RuntimeErrorKind,
        position: ErrorPosition,
        message: String,
    },

    #[error("transient io error: {0}")]
    TransientIo(String),

    #[error("crc mismatch on block {block} after {attempts} attempts")]
    Crc { block: u32, attempts: u32 },

    #[error("bad data: {0}")]
    BadData(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl OlrError {
    pub fn runtime(kind: RuntimeErrorKind, position: ErrorPosition, message: impl Into<String>) -> Self {
        OlrError::Runtime {
            kind,
            position,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OlrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_carries_position() {
        let err = OlrError::runtime(
            RuntimeErrorKind::CorruptRecord,
            ErrorPosition {
                scn: Some(42),
                sequence: Some(7),
                block: Some(100),
                offset: Some(16),
            },
            "record length exceeds block",
        );
        let msg = err.to_string();
        assert!(msg.contains("corrupt record"));
        assert!(msg.contains("scn=Some(42)"));
    }
}
