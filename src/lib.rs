//! olr-core: the redo-log analyzer pipeline.
//!
//! Five cooperating stages — [`reader`], [`parser`], [`opcode`],
//! [`txn`], [`schema`] — feed a [`txn::TransactionBuffer`] that releases
//! committed transactions in commit-SCN order to the [`output`] stage.
//! Everything process-wide that would otherwise be a global singleton
//! (the source's `oracleAnalyzer`, `outputBuffer`) is instead a value
//! owned by [`Context`] and threaded explicitly through the pipeline.

pub mod charset;
pub mod checkpoint;
pub mod common;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod opcode;
pub mod output;
pub mod parser;
pub mod reader;
pub mod schema;
pub mod sink;
pub mod state;
pub mod txn;
pub mod uint256;

use config::EngineConfig;
use dictionary::DictionaryClient;
use schema::Schema;
use sink::SinkTransport;
use state::StateStore;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use txn::MemoryBudget;

/// The explicit, threaded replacement for the source's global analyzer
/// state singletons. Process-wide state is otherwise limited to the
/// shutdown flag.
pub struct Context {
    pub config: EngineConfig,
    pub schema: Arc<Schema>,
    pub memory_budget: Arc<MemoryBudget>,
    pub dictionary: Arc<dyn DictionaryClient>,
    pub sink: Arc<dyn SinkTransport>,
    pub state: Arc<dyn StateStore>,
    pub shutdown: Arc<AtomicBool>,
}

impl Context {
    pub fn new(
        config: EngineConfig,
        dictionary: Arc<dyn DictionaryClient>,
        sink: Arc<dyn SinkTransport>,
        state: Arc<dyn StateStore>,
    ) -> error::Result<Self> {
        config.validate()?;
        let memory_budget = MemoryBudget::new(config.memory_min_mb, config.memory_max_mb);
        Ok(Self {
            config,
            schema: Arc::new(Schema::new()),
            memory_budget,
            dictionary,
            sink,
            state,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(std::sync::atomic::Ordering::SeqCst)
    }
}
