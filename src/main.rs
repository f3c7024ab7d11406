//! Minimal process entry point.
//!
//! Concrete configuration parsing, dictionary client, sink transport, and
//! process supervision are out of scope for this crate — an
//! embedder wires those and constructs `olr_core::Context` itself. This
//! binary only demonstrates that wiring compiles: it validates a default
//! configuration and exits. It is not meant to run against a real
//! database.

use olr_core::config::EngineConfig;
use tracing::info;

fn print_banner() {
    println!("olr-core — redo-log analyzer pipeline");
    println!("======================================");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    print_banner();

    let config = EngineConfig::default();
    config.validate()?;
    info!(database = %config.database, "configuration validated, no concrete collaborators wired");

    Ok(())
}
