//! Sink transport: the at-least-once delivery contract to a downstream
//! broker or network stream. No concrete transport ships here —
//! broker/TCP implementations are external collaborators.

use crate::error::Result;
use std::time::Duration;

pub trait SinkTransport: Send + Sync {
    /// Publishes one message. `id` is the OutputBuffer's strictly
    /// increasing enqueue sequence; the sink is expected to surface it
    /// again via `poll_confirmations` once durable downstream.
    fn send_message(&self, bytes: &[u8], id: u64) -> Result<()>;

    /// How long the Writer should sleep between polls of this sink's
    /// confirmation channel when none are pending.
    fn poll_interval(&self) -> Duration;

    /// Returns the highest enqueue id the sink has durably confirmed
    /// since the last call, or `None` if nothing new has confirmed.
    fn poll_confirmations(&self) -> Result<Option<u64>>;
}
