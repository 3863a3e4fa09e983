//! The remote-call seam between the session and whatever carries its RPCs.

use async_trait::async_trait;
use thiserror::Error;

/// The remote call could not be completed at all. Server-reported NFS
/// errors are not transport errors; they arrive as a status word in the
/// reply bytes.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection closed")]
    Closed,
    #[error("{0}")]
    Other(String),
}

/// One logical RPC exchange per call.
///
/// `message` is a fully XDR-encoded call body (header plus procedure
/// arguments); the returned bytes are the reply body, beginning at the NFS
/// status word. RPC framing, transaction IDs, and reply matching are the
/// implementation's concern.
///
/// Implementations must be safe for concurrent use: the session issues
/// calls from multiple tasks, one exchange at a time per operation.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, message: &[u8]) -> Result<Vec<u8>, TransportError>;
}
