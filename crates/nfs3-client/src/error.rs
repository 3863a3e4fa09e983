//! Client error taxonomy.

use crate::transport::TransportError;
use nfs3_proto::xdr::XdrError;
use nfs3_proto::Nfs3Status;
use thiserror::Error;

/// Any failure surfaced by a session operation.
///
/// No operation retries; every error is returned to the immediate caller.
/// Recursive delete is the only caller that inspects categories (via
/// [`ClientError::is_not_found`] and [`ClientError::is_not_directory`]) to
/// alter control flow.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The remote call could not be completed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// The call completed but the server reported a non-zero status.
    #[error(transparent)]
    Nfs(#[from] Nfs3Status),
    /// A reply could not be parsed into the expected structure.
    #[error("decode error: {0}")]
    Decode(#[from] XdrError),
    /// A reply parsed, but a field this client requires was flagged absent.
    #[error("reply missing {0}")]
    MissingReplyField(&'static str),
}

impl ClientError {
    /// True when the server reported that the target does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Nfs(status) if status.is_not_found())
    }

    /// True when the server reported that the target is not a directory.
    pub fn is_not_directory(&self) -> bool {
        matches!(self, ClientError::Nfs(status) if status.is_not_directory())
    }
}
