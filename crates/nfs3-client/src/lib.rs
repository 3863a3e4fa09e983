//! Path-based NFSv3 volume client.
//!
//! A [`Session`] represents one mounted remote volume: it owns the root
//! file handle, the caller's credentials, the negotiated filesystem info,
//! and a TTL-bounded directory-entry cache. All public operations take
//! slash-separated paths; the session resolves them to file handles one
//! component at a time, consulting the cache before going to the wire.
//!
//! The session is transport-agnostic: anything implementing
//! [`RpcTransport`] (one RPC exchange per call) can carry it. It is safe
//! to share across tasks; cache access is serialized through one mutex and
//! no lock is ever held across a remote call.
//!
//! Known limitation: symbolic links are never dereferenced during path
//! resolution — they resolve as opaque leaf objects.

pub mod cache;
pub mod error;
mod ops;
mod readdir;
mod resolve;
mod session;
pub mod transport;

pub use cache::CacheStats;
pub use error::ClientError;
pub use session::Session;
pub use transport::{RpcTransport, TransportError};

// Re-export the wire types that appear in the public API.
pub use nfs3_proto::wire::{EntryPlus3, Fattr3, FileHandle, FileType, FsInfo};
pub use nfs3_proto::Nfs3Status;
