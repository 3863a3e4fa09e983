//! Wire-level support for the NFS version 3 protocol (RFC 1813).
//!
//! This crate contains everything a client needs to speak NFSv3 over an RPC
//! transport, without the transport itself:
//!
//! - [`xdr`]: a minimal XDR (RFC 4506) encoder/decoder for the primitive
//!   shapes NFSv3 uses (fixed-width integers, booleans, padded opaques,
//!   strings, and presence-flagged optionals).
//! - [`rpc`]: the ONC RPC call header and credential flavors carried at the
//!   head of every call message.
//! - [`wire`]: typed NFSv3 structures (file handles, attributes, directory
//!   entries, per-procedure argument and result bodies) with symmetric
//!   encode/decode so both clients and test servers can use them.
//! - [`status`]: the NFSv3 status-code table and its translation into a
//!   typed error.
//!
//! Numeric constants in this crate (procedure numbers, status codes, type
//! codes) are part of the wire contract and must never be renumbered.

pub mod rpc;
pub mod status;
pub mod wire;
pub mod xdr;

pub use status::Nfs3Status;
pub use wire::FileHandle;

/// NFSv3 RPC program number.
pub const NFS_PROGRAM: u32 = 100_003;
/// NFSv3 program version.
pub const NFS_VERSION: u32 = 3;
/// Maximum file handle size in bytes (NFS3_FHSIZE).
pub const NFS3_FHSIZE: usize = 64;

/// NFSv3 procedure numbers (RFC 1813 §3.3).
pub mod proc {
    pub const NULL: u32 = 0;
    pub const GETATTR: u32 = 1;
    pub const SETATTR: u32 = 2;
    pub const LOOKUP: u32 = 3;
    pub const ACCESS: u32 = 4;
    pub const READLINK: u32 = 5;
    pub const READ: u32 = 6;
    pub const WRITE: u32 = 7;
    pub const CREATE: u32 = 8;
    pub const MKDIR: u32 = 9;
    pub const SYMLINK: u32 = 10;
    pub const MKNOD: u32 = 11;
    pub const REMOVE: u32 = 12;
    pub const RMDIR: u32 = 13;
    pub const RENAME: u32 = 14;
    pub const LINK: u32 = 15;
    pub const READDIR: u32 = 16;
    pub const READDIRPLUS: u32 = 17;
    pub const FSSTAT: u32 = 18;
    pub const FSINFO: u32 = 19;
    pub const PATHCONF: u32 = 20;
    pub const COMMIT: u32 = 21;
}
