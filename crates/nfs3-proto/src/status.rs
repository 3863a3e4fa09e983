//! NFSv3 status codes and their translation into a typed error.
//!
//! Every NFSv3 reply begins with a 32-bit status word. Zero is success;
//! every other value is an error defined by RFC 1813 §2.6. The numeric
//! values below are the wire contract and must not be renumbered.

use thiserror::Error;

pub const NFS3_OK: u32 = 0;
pub const NFS3ERR_PERM: u32 = 1;
pub const NFS3ERR_NOENT: u32 = 2;
pub const NFS3ERR_IO: u32 = 5;
pub const NFS3ERR_NXIO: u32 = 6;
pub const NFS3ERR_ACCES: u32 = 13;
pub const NFS3ERR_EXIST: u32 = 17;
pub const NFS3ERR_XDEV: u32 = 18;
pub const NFS3ERR_NODEV: u32 = 19;
pub const NFS3ERR_NOTDIR: u32 = 20;
pub const NFS3ERR_ISDIR: u32 = 21;
pub const NFS3ERR_INVAL: u32 = 22;
pub const NFS3ERR_FBIG: u32 = 27;
pub const NFS3ERR_NOSPC: u32 = 28;
pub const NFS3ERR_ROFS: u32 = 30;
pub const NFS3ERR_MLINK: u32 = 31;
pub const NFS3ERR_NAMETOOLONG: u32 = 63;
pub const NFS3ERR_NOTEMPTY: u32 = 66;
pub const NFS3ERR_DQUOT: u32 = 69;
pub const NFS3ERR_STALE: u32 = 70;
pub const NFS3ERR_REMOTE: u32 = 71;
pub const NFS3ERR_BADHANDLE: u32 = 10001;
pub const NFS3ERR_NOT_SYNC: u32 = 10002;
pub const NFS3ERR_BAD_COOKIE: u32 = 10003;
pub const NFS3ERR_NOTSUPP: u32 = 10004;
pub const NFS3ERR_TOOSMALL: u32 = 10005;
pub const NFS3ERR_SERVERFAULT: u32 = 10006;
pub const NFS3ERR_BADTYPE: u32 = 10007;

/// A non-zero NFSv3 status, translated into a small error taxonomy.
///
/// Codes the client inspects to alter control flow (not-found,
/// not-a-directory) get named variants; conventional POSIX-like codes get
/// named variants for readable errors; everything else is carried verbatim
/// in [`Nfs3Status::Other`] for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Nfs3Status {
    #[error("operation not permitted")]
    Perm,
    #[error("no such file or directory")]
    NotFound,
    #[error("i/o error")]
    Io,
    #[error("permission denied")]
    AccessDenied,
    #[error("file exists")]
    AlreadyExists,
    #[error("not a directory")]
    NotDirectory,
    #[error("is a directory")]
    IsDirectory,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("directory not empty")]
    NotEmpty,
    #[error("stale file handle")]
    Stale,
    #[error("nfs error {0}")]
    Other(u32),
}

impl Nfs3Status {
    /// Translate a reply status word. Zero is success.
    pub fn from_code(code: u32) -> Result<(), Nfs3Status> {
        match code {
            NFS3_OK => Ok(()),
            NFS3ERR_PERM => Err(Nfs3Status::Perm),
            NFS3ERR_NOENT => Err(Nfs3Status::NotFound),
            NFS3ERR_IO => Err(Nfs3Status::Io),
            NFS3ERR_ACCES => Err(Nfs3Status::AccessDenied),
            NFS3ERR_EXIST => Err(Nfs3Status::AlreadyExists),
            NFS3ERR_NOTDIR => Err(Nfs3Status::NotDirectory),
            NFS3ERR_ISDIR => Err(Nfs3Status::IsDirectory),
            NFS3ERR_INVAL => Err(Nfs3Status::InvalidArgument),
            NFS3ERR_NOTEMPTY => Err(Nfs3Status::NotEmpty),
            NFS3ERR_STALE => Err(Nfs3Status::Stale),
            other => Err(Nfs3Status::Other(other)),
        }
    }

    /// The wire value this status was translated from.
    pub fn code(&self) -> u32 {
        match self {
            Nfs3Status::Perm => NFS3ERR_PERM,
            Nfs3Status::NotFound => NFS3ERR_NOENT,
            Nfs3Status::Io => NFS3ERR_IO,
            Nfs3Status::AccessDenied => NFS3ERR_ACCES,
            Nfs3Status::AlreadyExists => NFS3ERR_EXIST,
            Nfs3Status::NotDirectory => NFS3ERR_NOTDIR,
            Nfs3Status::IsDirectory => NFS3ERR_ISDIR,
            Nfs3Status::InvalidArgument => NFS3ERR_INVAL,
            Nfs3Status::NotEmpty => NFS3ERR_NOTEMPTY,
            Nfs3Status::Stale => NFS3ERR_STALE,
            Nfs3Status::Other(code) => *code,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Nfs3Status::NotFound)
    }

    pub fn is_not_directory(&self) -> bool {
        matches!(self, Nfs3Status::NotDirectory)
    }
}
