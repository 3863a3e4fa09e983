//! Typed NFSv3 wire structures (RFC 1813 §2.5–2.6, §3.3).
//!
//! Each structure implements both [`XdrEncode`] and [`XdrDecode`] so the
//! same definitions serve the client (encode arguments, decode results)
//! and in-process test servers (decode arguments, encode results).
//!
//! Result bodies here are the success arms only; the status word that
//! discriminates success from failure is read by the caller before any of
//! these decoders run.

use crate::xdr::{XdrDecode, XdrDecoder, XdrEncode, XdrEncoder, XdrError};
use crate::NFS3_FHSIZE;
use std::fmt;

/// Longest filename we accept when decoding.
const MAX_NAME_LEN: usize = 255;

/// An opaque server-assigned identifier for a filesystem object.
///
/// Handles have value semantics: two handles are the same object exactly
/// when their bytes are equal, which makes them directly usable as map
/// keys. No other structure is assumed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FileHandle(Vec<u8>);

impl FileHandle {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileHandle(0x")?;
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

impl XdrEncode for FileHandle {
    fn encode(&self, enc: &mut XdrEncoder) {
        enc.put_opaque(&self.0);
    }
}

impl XdrDecode for FileHandle {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self(dec.get_opaque("file handle", NFS3_FHSIZE)?))
    }
}

/// ftype3: the kind of object a file handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Regular,
    Directory,
    BlockDevice,
    CharDevice,
    Symlink,
    Socket,
    Fifo,
}

impl FileType {
    pub fn from_wire(value: u32) -> Option<Self> {
        match value {
            1 => Some(FileType::Regular),
            2 => Some(FileType::Directory),
            3 => Some(FileType::BlockDevice),
            4 => Some(FileType::CharDevice),
            5 => Some(FileType::Symlink),
            6 => Some(FileType::Socket),
            7 => Some(FileType::Fifo),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u32 {
        match self {
            FileType::Regular => 1,
            FileType::Directory => 2,
            FileType::BlockDevice => 3,
            FileType::CharDevice => 4,
            FileType::Symlink => 5,
            FileType::Socket => 6,
            FileType::Fifo => 7,
        }
    }

    pub fn is_directory(self) -> bool {
        self == FileType::Directory
    }
}

impl XdrEncode for FileType {
    fn encode(&self, enc: &mut XdrEncoder) {
        enc.put_u32(self.to_wire());
    }
}

impl XdrDecode for FileType {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        let value = dec.get_u32()?;
        FileType::from_wire(value).ok_or(XdrError::InvalidEnum {
            what: "file type",
            value,
        })
    }
}

/// nfstime3: seconds and nanoseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Nfs3Time {
    pub seconds: u32,
    pub nseconds: u32,
}

impl XdrEncode for Nfs3Time {
    fn encode(&self, enc: &mut XdrEncoder) {
        enc.put_u32(self.seconds);
        enc.put_u32(self.nseconds);
    }
}

impl XdrDecode for Nfs3Time {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            seconds: dec.get_u32()?,
            nseconds: dec.get_u32()?,
        })
    }
}

/// fattr3: full attributes of a filesystem object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fattr3 {
    pub ftype: FileType,
    pub mode: u32,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub used: u64,
    pub rdev_major: u32,
    pub rdev_minor: u32,
    pub fsid: u64,
    pub fileid: u64,
    pub atime: Nfs3Time,
    pub mtime: Nfs3Time,
    pub ctime: Nfs3Time,
}

impl Fattr3 {
    pub fn is_directory(&self) -> bool {
        self.ftype.is_directory()
    }
}

impl XdrEncode for Fattr3 {
    fn encode(&self, enc: &mut XdrEncoder) {
        self.ftype.encode(enc);
        enc.put_u32(self.mode);
        enc.put_u32(self.nlink);
        enc.put_u32(self.uid);
        enc.put_u32(self.gid);
        enc.put_u64(self.size);
        enc.put_u64(self.used);
        enc.put_u32(self.rdev_major);
        enc.put_u32(self.rdev_minor);
        enc.put_u64(self.fsid);
        enc.put_u64(self.fileid);
        self.atime.encode(enc);
        self.mtime.encode(enc);
        self.ctime.encode(enc);
    }
}

impl XdrDecode for Fattr3 {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            ftype: FileType::decode(dec)?,
            mode: dec.get_u32()?,
            nlink: dec.get_u32()?,
            uid: dec.get_u32()?,
            gid: dec.get_u32()?,
            size: dec.get_u64()?,
            used: dec.get_u64()?,
            rdev_major: dec.get_u32()?,
            rdev_minor: dec.get_u32()?,
            fsid: dec.get_u64()?,
            fileid: dec.get_u64()?,
            atime: Nfs3Time::decode(dec)?,
            mtime: Nfs3Time::decode(dec)?,
            ctime: Nfs3Time::decode(dec)?,
        })
    }
}

/// wcc_attr: the attribute subset servers report for pre-operation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WccAttr {
    pub size: u64,
    pub mtime: Nfs3Time,
    pub ctime: Nfs3Time,
}

impl XdrEncode for WccAttr {
    fn encode(&self, enc: &mut XdrEncoder) {
        enc.put_u64(self.size);
        self.mtime.encode(enc);
        self.ctime.encode(enc);
    }
}

impl XdrDecode for WccAttr {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            size: dec.get_u64()?,
            mtime: Nfs3Time::decode(dec)?,
            ctime: Nfs3Time::decode(dec)?,
        })
    }
}

/// wcc_data: best-effort before/after attributes around a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WccData {
    pub before: Option<WccAttr>,
    pub after: Option<Fattr3>,
}

impl XdrEncode for WccData {
    fn encode(&self, enc: &mut XdrEncoder) {
        enc.put_option(self.before.as_ref());
        enc.put_option(self.after.as_ref());
    }
}

impl XdrDecode for WccData {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            before: dec.get_option()?,
            after: dec.get_option()?,
        })
    }
}

/// sattr3: attributes to apply at create time.
///
/// Only the permission-mode setter is ever populated; all other setters
/// are encoded as absent, matching what this client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sattr3 {
    pub mode: Option<u32>,
}

impl Sattr3 {
    pub fn with_mode(mode: u32) -> Self {
        Self { mode: Some(mode) }
    }
}

/// time_how discriminant for the atime/mtime setters: don't change.
const TIME_DONT_CHANGE: u32 = 0;

impl XdrEncode for Sattr3 {
    fn encode(&self, enc: &mut XdrEncoder) {
        match self.mode {
            Some(mode) => {
                enc.put_bool(true);
                enc.put_u32(mode);
            }
            None => enc.put_bool(false),
        }
        enc.put_bool(false); // uid
        enc.put_bool(false); // gid
        enc.put_bool(false); // size
        enc.put_u32(TIME_DONT_CHANGE); // atime
        enc.put_u32(TIME_DONT_CHANGE); // mtime
    }
}

impl XdrDecode for Sattr3 {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        let mode = if dec.get_bool()? {
            Some(dec.get_u32()?)
        } else {
            None
        };
        for setter in ["uid", "gid", "size"] {
            if dec.get_bool()? {
                // This client never sets them, and the test servers that
                // decode our requests don't model them.
                return Err(XdrError::InvalidEnum {
                    what: setter,
                    value: 1,
                });
            }
        }
        for time_setter in ["atime", "mtime"] {
            let how = dec.get_u32()?;
            if how != TIME_DONT_CHANGE {
                return Err(XdrError::InvalidEnum {
                    what: time_setter,
                    value: how,
                });
            }
        }
        Ok(Self { mode })
    }
}

/// diropargs3: a directory handle plus a name within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirOpArgs3 {
    pub dir: FileHandle,
    pub name: String,
}

impl XdrEncode for DirOpArgs3 {
    fn encode(&self, enc: &mut XdrEncoder) {
        self.dir.encode(enc);
        enc.put_string(&self.name);
    }
}

impl XdrDecode for DirOpArgs3 {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            dir: FileHandle::decode(dec)?,
            name: dec.get_string("filename", MAX_NAME_LEN)?,
        })
    }
}

/// One READDIRPLUS entry: name, pagination cookie, and best-effort
/// attributes and handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPlus3 {
    pub fileid: u64,
    pub name: String,
    pub cookie: u64,
    pub attr: Option<Fattr3>,
    pub handle: Option<FileHandle>,
}

impl EntryPlus3 {
    pub fn is_directory(&self) -> bool {
        self.attr.as_ref().is_some_and(Fattr3::is_directory)
    }
}

impl XdrEncode for EntryPlus3 {
    fn encode(&self, enc: &mut XdrEncoder) {
        enc.put_u64(self.fileid);
        enc.put_string(&self.name);
        enc.put_u64(self.cookie);
        enc.put_option(self.attr.as_ref());
        enc.put_option(self.handle.as_ref());
    }
}

impl XdrDecode for EntryPlus3 {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            fileid: dec.get_u64()?,
            name: dec.get_string("entry name", MAX_NAME_LEN)?,
            cookie: dec.get_u64()?,
            attr: dec.get_option()?,
            handle: dec.get_option()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Per-procedure argument and result bodies
// ---------------------------------------------------------------------------

/// FSINFO arguments: the root handle to query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsInfoArgs {
    pub root: FileHandle,
}

impl XdrEncode for FsInfoArgs {
    fn encode(&self, enc: &mut XdrEncoder) {
        self.root.encode(enc);
    }
}

impl XdrDecode for FsInfoArgs {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            root: FileHandle::decode(dec)?,
        })
    }
}

/// FSINFO result: static capabilities of the remote filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FsInfo {
    pub attr: Option<Fattr3>,
    pub rtmax: u32,
    pub rtpref: u32,
    pub rtmult: u32,
    pub wtmax: u32,
    pub wtpref: u32,
    pub wtmult: u32,
    pub dtpref: u32,
    pub max_file_size: u64,
    pub time_delta: Nfs3Time,
    pub properties: u32,
}

impl XdrEncode for FsInfo {
    fn encode(&self, enc: &mut XdrEncoder) {
        enc.put_option(self.attr.as_ref());
        enc.put_u32(self.rtmax);
        enc.put_u32(self.rtpref);
        enc.put_u32(self.rtmult);
        enc.put_u32(self.wtmax);
        enc.put_u32(self.wtpref);
        enc.put_u32(self.wtmult);
        enc.put_u32(self.dtpref);
        enc.put_u64(self.max_file_size);
        self.time_delta.encode(enc);
        enc.put_u32(self.properties);
    }
}

impl XdrDecode for FsInfo {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            attr: dec.get_option()?,
            rtmax: dec.get_u32()?,
            rtpref: dec.get_u32()?,
            rtmult: dec.get_u32()?,
            wtmax: dec.get_u32()?,
            wtpref: dec.get_u32()?,
            wtmult: dec.get_u32()?,
            dtpref: dec.get_u32()?,
            max_file_size: dec.get_u64()?,
            time_delta: Nfs3Time::decode(dec)?,
            properties: dec.get_u32()?,
        })
    }
}

/// LOOKUP arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupArgs {
    pub what: DirOpArgs3,
}

impl XdrEncode for LookupArgs {
    fn encode(&self, enc: &mut XdrEncoder) {
        self.what.encode(enc);
    }
}

impl XdrDecode for LookupArgs {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            what: DirOpArgs3::decode(dec)?,
        })
    }
}

/// LOOKUP success result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOk {
    pub handle: FileHandle,
    pub attr: Option<Fattr3>,
    pub dir_attr: Option<Fattr3>,
}

impl XdrEncode for LookupOk {
    fn encode(&self, enc: &mut XdrEncoder) {
        self.handle.encode(enc);
        enc.put_option(self.attr.as_ref());
        enc.put_option(self.dir_attr.as_ref());
    }
}

impl XdrDecode for LookupOk {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            handle: FileHandle::decode(dec)?,
            attr: dec.get_option()?,
            dir_attr: dec.get_option()?,
        })
    }
}

/// READDIRPLUS arguments: cursor plus response size budgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadDirPlusArgs {
    pub dir: FileHandle,
    pub cookie: u64,
    pub cookie_verifier: u64,
    pub dircount: u32,
    pub maxcount: u32,
}

impl XdrEncode for ReadDirPlusArgs {
    fn encode(&self, enc: &mut XdrEncoder) {
        self.dir.encode(enc);
        enc.put_u64(self.cookie);
        enc.put_u64(self.cookie_verifier);
        enc.put_u32(self.dircount);
        enc.put_u32(self.maxcount);
    }
}

impl XdrDecode for ReadDirPlusArgs {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            dir: FileHandle::decode(dec)?,
            cookie: dec.get_u64()?,
            cookie_verifier: dec.get_u64()?,
            dircount: dec.get_u32()?,
            maxcount: dec.get_u32()?,
        })
    }
}

/// READDIRPLUS page header: directory attributes and the verifier the next
/// page request must echo.
///
/// The entry run that follows it on the wire is a flattened linked list —
/// a presence flag announcing each next entry, terminated by a false flag,
/// then a trailing end-of-listing flag for the page. Callers decode that
/// run incrementally from the same cursor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadDirPlusPage {
    pub dir_attr: Option<Fattr3>,
    pub cookie_verifier: u64,
}

impl XdrEncode for ReadDirPlusPage {
    fn encode(&self, enc: &mut XdrEncoder) {
        enc.put_option(self.dir_attr.as_ref());
        enc.put_u64(self.cookie_verifier);
    }
}

impl XdrDecode for ReadDirPlusPage {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            dir_attr: dec.get_option()?,
            cookie_verifier: dec.get_u64()?,
        })
    }
}

/// createmode3 plus its attributes. EXCLUSIVE creates carry a verifier
/// instead of attributes and are not issued by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateHow {
    Unchecked(Sattr3),
    Guarded(Sattr3),
}

impl XdrEncode for CreateHow {
    fn encode(&self, enc: &mut XdrEncoder) {
        match self {
            CreateHow::Unchecked(attrs) => {
                enc.put_u32(0);
                attrs.encode(enc);
            }
            CreateHow::Guarded(attrs) => {
                enc.put_u32(1);
                attrs.encode(enc);
            }
        }
    }
}

impl XdrDecode for CreateHow {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        match dec.get_u32()? {
            0 => Ok(CreateHow::Unchecked(Sattr3::decode(dec)?)),
            1 => Ok(CreateHow::Guarded(Sattr3::decode(dec)?)),
            value => Err(XdrError::InvalidEnum {
                what: "create mode",
                value,
            }),
        }
    }
}

/// CREATE arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateArgs {
    pub where_: DirOpArgs3,
    pub how: CreateHow,
}

impl XdrEncode for CreateArgs {
    fn encode(&self, enc: &mut XdrEncoder) {
        self.where_.encode(enc);
        self.how.encode(enc);
    }
}

impl XdrDecode for CreateArgs {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            where_: DirOpArgs3::decode(dec)?,
            how: CreateHow::decode(dec)?,
        })
    }
}

/// MKDIR arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MkdirArgs {
    pub where_: DirOpArgs3,
    pub attrs: Sattr3,
}

impl XdrEncode for MkdirArgs {
    fn encode(&self, enc: &mut XdrEncoder) {
        self.where_.encode(enc);
        self.attrs.encode(enc);
    }
}

impl XdrDecode for MkdirArgs {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            where_: DirOpArgs3::decode(dec)?,
            attrs: Sattr3::decode(dec)?,
        })
    }
}

/// Shared success result of CREATE and MKDIR: the new object's handle and
/// attributes (both best-effort) plus parent-directory change data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewObjectOk {
    pub handle: Option<FileHandle>,
    pub attr: Option<Fattr3>,
    pub dir_wcc: WccData,
}

impl XdrEncode for NewObjectOk {
    fn encode(&self, enc: &mut XdrEncoder) {
        enc.put_option(self.handle.as_ref());
        enc.put_option(self.attr.as_ref());
        self.dir_wcc.encode(enc);
    }
}

impl XdrDecode for NewObjectOk {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            handle: dec.get_option()?,
            attr: dec.get_option()?,
            dir_wcc: WccData::decode(dec)?,
        })
    }
}
