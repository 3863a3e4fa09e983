//! ONC RPC call header and credential flavors.
//!
//! The transport owns RPC framing, transaction IDs, and reply matching.
//! What the client encodes — and what appears at the head of every call
//! message handed to the transport — is the body of an RPC call: RPC
//! version, program, program version, procedure, credentials, and verifier
//! (RFC 5531 §9).

use crate::xdr::{XdrDecode, XdrDecoder, XdrEncode, XdrEncoder, XdrError};
use crate::{NFS_PROGRAM, NFS_VERSION};

/// RPC protocol version carried in every call.
pub const RPC_VERSION: u32 = 2;

const AUTH_NONE: u32 = 0;
const AUTH_UNIX: u32 = 1;

/// Largest credential body we accept when decoding (RFC 5531 limit).
const MAX_AUTH_BODY: usize = 400;

/// AUTH_UNIX credential body: the caller's claimed identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUnix {
    pub stamp: u32,
    pub machine_name: String,
    pub uid: u32,
    pub gid: u32,
    pub aux_gids: Vec<u32>,
}

impl AuthUnix {
    pub fn new(machine_name: impl Into<String>, uid: u32, gid: u32) -> Self {
        Self {
            stamp: 0,
            machine_name: machine_name.into(),
            uid,
            gid,
            aux_gids: Vec::new(),
        }
    }
}

/// RPC authentication flavor attached to a call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Auth {
    /// AUTH_NONE: no identity claimed. Also used as the verifier on every
    /// call.
    #[default]
    Null,
    /// AUTH_UNIX: uid/gid identity, honored by most NFSv3 servers.
    Unix(AuthUnix),
}

impl XdrEncode for Auth {
    fn encode(&self, enc: &mut XdrEncoder) {
        match self {
            Auth::Null => {
                enc.put_u32(AUTH_NONE);
                enc.put_opaque(&[]);
            }
            Auth::Unix(unix) => {
                let mut body = XdrEncoder::new();
                body.put_u32(unix.stamp);
                body.put_string(&unix.machine_name);
                body.put_u32(unix.uid);
                body.put_u32(unix.gid);
                body.put_u32_array(&unix.aux_gids);
                enc.put_u32(AUTH_UNIX);
                enc.put_opaque(&body.into_bytes());
            }
        }
    }
}

impl XdrDecode for Auth {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        let flavor = dec.get_u32()?;
        let body = dec.get_opaque("auth body", MAX_AUTH_BODY)?;
        match flavor {
            AUTH_NONE => Ok(Auth::Null),
            AUTH_UNIX => {
                let mut body = XdrDecoder::new(body);
                Ok(Auth::Unix(AuthUnix {
                    stamp: body.get_u32()?,
                    machine_name: body.get_string("machine name", 255)?,
                    uid: body.get_u32()?,
                    gid: body.get_u32()?,
                    aux_gids: {
                        let n = body.get_u32()? as usize;
                        let mut gids = Vec::with_capacity(n.min(16));
                        for _ in 0..n {
                            gids.push(body.get_u32()?);
                        }
                        gids
                    },
                }))
            }
            value => Err(XdrError::InvalidEnum {
                what: "auth flavor",
                value,
            }),
        }
    }
}

/// Fixed call header preceding every procedure's argument body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallHeader {
    pub rpc_version: u32,
    pub program: u32,
    pub version: u32,
    pub procedure: u32,
    pub credentials: Auth,
    pub verifier: Auth,
}

impl CallHeader {
    /// Header for an NFSv3 call with the given credentials and an
    /// AUTH_NONE verifier.
    pub fn nfs3(procedure: u32, credentials: Auth) -> Self {
        Self {
            rpc_version: RPC_VERSION,
            program: NFS_PROGRAM,
            version: NFS_VERSION,
            procedure,
            credentials,
            verifier: Auth::Null,
        }
    }
}

impl XdrEncode for CallHeader {
    fn encode(&self, enc: &mut XdrEncoder) {
        enc.put_u32(self.rpc_version);
        enc.put_u32(self.program);
        enc.put_u32(self.version);
        enc.put_u32(self.procedure);
        self.credentials.encode(enc);
        self.verifier.encode(enc);
    }
}

impl XdrDecode for CallHeader {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError> {
        Ok(Self {
            rpc_version: dec.get_u32()?,
            program: dec.get_u32()?,
            version: dec.get_u32()?,
            procedure: dec.get_u32()?,
            credentials: Auth::decode(dec)?,
            verifier: Auth::decode(dec)?,
        })
    }
}
