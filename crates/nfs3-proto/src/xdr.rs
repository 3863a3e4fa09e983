//! Minimal XDR (RFC 4506) codec.
//!
//! NFSv3 serializes everything as big-endian 32-bit words. Variable-length
//! opaques and strings are length-prefixed and zero-padded to a four-byte
//! boundary. Optional fields are a boolean presence flag followed by the
//! payload when the flag is true; the same convention, repeated, flattens
//! the protocol's directory-entry linked list into a byte stream (see
//! RFC 4506 §4.19).

use thiserror::Error;

/// Decode failure. Any decode error is fatal to the enclosing operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XdrError {
    /// The reply ended before the expected field.
    #[error("unexpected end of XDR stream")]
    UnexpectedEof,
    /// A boolean field held something other than 0 or 1.
    #[error("invalid XDR boolean discriminant {0}")]
    InvalidBool(u32),
    /// An enumerated field held an out-of-range value.
    #[error("invalid {what} value {value}")]
    InvalidEnum { what: &'static str, value: u32 },
    /// A length-prefixed field claimed more bytes than the wire limit allows.
    #[error("{what} length {len} exceeds limit {max}")]
    Oversized {
        what: &'static str,
        len: usize,
        max: usize,
    },
    /// A string field was not valid UTF-8.
    #[error("invalid UTF-8 in XDR string")]
    InvalidUtf8,
}

/// Types that can be written to an XDR stream.
pub trait XdrEncode {
    fn encode(&self, enc: &mut XdrEncoder);
}

/// Types that can be read from an XDR stream.
pub trait XdrDecode: Sized {
    fn decode(dec: &mut XdrDecoder) -> Result<Self, XdrError>;
}

/// Append-only XDR writer backed by a byte buffer.
#[derive(Debug, Default)]
pub struct XdrEncoder {
    buf: Vec<u8>,
}

impl XdrEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_bool(&mut self, v: bool) {
        self.put_u32(u32::from(v));
    }

    /// Variable-length opaque: length prefix, payload, zero padding to a
    /// four-byte boundary.
    pub fn put_opaque(&mut self, data: &[u8]) {
        self.put_u32(data.len() as u32);
        self.buf.extend_from_slice(data);
        let pad = (4 - data.len() % 4) % 4;
        self.buf.extend_from_slice(&[0u8; 3][..pad]);
    }

    pub fn put_string(&mut self, s: &str) {
        self.put_opaque(s.as_bytes());
    }

    pub fn put_u32_array(&mut self, values: &[u32]) {
        self.put_u32(values.len() as u32);
        for v in values {
            self.put_u32(*v);
        }
    }

    /// Presence-flagged optional payload.
    pub fn put_option<T: XdrEncode>(&mut self, value: Option<&T>) {
        match value {
            Some(v) => {
                self.put_bool(true);
                v.encode(self);
            }
            None => self.put_bool(false),
        }
    }
}

/// Forward-only XDR reader over an owned reply buffer.
///
/// Decoding is incremental: the directory pager pulls one presence flag and
/// one entry at a time from the same cursor a page header was read from.
#[derive(Debug)]
pub struct XdrDecoder {
    data: Vec<u8>,
    pos: usize,
}

impl XdrDecoder {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&[u8], XdrError> {
        if self.remaining() < n {
            return Err(XdrError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn get_u32(&mut self) -> Result<u32, XdrError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().expect("4-byte slice")))
    }

    pub fn get_u64(&mut self) -> Result<u64, XdrError> {
        let bytes = self.take(8)?;
        Ok(u64::from_be_bytes(bytes.try_into().expect("8-byte slice")))
    }

    pub fn get_bool(&mut self) -> Result<bool, XdrError> {
        match self.get_u32()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(XdrError::InvalidBool(other)),
        }
    }

    /// Variable-length opaque with an upper bound on the declared length.
    pub fn get_opaque(&mut self, what: &'static str, max: usize) -> Result<Vec<u8>, XdrError> {
        let len = self.get_u32()? as usize;
        if len > max {
            return Err(XdrError::Oversized { what, len, max });
        }
        let data = self.take(len)?.to_vec();
        let pad = (4 - len % 4) % 4;
        self.take(pad)?;
        Ok(data)
    }

    pub fn get_string(&mut self, what: &'static str, max: usize) -> Result<String, XdrError> {
        let bytes = self.get_opaque(what, max)?;
        String::from_utf8(bytes).map_err(|_| XdrError::InvalidUtf8)
    }

    /// Presence-flagged optional payload.
    pub fn get_option<T: XdrDecode>(&mut self) -> Result<Option<T>, XdrError> {
        if self.get_bool()? {
            Ok(Some(T::decode(self)?))
        } else {
            Ok(None)
        }
    }
}
