// CLASSIFICATION: COMMUNITY
// Filename: msg.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Request and reply frames.
//!
//! Both frames are a fixed header followed by `len` opaque payload bytes.
//! Headers use native byte order and the same field layout the agent's C
//! structs have on this host, so the size field is a `usize` aligned to its
//! natural boundary:
//!
//! ```text
//! request: version u32 | id u32 | type u32 | pad | len usize | payload
//! reply:   version u32 | id u32 | type u32 | errcode i32 | errstr [u8; 64] | len usize | payload
//! ```

use std::io::{Read, Write};
use std::mem::{align_of, size_of};

use super::error::{CtrlError, CtrlResult};
use super::io::{readn, sendn};
use super::{errcode, SockoptId, SockoptType, SOCKOPT_ERRSTR_LEN, SOCKOPT_VERSION};

const fn align_up(n: usize, align: usize) -> usize {
    (n + align - 1) / align * align
}

const LEN_SIZE: usize = size_of::<usize>();
const REQUEST_LEN_OFFSET: usize = align_up(12, align_of::<usize>());
const REPLY_ERRSTR_OFFSET: usize = 16;
const REPLY_LEN_OFFSET: usize =
    align_up(REPLY_ERRSTR_OFFSET + SOCKOPT_ERRSTR_LEN, align_of::<usize>());

/// Encoded size of a [`RequestHeader`].
pub const REQUEST_HEADER_LEN: usize = REQUEST_LEN_OFFSET + LEN_SIZE;
/// Encoded size of a [`ReplyHeader`].
pub const REPLY_HEADER_LEN: usize = REPLY_LEN_OFFSET + LEN_SIZE;

fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_ne_bytes());
}

fn get_u32(buf: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[at..at + 4]);
    u32::from_ne_bytes(raw)
}

fn put_len(buf: &mut [u8], at: usize, v: usize) {
    buf[at..at + LEN_SIZE].copy_from_slice(&v.to_ne_bytes());
}

fn get_len(buf: &[u8], at: usize) -> usize {
    let mut raw = [0u8; LEN_SIZE];
    raw.copy_from_slice(&buf[at..at + LEN_SIZE]);
    usize::from_ne_bytes(raw)
}

/// Fixed part of a request frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub version: u32,
    pub id: SockoptId,
    /// Raw type field; see [`RequestHeader::sockopt_type`].
    pub kind: u32,
    pub len: usize,
}

impl RequestHeader {
    pub fn new(kind: SockoptType, id: SockoptId, len: usize) -> Self {
        Self {
            version: SOCKOPT_VERSION,
            id,
            kind: kind.as_raw(),
            len,
        }
    }

    /// Decoded request type, `None` for values this build does not know.
    pub fn sockopt_type(&self) -> Option<SockoptType> {
        SockoptType::from_raw(self.kind)
    }

    pub fn encode(&self) -> [u8; REQUEST_HEADER_LEN] {
        let mut buf = [0u8; REQUEST_HEADER_LEN];
        put_u32(&mut buf, 0, self.version);
        put_u32(&mut buf, 4, self.id);
        put_u32(&mut buf, 8, self.kind);
        put_len(&mut buf, REQUEST_LEN_OFFSET, self.len);
        buf
    }

    pub fn decode(buf: &[u8; REQUEST_HEADER_LEN]) -> Self {
        Self {
            version: get_u32(buf, 0),
            id: get_u32(buf, 4),
            kind: get_u32(buf, 8),
            len: get_len(buf, REQUEST_LEN_OFFSET),
        }
    }
}

/// Fixed part of a reply frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyHeader {
    pub version: u32,
    pub id: SockoptId,
    pub kind: u32,
    pub errcode: i32,
    pub errstr: [u8; SOCKOPT_ERRSTR_LEN],
    pub len: usize,
}

impl ReplyHeader {
    /// Header answering `req` with an empty error string and no payload.
    pub fn answering(req: &RequestHeader, errcode: i32) -> Self {
        Self {
            version: SOCKOPT_VERSION,
            id: req.id,
            kind: req.kind,
            errcode,
            errstr: [0u8; SOCKOPT_ERRSTR_LEN],
            len: 0,
        }
    }

    /// Store `msg`, cut to fit the buffer with a trailing NUL.
    ///
    /// Truncation never splits a UTF-8 sequence.
    pub fn set_errstr(&mut self, msg: &str) {
        let mut end = msg.len().min(SOCKOPT_ERRSTR_LEN - 1);
        while !msg.is_char_boundary(end) {
            end -= 1;
        }
        self.errstr = [0u8; SOCKOPT_ERRSTR_LEN];
        self.errstr[..end].copy_from_slice(&msg.as_bytes()[..end]);
    }

    /// Error string up to the first NUL.
    pub fn errstr(&self) -> String {
        let end = self
            .errstr
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SOCKOPT_ERRSTR_LEN);
        String::from_utf8_lossy(&self.errstr[..end]).into_owned()
    }

    pub fn sockopt_type(&self) -> Option<SockoptType> {
        SockoptType::from_raw(self.kind)
    }

    pub fn encode(&self) -> [u8; REPLY_HEADER_LEN] {
        let mut buf = [0u8; REPLY_HEADER_LEN];
        put_u32(&mut buf, 0, self.version);
        put_u32(&mut buf, 4, self.id);
        put_u32(&mut buf, 8, self.kind);
        put_u32(&mut buf, 12, self.errcode as u32);
        buf[REPLY_ERRSTR_OFFSET..REPLY_ERRSTR_OFFSET + SOCKOPT_ERRSTR_LEN]
            .copy_from_slice(&self.errstr);
        put_len(&mut buf, REPLY_LEN_OFFSET, self.len);
        buf
    }

    pub fn decode(buf: &[u8; REPLY_HEADER_LEN]) -> Self {
        let mut errstr = [0u8; SOCKOPT_ERRSTR_LEN];
        errstr.copy_from_slice(&buf[REPLY_ERRSTR_OFFSET..REPLY_ERRSTR_OFFSET + SOCKOPT_ERRSTR_LEN]);
        Self {
            version: get_u32(buf, 0),
            id: get_u32(buf, 4),
            kind: get_u32(buf, 8),
            errcode: get_u32(buf, 12) as i32,
            errstr,
            len: get_len(buf, REPLY_LEN_OFFSET),
        }
    }
}

/// A complete request frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub header: RequestHeader,
    pub payload: Vec<u8>,
}

impl Request {
    pub fn new(kind: SockoptType, id: SockoptId, payload: Vec<u8>) -> Self {
        Self {
            header: RequestHeader::new(kind, id, payload.len()),
            payload,
        }
    }

    /// Write header then payload.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> CtrlResult<()> {
        sendn(w, &self.header.encode())?;
        if !self.payload.is_empty() {
            sendn(w, &self.payload)?;
        }
        Ok(())
    }
}

/// A complete reply frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub header: ReplyHeader,
    pub payload: Vec<u8>,
}

impl Reply {
    /// Successful reply carrying `payload`.
    pub fn ok(req: &RequestHeader, payload: Vec<u8>) -> Self {
        let mut header = ReplyHeader::answering(req, errcode::OK);
        header.len = payload.len();
        Self { header, payload }
    }

    /// Failed reply; never carries a payload.
    pub fn error(req: &RequestHeader, code: i32, msg: &str) -> Self {
        let mut header = ReplyHeader::answering(req, code);
        header.set_errstr(msg);
        Self {
            header,
            payload: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.header.errcode == errcode::OK
    }

    pub fn errcode(&self) -> i32 {
        self.header.errcode
    }

    pub fn errstr(&self) -> String {
        self.header.errstr()
    }

    /// Write header then payload.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> CtrlResult<()> {
        sendn(w, &self.header.encode())?;
        if !self.payload.is_empty() {
            sendn(w, &self.payload)?;
        }
        Ok(())
    }

    /// Read one reply, refusing payloads larger than `max_payload`.
    pub fn read_from<R: Read + ?Sized>(r: &mut R, max_payload: usize) -> CtrlResult<Self> {
        let mut raw = [0u8; REPLY_HEADER_LEN];
        match readn(r, &mut raw)? {
            0 => return Err(CtrlError::Closed),
            n if n < REPLY_HEADER_LEN => {
                return Err(CtrlError::Truncated {
                    expected: REPLY_HEADER_LEN,
                    read: n,
                })
            }
            _ => {}
        }
        let header = ReplyHeader::decode(&raw);
        if header.len > max_payload {
            return Err(CtrlError::PayloadTooLarge {
                len: header.len,
                max: max_payload,
            });
        }
        let mut payload = vec![0u8; header.len];
        let n = readn(r, &mut payload)?;
        if n < header.len {
            return Err(CtrlError::Truncated {
                expected: header.len,
                read: n,
            });
        }
        Ok(Self { header, payload })
    }
}
