// CLASSIFICATION: COMMUNITY
// Filename: client.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Operator side of the control channel.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;

use log::debug;

use super::dispatch::DEFAULT_MAX_PAYLOAD;
use super::error::{CtrlError, CtrlResult};
use super::msg::{Reply, Request};
use super::{SockoptId, SockoptType, SOCKOPT_VERSION};

/// Issues get/set requests over a connected stream, one at a time.
pub struct CtrlClient<S = UnixStream> {
    stream: S,
    version: u32,
    max_payload: usize,
}

impl CtrlClient<UnixStream> {
    /// Connect to the control socket at `path`.
    pub fn connect(path: impl AsRef<Path>) -> CtrlResult<Self> {
        let stream = UnixStream::connect(path.as_ref())?;
        debug!("connected to control socket {}", path.as_ref().display());
        Ok(Self::new(stream))
    }
}

impl<S: Read + Write> CtrlClient<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            version: SOCKOPT_VERSION,
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }

    /// Speak `version` instead of this build's protocol version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Largest reply payload accepted.
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    /// Send one request and return the matching reply, whatever its errcode.
    pub fn request(
        &mut self,
        kind: SockoptType,
        id: SockoptId,
        payload: &[u8],
    ) -> CtrlResult<Reply> {
        let mut req = Request::new(kind, id, payload.to_vec());
        req.header.version = self.version;
        req.write_to(&mut self.stream)?;
        let reply = Reply::read_from(&mut self.stream, self.max_payload)?;
        let got_type = reply
            .header
            .sockopt_type()
            .ok_or(CtrlError::InvalidType(reply.header.kind))?;
        if reply.header.id != id || got_type != kind {
            return Err(CtrlError::ReplyMismatch {
                want_type: kind,
                want_id: id,
                got_type,
                got_id: reply.header.id,
            });
        }
        Ok(reply)
    }

    /// Fetch option `id`.
    pub fn get(&mut self, id: SockoptId, input: &[u8]) -> CtrlResult<Vec<u8>> {
        let reply = self.request(SockoptType::Get, id, input)?;
        Self::check(&reply)?;
        Ok(reply.payload)
    }

    /// Apply `input` to option `id`.
    pub fn set(&mut self, id: SockoptId, input: &[u8]) -> CtrlResult<()> {
        let reply = self.request(SockoptType::Set, id, input)?;
        Self::check(&reply)
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    fn check(reply: &Reply) -> CtrlResult<()> {
        if reply.is_ok() {
            Ok(())
        } else {
            Err(CtrlError::Remote {
                code: reply.errcode(),
                message: reply.errstr(),
            })
        }
    }
}
