// CLASSIFICATION: COMMUNITY
// Filename: dispatch.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Per-connection request dispatch (`sockopt_ctl`).
//!
//! A connection carries one request/reply exchange at a time. Every request
//! that is fully read gets exactly one reply; transport failures end the
//! connection without a reply since the channel is no longer usable.

use std::io::{Read, Write};
use std::sync::Arc;

use log::{debug, warn};

use super::error::{CtrlError, CtrlResult};
use super::io::{discard, readn};
use super::msg::{Reply, RequestHeader, REQUEST_HEADER_LEN};
use super::registry::SockoptRegistry;
use super::{errcode, SockoptType, SOCKOPT_VERSION};

/// Default ceiling on request payloads.
pub const DEFAULT_MAX_PAYLOAD: usize = 1024 * 1024;

/// Oversized payloads up to this multiple of the ceiling are drained so the
/// connection stays usable. Larger claims are answered and the connection
/// is closed.
const DRAIN_FACTOR: usize = 4;

/// What the connection loop does after an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Next {
    Continue,
    /// Reply sent, but the stream can no longer be parsed.
    Close,
    /// Peer went away between requests.
    Disconnected,
}

/// Routes framed requests to registered sockopt handlers.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<SockoptRegistry>,
    max_payload: usize,
}

impl Dispatcher {
    pub fn new(registry: Arc<SockoptRegistry>) -> Self {
        Self {
            registry,
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }

    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }

    pub fn registry(&self) -> &Arc<SockoptRegistry> {
        &self.registry
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// Serve requests on `stream` until the peer leaves.
    ///
    /// Returns the number of requests answered when the peer closes between
    /// requests or the connection has to be dropped after a version
    /// mismatch. Transport failures are returned as errors.
    pub fn sockopt_ctl<S: Read + Write + ?Sized>(&self, stream: &mut S) -> CtrlResult<usize> {
        let mut served = 0;
        loop {
            match self.exchange(stream) {
                Ok(Next::Continue) => served += 1,
                Ok(Next::Close) => {
                    served += 1;
                    debug!("closing control connection after {} requests", served);
                    return Ok(served);
                }
                Ok(Next::Disconnected) => {
                    debug!("control peer disconnected after {} requests", served);
                    return Ok(served);
                }
                Err(e) => {
                    warn!("control connection dropped: {}", e);
                    return Err(e);
                }
            }
        }
    }

    fn exchange<S: Read + Write + ?Sized>(&self, stream: &mut S) -> CtrlResult<Next> {
        let mut raw = [0u8; REQUEST_HEADER_LEN];
        match readn(stream, &mut raw)? {
            0 => return Ok(Next::Disconnected),
            n if n < REQUEST_HEADER_LEN => {
                return Err(CtrlError::Truncated {
                    expected: REQUEST_HEADER_LEN,
                    read: n,
                })
            }
            _ => {}
        }
        let header = RequestHeader::decode(&raw);

        if header.version != SOCKOPT_VERSION {
            let reply = Reply::error(
                &header,
                errcode::VERSION_MISMATCH,
                &format!(
                    "version {:#x} unsupported, expected {:#x}",
                    header.version, SOCKOPT_VERSION
                ),
            );
            reply.write_to(stream)?;
            return Ok(Next::Close);
        }

        if header.len > self.max_payload {
            let reply = Reply::error(
                &header,
                errcode::PAYLOAD_TOO_LARGE,
                &format!("payload {} exceeds {}", header.len, self.max_payload),
            );
            if header.len > self.max_payload.saturating_mul(DRAIN_FACTOR) {
                warn!(
                    "{} byte payload claim exceeds drain limit, closing control connection",
                    header.len
                );
                reply.write_to(stream)?;
                return Ok(Next::Close);
            }
            let drained = discard(stream, header.len)?;
            if drained < header.len {
                return Err(CtrlError::Truncated {
                    expected: header.len,
                    read: drained,
                });
            }
            reply.write_to(stream)?;
            return Ok(Next::Continue);
        }

        let mut payload = vec![0u8; header.len];
        let n = readn(stream, &mut payload)?;
        if n < header.len {
            return Err(CtrlError::Truncated {
                expected: header.len,
                read: n,
            });
        }

        let reply = self.handle(&header, &payload);
        reply.write_to(stream)?;
        Ok(Next::Continue)
    }

    /// Resolve one request against the registry and run its handler.
    pub fn handle(&self, header: &RequestHeader, payload: &[u8]) -> Reply {
        let Some(kind) = header.sockopt_type() else {
            return Reply::error(
                header,
                errcode::INVALID_ARGUMENT,
                &format!("invalid sockopt type {}", header.kind),
            );
        };
        let handler = match self.registry.lookup(kind, header.id) {
            Ok(Some(h)) => h,
            Ok(None) => {
                debug!("{} sockopt {} has no handler", kind, header.id);
                return Reply::error(
                    header,
                    errcode::UNKNOWN_OPERATION,
                    &format!("unknown {} sockopt {}", kind, header.id),
                );
            }
            Err(e) => return Reply::error(header, errcode::IO, &e.to_string()),
        };
        let result = match kind {
            SockoptType::Get => handler.get(header.id, payload),
            SockoptType::Set => handler.set(header.id, payload).map(|()| Vec::new()),
        };
        match result {
            Ok(out) => {
                debug!(
                    "{} sockopt {} served by {} ({} bytes out)",
                    kind,
                    header.id,
                    handler.name(),
                    out.len()
                );
                Reply::ok(header, out)
            }
            Err(e) => {
                debug!("{} sockopt {} failed in {}: {}", kind, header.id, handler.name(), e);
                let code = if e.code == errcode::OK { errcode::IO } else { e.code };
                Reply::error(header, code, &e.message)
            }
        }
    }
}
