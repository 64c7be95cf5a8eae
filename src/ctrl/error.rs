// CLASSIFICATION: COMMUNITY
// Filename: error.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Transport and protocol errors of the control channel.

use std::io;

use thiserror::Error;

use super::{SockoptId, SockoptType};

/// Errors raised while moving frames over a control connection.
#[derive(Debug, Error)]
pub enum CtrlError {
    #[error("control channel i/o: {0}")]
    Io(#[from] io::Error),
    /// Peer closed the stream partway through a frame.
    #[error("peer closed after {read} of {expected} bytes")]
    Truncated { expected: usize, read: usize },
    /// Peer closed the stream before a reply arrived.
    #[error("control connection closed")]
    Closed,
    #[error("payload of {len} bytes exceeds limit of {max}")]
    PayloadTooLarge { len: usize, max: usize },
    /// Reply does not answer the request that was sent.
    #[error("reply for {got_type} {got_id} does not match request {want_type} {want_id}")]
    ReplyMismatch {
        want_type: SockoptType,
        want_id: SockoptId,
        got_type: SockoptType,
        got_id: SockoptId,
    },
    #[error("invalid sockopt type {0}")]
    InvalidType(u32),
    /// Server answered with a nonzero errcode.
    #[error("sockopt failed ({code}): {message}")]
    Remote { code: i32, message: String },
}

pub type CtrlResult<T> = Result<T, CtrlError>;
