// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Sockopt control channel.
//!
//! Subsystems register [`SockoptEntry`] descriptors claiming disjoint id
//! ranges for get and set operations. The [`Dispatcher`] reads framed
//! requests from a connected stream, routes each one to the entry owning
//! its id and writes back a framed reply. [`CtrlServer`] owns the Unix
//! socket and hands accepted connections to the dispatcher; [`CtrlClient`]
//! is the operator side.

pub mod builtin;
pub mod client;
pub mod dispatch;
pub mod error;
pub mod io;
pub mod msg;
pub mod registry;
pub mod server;

pub use builtin::{CtrlInfo, SOCKOPT_GET_REGISTRY, SOCKOPT_GET_VERSION};
pub use client::CtrlClient;
pub use dispatch::Dispatcher;
pub use error::{CtrlError, CtrlResult};
pub use io::{readn, sendn};
pub use msg::{Reply, ReplyHeader, Request, RequestHeader};
pub use registry::{
    EntryInfo, OptRange, RegistryError, SockoptEntry, SockoptError, SockoptHandle, SockoptHandler,
    SockoptRegistry,
};
pub use server::{CtrlServer, CtrlServerHandle};

/// Operation identifier carried in every frame.
pub type SockoptId = u32;

pub const SOCKOPT_VERSION_MAJOR: u32 = 1;
pub const SOCKOPT_VERSION_MINOR: u32 = 0;
pub const SOCKOPT_VERSION_PATCH: u32 = 0;

/// Protocol version spoken by this build. Peers must match it exactly.
pub const SOCKOPT_VERSION: u32 = sockopt_version(
    SOCKOPT_VERSION_MAJOR,
    SOCKOPT_VERSION_MINOR,
    SOCKOPT_VERSION_PATCH,
);

/// Capacity of the reply error string, NUL terminator included.
pub const SOCKOPT_ERRSTR_LEN: usize = 64;

/// Well-known control socket path used when nothing overrides it.
pub const UNIX_DOMAIN_DEF: &str = "/var/run/metaflow_bpf_ctrl";

/// Assemble a protocol version from its components.
pub const fn sockopt_version(major: u32, minor: u32, patch: u32) -> u32 {
    (major << 16) + (minor << 8) + patch
}

/// Request direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SockoptType {
    Get,
    Set,
}

impl SockoptType {
    /// Wire value of the type.
    pub fn as_raw(self) -> u32 {
        match self {
            SockoptType::Get => 0,
            SockoptType::Set => 1,
        }
    }

    /// Decode a wire value; anything past `Set` is rejected.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(SockoptType::Get),
            1 => Some(SockoptType::Set),
            _ => None,
        }
    }
}

impl std::fmt::Display for SockoptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SockoptType::Get => f.write_str("get"),
            SockoptType::Set => f.write_str("set"),
        }
    }
}

/// Reply error codes. Failures are negated errno values.
pub mod errcode {
    pub const OK: i32 = 0;
    pub const VERSION_MISMATCH: i32 = -libc::EPROTO;
    pub const PAYLOAD_TOO_LARGE: i32 = -libc::EMSGSIZE;
    pub const UNKNOWN_OPERATION: i32 = -libc::ENOTSUP;
    pub const INVALID_ARGUMENT: i32 = -libc::EINVAL;
    pub const IO: i32 = -libc::EIO;
}
