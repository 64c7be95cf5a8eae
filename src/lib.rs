// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Runtime control channel for the tracer agent.
//!
//! Subsystems expose get/set socket options over a local Unix socket so an
//! operator can inspect and tune a running agent without restarting it.

/// Sockopt registry, framing, dispatcher, server and client.
pub mod ctrl;

/// Socket path and limits, from TOML and environment.
pub mod config;

pub use config::CtrlConfig;
pub use ctrl::{
    CtrlClient, CtrlError, CtrlServer, Dispatcher, SockoptEntry, SockoptError, SockoptHandler,
    SockoptRegistry, SockoptType,
};
