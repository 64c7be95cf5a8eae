// CLASSIFICATION: COMMUNITY
// Filename: builtin.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Introspection options served by the control channel itself.

use std::sync::{Arc, Weak};

use super::registry::{
    RegistryError, SockoptEntry, SockoptError, SockoptHandle, SockoptHandler, SockoptRegistry,
};
use super::{errcode, SockoptId, SOCKOPT_VERSION};

/// 4-byte native-endian protocol version.
pub const SOCKOPT_GET_VERSION: SockoptId = 0;
/// JSON listing of registered entries.
pub const SOCKOPT_GET_REGISTRY: SockoptId = 1;

const CTRL_GET_MIN: SockoptId = 0;
const CTRL_GET_MAX: SockoptId = 15;

/// Handler for the control channel's own get range.
///
/// Holds the registry weakly; the registry owns this handler.
pub struct CtrlInfo {
    registry: Weak<SockoptRegistry>,
}

impl CtrlInfo {
    /// Register the introspection entry on `registry`.
    pub fn register(registry: &Arc<SockoptRegistry>) -> Result<SockoptHandle, RegistryError> {
        let info = CtrlInfo {
            registry: Arc::downgrade(registry),
        };
        registry.register(SockoptEntry::new(Arc::new(info)).with_get(CTRL_GET_MIN, CTRL_GET_MAX))
    }
}

impl SockoptHandler for CtrlInfo {
    fn name(&self) -> &str {
        "ctrl"
    }

    fn get(&self, opt: SockoptId, _input: &[u8]) -> Result<Vec<u8>, SockoptError> {
        match opt {
            SOCKOPT_GET_VERSION => Ok(SOCKOPT_VERSION.to_ne_bytes().to_vec()),
            SOCKOPT_GET_REGISTRY => {
                let registry = self
                    .registry
                    .upgrade()
                    .ok_or_else(|| SockoptError::new(errcode::IO, "registry is gone"))?;
                let entries = registry
                    .entries()
                    .map_err(|e| SockoptError::new(errcode::IO, e.to_string()))?;
                serde_json::to_vec(&entries)
                    .map_err(|e| SockoptError::new(errcode::IO, e.to_string()))
            }
            _ => Err(SockoptError::unsupported(super::SockoptType::Get, opt)),
        }
    }
}
