// CLASSIFICATION: COMMUNITY
// Filename: config.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Control channel configuration.
//!
//! Values come from an optional TOML file and are then overridden by
//! environment variables:
//!
//! - `TRACER_CTRL_CONFIG`: path of the TOML file
//! - `TRACER_CTRL_SOCKET`: control socket path
//! - `TRACER_CTRL_MAX_PAYLOAD`: payload ceiling in bytes

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::ctrl::dispatch::DEFAULT_MAX_PAYLOAD;
use crate::ctrl::UNIX_DOMAIN_DEF;

pub const ENV_CONFIG: &str = "TRACER_CTRL_CONFIG";
pub const ENV_SOCKET: &str = "TRACER_CTRL_SOCKET";
pub const ENV_MAX_PAYLOAD: &str = "TRACER_CTRL_MAX_PAYLOAD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CtrlConfig {
    /// Filesystem path of the control socket.
    pub socket_path: PathBuf,
    /// Largest payload accepted in either direction.
    pub max_payload: usize,
    /// Permission bits applied to the socket file.
    pub socket_mode: u32,
}

impl Default for CtrlConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(UNIX_DOMAIN_DEF),
            max_payload: DEFAULT_MAX_PAYLOAD,
            socket_mode: 0o600,
        }
    }
}

impl CtrlConfig {
    /// Parse a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: CtrlConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults or the file named by `TRACER_CTRL_CONFIG`, then env overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = match std::env::var_os(ENV_CONFIG) {
            Some(p) => Self::load(Path::new(&p))?,
            None => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Apply `TRACER_CTRL_SOCKET` and `TRACER_CTRL_MAX_PAYLOAD` if set.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(p) = std::env::var_os(ENV_SOCKET) {
            self.socket_path = PathBuf::from(p);
        }
        if let Ok(v) = std::env::var(ENV_MAX_PAYLOAD) {
            self.max_payload = v.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_MAX_PAYLOAD,
                value: v.clone(),
            })?;
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.socket_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                key: "socket_path",
                value: String::new(),
            });
        }
        if self.max_payload == 0 {
            return Err(ConfigError::Invalid {
                key: "max_payload",
                value: "0".into(),
            });
        }
        if self.socket_mode & !0o777 != 0 {
            return Err(ConfigError::Invalid {
                key: "socket_mode",
                value: format!("{:o}", self.socket_mode),
            });
        }
        Ok(())
    }
}
