// CLASSIFICATION: COMMUNITY
// Filename: registry.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Sockopt registry.
//!
//! Each subsystem that wants control-plane exposure registers one
//! [`SockoptEntry`]: an inclusive id range for get requests, another for
//! set requests, and the handler serving both. Ranges of the same type never
//! overlap across entries, so a `(type, id)` pair resolves to at most one
//! handler.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{errcode, SockoptId, SockoptType, SOCKOPT_VERSION};

/// Failure reported by a handler, surfaced to the client as errcode/errstr.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({code})")]
pub struct SockoptError {
    pub code: i32,
    pub message: String,
}

impl SockoptError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(errcode::INVALID_ARGUMENT, message)
    }

    pub fn unsupported(kind: SockoptType, opt: SockoptId) -> Self {
        Self::new(
            errcode::UNKNOWN_OPERATION,
            format!("{} sockopt {} not supported", kind, opt),
        )
    }
}

/// Callbacks a subsystem exposes through the control channel.
///
/// Handlers run outside the registry lock and should return promptly; a
/// slow handler stalls only the connection that called it.
pub trait SockoptHandler: Send + Sync {
    /// Name used in logs and conflict reports.
    fn name(&self) -> &str {
        "anonymous"
    }

    /// Apply `input` to option `opt`.
    fn set(&self, opt: SockoptId, input: &[u8]) -> Result<(), SockoptError> {
        let _ = input;
        Err(SockoptError::unsupported(SockoptType::Set, opt))
    }

    /// Produce the value of option `opt`. The returned buffer is handed to
    /// the dispatcher, which drops it once the reply has been written.
    fn get(&self, opt: SockoptId, input: &[u8]) -> Result<Vec<u8>, SockoptError> {
        let _ = input;
        Err(SockoptError::unsupported(SockoptType::Get, opt))
    }
}

/// Inclusive id range. `min > max` is the empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptRange {
    pub min: SockoptId,
    pub max: SockoptId,
}

impl OptRange {
    pub const EMPTY: OptRange = OptRange { min: 1, max: 0 };

    pub fn new(min: SockoptId, max: SockoptId) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn contains(&self, id: SockoptId) -> bool {
        self.min <= id && id <= self.max
    }

    pub fn overlaps(&self, other: &OptRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.min <= other.max && other.min <= self.max
    }

    fn bounds(&self) -> Option<[SockoptId; 2]> {
        (!self.is_empty()).then_some([self.min, self.max])
    }
}

impl fmt::Display for OptRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("[]")
        } else {
            write!(f, "[{}, {}]", self.min, self.max)
        }
    }
}

/// A subsystem's claim on the control channel.
#[derive(Clone)]
pub struct SockoptEntry {
    pub version: u32,
    pub set_range: OptRange,
    pub get_range: OptRange,
    handler: Arc<dyn SockoptHandler>,
}

impl SockoptEntry {
    /// Entry for `handler` with no ranges, built against this protocol version.
    pub fn new(handler: Arc<dyn SockoptHandler>) -> Self {
        Self {
            version: SOCKOPT_VERSION,
            set_range: OptRange::EMPTY,
            get_range: OptRange::EMPTY,
            handler,
        }
    }

    pub fn with_get(mut self, min: SockoptId, max: SockoptId) -> Self {
        self.get_range = OptRange::new(min, max);
        self
    }

    pub fn with_set(mut self, min: SockoptId, max: SockoptId) -> Self {
        self.set_range = OptRange::new(min, max);
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn name(&self) -> &str {
        self.handler.name()
    }

    pub fn handler(&self) -> &Arc<dyn SockoptHandler> {
        &self.handler
    }

    pub fn range(&self, kind: SockoptType) -> OptRange {
        match kind {
            SockoptType::Get => self.get_range,
            SockoptType::Set => self.set_range,
        }
    }
}

impl fmt::Debug for SockoptEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SockoptEntry")
            .field("name", &self.name())
            .field("version", &self.version)
            .field("set_range", &self.set_range)
            .field("get_range", &self.get_range)
            .finish()
    }
}

/// Handle returned by [`SockoptRegistry::register`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SockoptHandle(u64);

impl SockoptHandle {
    pub fn into_raw(self) -> u64 {
        self.0
    }
}

/// Errors returned by [`SockoptRegistry`] operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("sockopt version {found:#x} does not match {expected:#x}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("{kind} range {range} of {name} overlaps {existing} owned by {owner}")]
    RangeConflict {
        kind: SockoptType,
        name: String,
        range: OptRange,
        owner: String,
        existing: OptRange,
    },
    #[error("sockopt registry lock poisoned")]
    LockPoisoned,
}

type RegistryResult<T> = Result<T, RegistryError>;

/// Snapshot of one registered entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub handle: SockoptHandle,
    pub name: String,
    pub get: Option<[SockoptId; 2]>,
    pub set: Option<[SockoptId; 2]>,
}

struct Registered {
    handle: SockoptHandle,
    entry: SockoptEntry,
}

/// Process-wide table of sockopt entries.
///
/// Lookups share a read lock; register and unregister take it exclusively.
pub struct SockoptRegistry {
    entries: RwLock<Vec<Registered>>,
    next_handle: AtomicU64,
}

impl Default for SockoptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SockoptRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Add `entry`, refusing version mismatches and overlapping ranges.
    pub fn register(&self, entry: SockoptEntry) -> RegistryResult<SockoptHandle> {
        if entry.version != SOCKOPT_VERSION {
            warn!(
                "sockopt {} rejected: version {:#x}, expected {:#x}",
                entry.name(),
                entry.version,
                SOCKOPT_VERSION
            );
            return Err(RegistryError::VersionMismatch {
                expected: SOCKOPT_VERSION,
                found: entry.version,
            });
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;
        for kind in [SockoptType::Set, SockoptType::Get] {
            let range = entry.range(kind);
            if let Some(clash) = entries
                .iter()
                .find(|r| r.entry.range(kind).overlaps(&range))
            {
                let err = RegistryError::RangeConflict {
                    kind,
                    name: entry.name().to_string(),
                    range,
                    owner: clash.entry.name().to_string(),
                    existing: clash.entry.range(kind),
                };
                warn!("sockopt registration refused: {}", err);
                return Err(err);
            }
        }
        let handle = SockoptHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        info!(
            "sockopt {} registered: get {} set {}",
            entry.name(),
            entry.get_range,
            entry.set_range
        );
        entries.push(Registered { handle, entry });
        Ok(handle)
    }

    /// Remove the entry behind `handle`. Returns whether anything was removed;
    /// an unknown handle is not an error.
    pub fn unregister(&self, handle: SockoptHandle) -> RegistryResult<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| RegistryError::LockPoisoned)?;
        match entries.iter().position(|r| r.handle == handle) {
            Some(idx) => {
                let gone = entries.remove(idx);
                info!("sockopt {} unregistered", gone.entry.name());
                Ok(true)
            }
            None => {
                debug!("sockopt handle {:?} already unregistered", handle);
                Ok(false)
            }
        }
    }

    /// Handler owning `id` for `kind`, if any.
    ///
    /// The handler is cloned out so the caller runs it without the lock.
    pub fn lookup(
        &self,
        kind: SockoptType,
        id: SockoptId,
    ) -> RegistryResult<Option<Arc<dyn SockoptHandler>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RegistryError::LockPoisoned)?;
        Ok(entries
            .iter()
            .find(|r| r.entry.range(kind).contains(id))
            .map(|r| Arc::clone(r.entry.handler())))
    }

    pub fn len(&self) -> RegistryResult<usize> {
        Ok(self
            .entries
            .read()
            .map_err(|_| RegistryError::LockPoisoned)?
            .len())
    }

    pub fn is_empty(&self) -> RegistryResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Registered entries in registration order.
    pub fn entries(&self) -> RegistryResult<Vec<EntryInfo>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RegistryError::LockPoisoned)?;
        Ok(entries
            .iter()
            .map(|r| EntryInfo {
                handle: r.handle,
                name: r.entry.name().to_string(),
                get: r.entry.get_range.bounds(),
                set: r.entry.set_range.bounds(),
            })
            .collect())
    }
}
