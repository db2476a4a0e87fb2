//! Raw DDC transport abstraction.
//!
//! The engine never touches the bus directly; it goes through
//! [`DdcTransport`], which the platform layer (or a test double)
//! implements. One transport instance is shared process-wide and handles
//! are independent keys into it.

use crate::errors::DdcError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier naming one attached monitor for the duration of a
/// process run.
///
/// The numeric value is platform-assigned (on Linux, the I2C bus number).
/// Handles are not stable across hot-plug events or reboots; operations
/// against a vanished display fail with [`DdcError::InvalidHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayHandle(pub u32);

impl fmt::Display for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One attached display as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    pub handle: DisplayHandle,
    /// Human-readable name, best-effort. Empty when the platform cannot
    /// provide one; that is not an error.
    pub name: String,
}

/// Raw write-then-read byte exchange with a display's control channel.
///
/// Implementations are blocking and must bound each call with a
/// platform-level timeout; a timeout is reported as a transport error,
/// never as a successful empty read. The engine layers settle delays,
/// retries, and per-display serialization on top, so implementations only
/// need to move bytes.
pub trait DdcTransport: Send + Sync {
    /// Enumerate displays currently reachable on this transport.
    ///
    /// # Errors
    ///
    /// [`DdcError::DiscoveryUnavailable`] when the platform cannot be
    /// queried at all (e.g. permission denied). Finding zero displays is
    /// a success, not an error.
    fn list_displays(&self) -> Result<Vec<DisplayInfo>, DdcError>;

    /// Write one command frame to the display's control address.
    fn write(&self, handle: DisplayHandle, frame: &[u8]) -> Result<(), DdcError>;

    /// Read up to `len` reply bytes from the display's control address.
    ///
    /// May return fewer bytes than requested; the engine treats a short
    /// read as a retryable transport fault.
    fn read(&self, handle: DisplayHandle, len: usize) -> Result<Vec<u8>, DdcError>;
}
