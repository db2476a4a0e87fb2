//! Public API facade for monitor control.
//!
//! This is the boundary surface external callers touch (CLI, UI, language
//! bindings). It owns no protocol logic; it resolves display ids through
//! the registry, drives the transaction engine, and narrows the internal
//! error taxonomy to a small closed set of integer status codes. Raw
//! errors never cross this boundary.
//!
//! # String ownership
//!
//! Serialized results (the monitor list JSON) are produced as
//! [`StringLease`]s: the facade owns the bytes until the caller releases
//! the lease, exactly once. This mirrors a C boundary's
//! produce/free-string pairing while staying accountable — the
//! outstanding-lease count makes both leaks and double releases visible
//! to tests.

use ddc_engine::{
    DdcError, DdcTransport, DisplayHandle, DisplayRegistry, EngineConfig, TransactionEngine,
};
use ddc_protocol::{FeatureCode, FrameError, VcpValue};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::error;

/// Integer status codes returned across the boundary.
///
/// 0 means success; every non-zero value names exactly one entry of the
/// error taxonomy. Callers must not infer more than success/non-success
/// without this table.
pub mod status {
    /// Operation completed.
    pub const OK: i32 = 0;
    /// The physical exchange failed or timed out, after retries.
    pub const TRANSPORT_FAULT: i32 = 1;
    /// Reply checksums kept failing, after retries.
    pub const CHECKSUM_MISMATCH: i32 = 2;
    /// The display returned a structurally invalid reply.
    pub const MALFORMED_REPLY: i32 = 3;
    /// The display reported the feature code as unsupported.
    pub const UNSUPPORTED_FEATURE: i32 = 4;
    /// The referenced display does not exist.
    pub const INVALID_HANDLE: i32 = 5;
    /// Display enumeration itself was impossible.
    pub const DISCOVERY_UNAVAILABLE: i32 = 6;
}

/// Narrow an engine error to its boundary status code.
pub fn status_code(err: &DdcError) -> i32 {
    match err {
        DdcError::Transport(_) => status::TRANSPORT_FAULT,
        DdcError::Frame(FrameError::ChecksumMismatch { .. }) => status::CHECKSUM_MISMATCH,
        DdcError::Frame(FrameError::MalformedReply(_)) => status::MALFORMED_REPLY,
        DdcError::Frame(FrameError::UnsupportedFeature(_)) => status::UNSUPPORTED_FEATURE,
        DdcError::InvalidHandle(_) => status::INVALID_HANDLE,
        DdcError::DiscoveryUnavailable(_) => status::DISCOVERY_UNAVAILABLE,
    }
}

/// A facade-owned string handed across the boundary.
///
/// Deliberately neither `Clone` nor `Copy`: the Rust-side API consumes the
/// lease on release, while bindings that only see the raw token go through
/// [`MonitorControl::release_token`], where a stale token is caught at
/// runtime.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct StringLease {
    token: u64,
}

impl StringLease {
    /// The raw token, for callers crossing an FFI boundary.
    pub fn token(&self) -> u64 {
        self.token
    }
}

/// Result of a boundary get-feature call. Never partial: a non-zero
/// status comes with zeroed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureReply {
    pub value: u16,
    pub max_value: u16,
    pub status: i32,
}

impl FeatureReply {
    fn failure(status: i32) -> Self {
        Self {
            value: 0,
            max_value: 0,
            status,
        }
    }
}

/// The boundary surface: discover, get-feature, set-feature.
pub struct MonitorControl {
    engine: TransactionEngine,
    registry: DisplayRegistry,
    leases: Mutex<HashMap<u64, String>>,
    next_token: AtomicU64,
}

impl MonitorControl {
    /// Build the facade over one process-wide transport instance.
    pub fn new(transport: Arc<dyn DdcTransport>, config: EngineConfig) -> Self {
        Self {
            engine: TransactionEngine::new(transport.clone(), config),
            registry: DisplayRegistry::new(transport),
            leases: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Enumerate attached monitors as a leased JSON array
    /// `[{ "id": n, "name": s }, ...]`.
    ///
    /// An empty array is a valid success (no monitors found); `Err`
    /// carries the status code for a failed discovery.
    pub fn list_monitors(&self) -> Result<StringLease, i32> {
        let monitors = self.registry.discover().map_err(|e| {
            error!(%e, "monitor discovery failed");
            status_code(&e)
        })?;
        match serde_json::to_string(&monitors) {
            Ok(json) => Ok(self.lease(json)),
            Err(e) => {
                error!(%e, "monitor list serialization failed");
                Err(status::DISCOVERY_UNAVAILABLE)
            }
        }
    }

    /// Read a VCP feature from a display.
    pub async fn get_feature(&self, id: u32, feature_code: u8) -> FeatureReply {
        let handle = match self.registry.resolve(DisplayHandle(id)) {
            Ok(handle) => handle,
            Err(e) => return FeatureReply::failure(status_code(&e)),
        };
        match self.engine.get(handle, FeatureCode(feature_code)).await {
            Ok(VcpValue { current, maximum }) => FeatureReply {
                value: current,
                max_value: maximum,
                status: status::OK,
            },
            Err(e) => FeatureReply::failure(status_code(&e)),
        }
    }

    /// Write a VCP feature to a display.
    pub async fn set_feature(&self, id: u32, feature_code: u8, value: u16) -> i32 {
        let handle = match self.registry.resolve(DisplayHandle(id)) {
            Ok(handle) => handle,
            Err(e) => return status_code(&e),
        };
        match self.engine.set(handle, FeatureCode(feature_code), value).await {
            Ok(()) => status::OK,
            Err(e) => status_code(&e),
        }
    }

    /// Read a leased string's contents without releasing it.
    pub fn lease_contents(&self, lease: &StringLease) -> Option<String> {
        self.leases.lock().get(&lease.token).cloned()
    }

    /// Release a leased string, consuming the lease.
    pub fn release(&self, lease: StringLease) -> bool {
        self.release_token(lease.token)
    }

    /// Release by raw token. Returns false if the token is unknown —
    /// which includes the second of a double release.
    pub fn release_token(&self, token: u64) -> bool {
        let released = self.leases.lock().remove(&token).is_some();
        if !released {
            error!(token, "release of unknown or already-released string");
        }
        released
    }

    /// Number of produced strings not yet released. A non-zero value at
    /// caller shutdown is a leak.
    pub fn outstanding_strings(&self) -> usize {
        self.leases.lock().len()
    }

    fn lease(&self, contents: String) -> StringLease {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.leases.lock().insert(token, contents);
        StringLease { token }
    }
}

impl std::fmt::Debug for MonitorControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorControl")
            .field("outstanding_strings", &self.outstanding_strings())
            .finish_non_exhaustive()
    }
}
