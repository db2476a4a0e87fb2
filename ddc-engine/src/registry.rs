//! Display enumeration and handle resolution.

use crate::errors::DdcError;
use crate::transport::{DdcTransport, DisplayHandle};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// One discovered monitor, as handed to external callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorDescriptor {
    pub id: DisplayHandle,
    /// May be empty when the platform has no name for the display.
    pub name: String,
}

/// Enumerates displays reachable through the transport.
///
/// Every [`discover`](DisplayRegistry::discover) call produces a fresh,
/// fully materialized snapshot, since monitors hot-plug. The registry also
/// remembers which handles the last enumeration saw so that transactions
/// against an unknown id can be refused before any bytes hit a bus.
pub struct DisplayRegistry {
    transport: Arc<dyn DdcTransport>,
    known: RwLock<Option<HashSet<DisplayHandle>>>,
}

impl DisplayRegistry {
    pub fn new(transport: Arc<dyn DdcTransport>) -> Self {
        Self {
            transport,
            known: RwLock::new(None),
        }
    }

    /// Enumerate all currently attached displays.
    ///
    /// An empty list is a valid answer (no monitors found); a transport
    /// that cannot be queried at all yields
    /// [`DdcError::DiscoveryUnavailable`] instead, so callers can tell
    /// "no monitors" from "cannot ask".
    pub fn discover(&self) -> Result<Vec<MonitorDescriptor>, DdcError> {
        let infos = self.transport.list_displays()?;
        *self.known.write() = Some(infos.iter().map(|i| i.handle).collect());
        info!(count = infos.len(), "display discovery complete");
        Ok(infos
            .into_iter()
            .map(|i| MonitorDescriptor {
                id: i.handle,
                name: i.name,
            })
            .collect())
    }

    /// Check that `handle` named a display at the last enumeration.
    ///
    /// Runs discovery first if none has happened yet; after that it is a
    /// pure membership test, so an unknown id fails without touching the
    /// display bus.
    pub fn resolve(&self, handle: DisplayHandle) -> Result<DisplayHandle, DdcError> {
        if self.known.read().is_none() {
            self.discover()?;
        }
        let known = self.known.read();
        match known.as_ref() {
            Some(handles) if handles.contains(&handle) => Ok(handle),
            _ => Err(DdcError::InvalidHandle(handle)),
        }
    }
}

impl std::fmt::Debug for DisplayRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayRegistry")
            .field("known", &*self.known.read())
            .finish_non_exhaustive()
    }
}
