//! VCP transaction engine.
//!
//! Drives one logical get/set operation against one display, hiding the
//! bus's unreliability: settle delays between write and read, retry with
//! increasing backoff on transient faults, and per-display serialization.
//!
//! DDC/CI is a shared half-duplex channel per display, so transactions
//! against the same handle must never interleave. Each handle gets its own
//! async mutex, held for the whole transaction including its delays;
//! tokio's mutex queues waiters in FIFO order, so transactions on one
//! handle complete in submission order. Different handles proceed
//! concurrently.

use crate::config::EngineConfig;
use crate::errors::DdcError;
use crate::transport::{DdcTransport, DisplayHandle};
use ddc_protocol::frame::{self, GET_REPLY_LEN};
use ddc_protocol::{FeatureCode, FrameError, VcpValue};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Serialized, retrying get/set transactions over a shared transport.
pub struct TransactionEngine {
    transport: Arc<dyn DdcTransport>,
    config: EngineConfig,
    locks: Mutex<HashMap<DisplayHandle, Arc<tokio::sync::Mutex<()>>>>,
}

impl TransactionEngine {
    pub fn new(transport: Arc<dyn DdcTransport>, config: EngineConfig) -> Self {
        Self {
            transport,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The serialization lock for one display handle.
    fn lock_for(&self, handle: DisplayHandle) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        locks.entry(handle).or_default().clone()
    }

    /// Read a VCP feature from a display.
    ///
    /// Writes the encoded request, waits the settle delay, reads and
    /// decodes the reply. Transient faults are retried up to the
    /// configured bound before the last error surfaces.
    pub async fn get(
        &self,
        handle: DisplayHandle,
        feature: FeatureCode,
    ) -> Result<VcpValue, DdcError> {
        let lock = self.lock_for(handle);
        let _guard = lock.lock().await;

        let request = frame::encode_get_request(feature);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.exchange_get(handle, &request).await {
                Ok(value) => {
                    debug!(
                        %handle,
                        %feature,
                        current = value.current,
                        maximum = value.maximum,
                        attempt,
                        "get vcp feature"
                    );
                    return Ok(value);
                }
                Err(err) => self.handle_attempt_error(handle, feature, attempt, err).await?,
            }
        }
    }

    /// Write a VCP feature to a display.
    ///
    /// Sets are fire-and-forget on the wire; no reply is read. The
    /// inter-command delay is honored before the handle lock is released
    /// so a follow-up transaction cannot overrun the display's bus
    /// arbitration.
    pub async fn set(
        &self,
        handle: DisplayHandle,
        feature: FeatureCode,
        value: u16,
    ) -> Result<(), DdcError> {
        let lock = self.lock_for(handle);
        let _guard = lock.lock().await;

        let request = frame::encode_set_request(feature, value);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.write_bounded(handle, request.clone()).await {
                Ok(()) => {
                    debug!(%handle, %feature, value, attempt, "set vcp feature");
                    sleep(self.config.inter_command_delay()).await;
                    return Ok(());
                }
                Err(err) => self.handle_attempt_error(handle, feature, attempt, err).await?,
            }
        }
    }

    /// One write / settle / read / decode cycle.
    async fn exchange_get(
        &self,
        handle: DisplayHandle,
        request: &[u8],
    ) -> Result<VcpValue, DdcError> {
        self.write_bounded(handle, request.to_vec()).await?;
        sleep(self.config.settle_delay()).await;
        let reply = self.read_bounded(handle, GET_REPLY_LEN).await?;
        if reply.len() < GET_REPLY_LEN {
            return Err(DdcError::short_reply(reply.len(), GET_REPLY_LEN));
        }
        Ok(frame::decode_get_reply(&reply)?)
    }

    /// Run one blocking transport write, bounded by the configured I/O
    /// timeout. A timed-out call is abandoned to the blocking pool and
    /// reported as a transport fault.
    async fn write_bounded(&self, handle: DisplayHandle, frame: Vec<u8>) -> Result<(), DdcError> {
        let transport = self.transport.clone();
        self.bounded(tokio::task::spawn_blocking(move || {
            transport.write(handle, &frame)
        }))
        .await
    }

    /// Run one blocking transport read, bounded by the configured I/O
    /// timeout.
    async fn read_bounded(
        &self,
        handle: DisplayHandle,
        len: usize,
    ) -> Result<Vec<u8>, DdcError> {
        let transport = self.transport.clone();
        self.bounded(tokio::task::spawn_blocking(move || {
            transport.read(handle, len)
        }))
        .await
    }

    async fn bounded<T>(
        &self,
        task: tokio::task::JoinHandle<Result<T, DdcError>>,
    ) -> Result<T, DdcError> {
        match timeout(self.config.io_timeout(), task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(DdcError::Transport(io::Error::new(
                io::ErrorKind::Other,
                join_err.to_string(),
            ))),
            Err(_) => Err(DdcError::Transport(io::Error::from(
                io::ErrorKind::TimedOut,
            ))),
        }
    }

    /// Swallow a retryable error while attempts remain, sleeping the
    /// backoff; otherwise propagate it as the transaction's outcome.
    async fn handle_attempt_error(
        &self,
        handle: DisplayHandle,
        feature: FeatureCode,
        attempt: u32,
        err: DdcError,
    ) -> Result<(), DdcError> {
        if !err.is_retryable() || attempt > self.config.max_retries {
            return Err(err);
        }
        // Checksum noise is logged apart from transport faults; the two
        // point at different hardware problems.
        if matches!(err, DdcError::Frame(FrameError::ChecksumMismatch { .. })) {
            warn!(%handle, %feature, attempt, %err, "checksum mismatch, retrying");
        } else {
            warn!(%handle, %feature, attempt, %err, "transport fault, retrying");
        }
        sleep(self.config.inter_command_delay() * attempt).await;
        Ok(())
    }
}

impl std::fmt::Debug for TransactionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
