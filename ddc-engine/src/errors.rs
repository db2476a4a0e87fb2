//! Error types for the DDC/CI engine.

use crate::transport::DisplayHandle;
use ddc_protocol::FrameError;
use std::io;
use thiserror::Error;

/// Errors that can occur during DDC/CI operation.
///
/// Every failure a caller can observe maps to exactly one variant; frame
/// errors keep their [`FrameError`] subcategory so checksum noise stays
/// distinguishable from structurally broken replies.
#[derive(Debug, Error)]
pub enum DdcError {
    /// The physical exchange failed or timed out. Short and empty reads
    /// surface here as `UnexpectedEof`.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// Frame-level failure: checksum mismatch, malformed reply, or an
    /// explicit "unsupported feature" answer from the display.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The referenced display is not attached (or disappeared).
    #[error("display {0} not found")]
    InvalidHandle(DisplayHandle),

    /// The platform transport could not be queried at all. Distinct from
    /// a successful discovery that found zero monitors.
    #[error("display discovery unavailable: {0}")]
    DiscoveryUnavailable(String),
}

impl DdcError {
    /// Returns true if this error is worth retrying inside the engine.
    ///
    /// Transport faults and checksum mismatches are transient bus noise;
    /// monitors frequently drop or mangle the first poll after sitting
    /// idle. Everything else is a definitive answer.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Frame(FrameError::ChecksumMismatch { .. })
        )
    }

    /// Transport fault for a reply shorter than the protocol requires.
    pub(crate) fn short_reply(got: usize, expected: usize) -> Self {
        Self::Transport(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("short reply: {} of {} bytes", got, expected),
        ))
    }
}
