//! DDC/CI (Display Data Channel Command Interface) protocol codec.
//!
//! This crate provides the pure, transport-independent layer of the MCCS
//! (Monitor Control Command Set) protocol stack:
//!
//! - [`frame`] - Wire-level frame encoding/decoding with XOR checksums
//! - [`vcp`] - VCP (Virtual Control Panel) feature codes and value types
//!
//! # Wire Format Rules
//!
//! All frames follow these invariants:
//!
//! 1. **Big-endian byte order** - Multi-byte VCP values use network byte order
//! 2. **Seeded XOR checksum** - The trailing checksum byte covers every
//!    preceding frame byte and is seeded with the fixed destination address
//!    (0x6E host-to-display, 0x6F display-to-host)
//! 3. **Length flag bit** - The length byte carries the DDC/CI protocol flag
//!    (0x80) OR'd with the payload length
//! 4. **Fail-fast errors** - Invalid data results in errors, no defensive
//!    fallbacks
//!
//! No I/O happens here; the engine crate drives these codecs over a
//! transport.

pub mod frame;
pub mod vcp;

#[cfg(test)]
mod proptest_framing;

// Re-export commonly used types
pub use frame::{
    decode_get_reply, decode_request, encode_get_reply, encode_get_request, encode_set_request,
    encode_unsupported_reply, FrameError, Request, GET_REPLY_LEN,
};
pub use vcp::{FeatureCode, InputSource, VcpValue};
