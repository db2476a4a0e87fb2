//! DDC/CI wire-level frame encoding and decoding.
//!
//! A DDC/CI frame is a short byte sequence exchanged with the display's
//! control channel at I2C address 0x37:
//!
//! ```text
//! host -> display:  [0x51] [0x80|len] [payload...] [checksum]
//! display -> host:  [0x6E] [0x80|len] [payload...] [checksum]
//! ```
//!
//! The checksum is the XOR of every preceding frame byte, seeded with the
//! fixed destination address: 0x6E for host-to-display frames, 0x6F for
//! display-to-host replies. The destination byte itself never appears in
//! the frame; it is carried by I2C addressing. Seeding the XOR with it is
//! what makes the checksum catch misdirected frames.
//!
//! # Get VCP Feature reply layout (11 bytes)
//!
//! ```text
//! offset  0     1     2     3       4     5     6       7       8       9       10
//!         0x6E  0x88  0x02  result  code  type  max_hi  max_lo  cur_hi  cur_lo  chk
//! ```

use crate::vcp::{FeatureCode, VcpValue};
use thiserror::Error;

/// Destination address for host-to-display frames (checksum seed).
pub const HOST_DESTINATION: u8 = 0x6E;
/// Destination address for display-to-host replies (checksum seed).
pub const REPLY_DESTINATION: u8 = 0x6F;
/// Source address byte the host places in outgoing frames.
pub const HOST_SOURCE: u8 = 0x51;
/// Source address byte the display places in replies.
pub const REPLY_SOURCE: u8 = 0x6E;
/// Protocol flag OR'd into every length byte.
pub const LENGTH_FLAG: u8 = 0x80;

/// Get VCP Feature opcode.
pub const OP_GET_VCP: u8 = 0x01;
/// Get VCP Feature reply opcode.
pub const OP_GET_VCP_REPLY: u8 = 0x02;
/// Set VCP Feature opcode.
pub const OP_SET_VCP: u8 = 0x03;

/// Total length of a Get VCP Feature reply frame.
pub const GET_REPLY_LEN: usize = 11;

const RESULT_NO_ERROR: u8 = 0x00;
const RESULT_UNSUPPORTED: u8 = 0x01;

/// Frame decoding failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The trailing byte did not match the computed XOR. Transient line
    /// noise; callers may retry the transaction.
    #[error("checksum mismatch: computed {computed:#04x}, frame carried {found:#04x}")]
    ChecksumMismatch { computed: u8, found: u8 },

    /// Structurally invalid frame (wrong length, length byte, or opcode).
    /// Retrying will not fix a display that frames replies wrongly.
    #[error("malformed reply: {0}")]
    MalformedReply(String),

    /// The display explicitly reported the feature code as unsupported.
    #[error("feature code {0:#04x} not supported by display")]
    UnsupportedFeature(u8),
}

/// XOR checksum over `bytes`, seeded with the destination address.
pub fn checksum(destination: u8, bytes: &[u8]) -> u8 {
    bytes.iter().fold(destination, |acc, &b| acc ^ b)
}

/// Encode a Get VCP Feature request: `[0x51, 0x82, 0x01, code, chk]`.
pub fn encode_get_request(feature: FeatureCode) -> Vec<u8> {
    let mut frame = vec![HOST_SOURCE, LENGTH_FLAG | 0x02, OP_GET_VCP, feature.raw()];
    frame.push(checksum(HOST_DESTINATION, &frame));
    frame
}

/// Encode a Set VCP Feature request: `[0x51, 0x84, 0x03, code, hi, lo, chk]`.
pub fn encode_set_request(feature: FeatureCode, value: u16) -> Vec<u8> {
    let [hi, lo] = value.to_be_bytes();
    let mut frame = vec![
        HOST_SOURCE,
        LENGTH_FLAG | 0x04,
        OP_SET_VCP,
        feature.raw(),
        hi,
        lo,
    ];
    frame.push(checksum(HOST_DESTINATION, &frame));
    frame
}

/// Encode a successful Get VCP Feature reply as a display would frame it.
pub fn encode_get_reply(feature: FeatureCode, value: VcpValue) -> Vec<u8> {
    encode_reply(feature, RESULT_NO_ERROR, value)
}

/// Encode an "unsupported VCP code" reply for `feature`.
pub fn encode_unsupported_reply(feature: FeatureCode) -> Vec<u8> {
    encode_reply(feature, RESULT_UNSUPPORTED, VcpValue::new(0, 0))
}

fn encode_reply(feature: FeatureCode, result: u8, value: VcpValue) -> Vec<u8> {
    let [max_hi, max_lo] = value.maximum.to_be_bytes();
    let [cur_hi, cur_lo] = value.current.to_be_bytes();
    let mut frame = vec![
        REPLY_SOURCE,
        LENGTH_FLAG | 0x08,
        OP_GET_VCP_REPLY,
        result,
        feature.raw(),
        0x00, // VCP type flag (0 = set parameter)
        max_hi,
        max_lo,
        cur_hi,
        cur_lo,
    ];
    frame.push(checksum(REPLY_DESTINATION, &frame));
    frame
}

/// Decode a Get VCP Feature reply frame.
///
/// The checksum is validated before the frame structure: a frame mangled
/// by line noise must surface as [`FrameError::ChecksumMismatch`]
/// (retryable) no matter which byte took the hit, while
/// [`FrameError::MalformedReply`] is reserved for frames that check out
/// byte-for-byte but are structurally wrong.
///
/// # Errors
///
/// - [`FrameError::MalformedReply`] - wrong frame length, length byte,
///   source byte, opcode, or result code
/// - [`FrameError::ChecksumMismatch`] - trailing byte does not match the
///   XOR seeded with 0x6F
/// - [`FrameError::UnsupportedFeature`] - the display marked the feature
///   code unsupported
pub fn decode_get_reply(bytes: &[u8]) -> Result<VcpValue, FrameError> {
    if bytes.len() != GET_REPLY_LEN {
        return Err(FrameError::MalformedReply(format!(
            "reply is {} bytes, expected {}",
            bytes.len(),
            GET_REPLY_LEN
        )));
    }

    let (body, tail) = bytes.split_at(GET_REPLY_LEN - 1);
    let computed = checksum(REPLY_DESTINATION, body);
    if computed != tail[0] {
        return Err(FrameError::ChecksumMismatch {
            computed,
            found: tail[0],
        });
    }

    if body[0] != REPLY_SOURCE {
        return Err(FrameError::MalformedReply(format!(
            "source byte {:#04x}, expected {:#04x}",
            body[0], REPLY_SOURCE
        )));
    }
    if body[1] != (LENGTH_FLAG | 0x08) {
        return Err(FrameError::MalformedReply(format!(
            "length byte {:#04x}, expected {:#04x}",
            body[1],
            LENGTH_FLAG | 0x08
        )));
    }
    if body[2] != OP_GET_VCP_REPLY {
        return Err(FrameError::MalformedReply(format!(
            "opcode {:#04x}, expected {:#04x}",
            body[2], OP_GET_VCP_REPLY
        )));
    }

    match body[3] {
        RESULT_NO_ERROR => {}
        RESULT_UNSUPPORTED => return Err(FrameError::UnsupportedFeature(body[4])),
        other => {
            return Err(FrameError::MalformedReply(format!(
                "unknown result code {:#04x}",
                other
            )))
        }
    }

    Ok(VcpValue {
        maximum: u16::from_be_bytes([body[6], body[7]]),
        current: u16::from_be_bytes([body[8], body[9]]),
    })
}

/// A decoded host-to-display request.
///
/// Used by transport test doubles and bus monitors to interpret the frames
/// the engine writes; the engine itself only encodes requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Get { feature: FeatureCode },
    Set { feature: FeatureCode, value: u16 },
}

/// Decode a host-to-display request frame.
pub fn decode_request(bytes: &[u8]) -> Result<Request, FrameError> {
    if bytes.len() < 4 {
        return Err(FrameError::MalformedReply(format!(
            "request is {} bytes, too short to frame",
            bytes.len()
        )));
    }

    let (body, tail) = bytes.split_at(bytes.len() - 1);
    let computed = checksum(HOST_DESTINATION, body);
    if computed != tail[0] {
        return Err(FrameError::ChecksumMismatch {
            computed,
            found: tail[0],
        });
    }

    if body[0] != HOST_SOURCE {
        return Err(FrameError::MalformedReply(format!(
            "source byte {:#04x}, expected {:#04x}",
            body[0], HOST_SOURCE
        )));
    }
    let payload_len = (body[1] & !LENGTH_FLAG) as usize;
    if body[1] & LENGTH_FLAG == 0 || payload_len != body.len() - 2 {
        return Err(FrameError::MalformedReply(format!(
            "length byte {:#04x} does not match {} payload bytes",
            body[1],
            body.len() - 2
        )));
    }

    match body[2] {
        OP_GET_VCP if payload_len == 2 => Ok(Request::Get {
            feature: FeatureCode(body[3]),
        }),
        OP_SET_VCP if payload_len == 4 => Ok(Request::Set {
            feature: FeatureCode(body[3]),
            value: u16::from_be_bytes([body[4], body[5]]),
        }),
        op => Err(FrameError::MalformedReply(format!(
            "unknown request opcode {:#04x} with {} payload bytes",
            op, payload_len
        ))),
    }
}
