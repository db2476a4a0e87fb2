//! Property tests for DDC/CI frame coding.
//!
//! These verify the two codec guarantees everything upstream leans on:
//! encode/decode is lossless over the full (feature, value) space, and the
//! seeded XOR checksum deterministically catches any single-byte
//! corruption.

use crate::frame::*;
use crate::vcp::{FeatureCode, VcpValue};
use proptest::prelude::*;

fn arbitrary_feature() -> impl Strategy<Value = FeatureCode> {
    any::<u8>().prop_map(FeatureCode)
}

fn arbitrary_value() -> impl Strategy<Value = VcpValue> {
    (any::<u16>(), any::<u16>()).prop_map(|(current, maximum)| VcpValue { current, maximum })
}

proptest! {
    /// Get requests round-trip for every feature code.
    #[test]
    fn get_request_roundtrip(feature in arbitrary_feature()) {
        let frame = encode_get_request(feature);
        prop_assert_eq!(decode_request(&frame), Ok(Request::Get { feature }));
    }

    /// Set requests round-trip for every (feature, value) pair.
    #[test]
    fn set_request_roundtrip(feature in arbitrary_feature(), value in any::<u16>()) {
        let frame = encode_set_request(feature, value);
        prop_assert_eq!(decode_request(&frame), Ok(Request::Set { feature, value }));
    }

    /// Replies round-trip for every value pair, including maximum == 0.
    #[test]
    fn get_reply_roundtrip(feature in arbitrary_feature(), value in arbitrary_value()) {
        let frame = encode_get_reply(feature, value);
        prop_assert_eq!(decode_get_reply(&frame), Ok(value));
    }

    /// Flipping any bit of any non-checksum reply byte must surface as a
    /// checksum mismatch, never as a decoded value or a structural error.
    #[test]
    fn reply_single_byte_corruption_detected(
        feature in arbitrary_feature(),
        value in arbitrary_value(),
        index in 0usize..GET_REPLY_LEN - 1,
        flip in 1u8..=255,
    ) {
        let mut frame = encode_get_reply(feature, value);
        frame[index] ^= flip;
        let is_checksum_mismatch = matches!(
            decode_get_reply(&frame),
            Err(FrameError::ChecksumMismatch { .. })
        );
        prop_assert!(is_checksum_mismatch);
    }

    /// Corrupting the checksum byte itself is also caught.
    #[test]
    fn reply_checksum_byte_corruption_detected(
        feature in arbitrary_feature(),
        value in arbitrary_value(),
        flip in 1u8..=255,
    ) {
        let mut frame = encode_get_reply(feature, value);
        let last = frame.len() - 1;
        frame[last] ^= flip;
        let is_checksum_mismatch = matches!(
            decode_get_reply(&frame),
            Err(FrameError::ChecksumMismatch { .. })
        );
        prop_assert!(is_checksum_mismatch);
    }

    /// Same corruption property for host-to-display set requests.
    #[test]
    fn set_request_single_byte_corruption_detected(
        feature in arbitrary_feature(),
        value in any::<u16>(),
        index in 0usize..6,
        flip in 1u8..=255,
    ) {
        let mut frame = encode_set_request(feature, value);
        frame[index] ^= flip;
        let is_checksum_mismatch = matches!(
            decode_request(&frame),
            Err(FrameError::ChecksumMismatch { .. })
        );
        prop_assert!(is_checksum_mismatch);
    }
}
