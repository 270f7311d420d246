//! Fuzz target for frame parsing
//!
//! Tests that the frame parser correctly handles arbitrary input without panicking.

#![no_main]

use filestream_core::{Frame, FrameHeader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The parser should never panic, only return Ok or Err
    let _ = FrameHeader::parse(data);

    if let Ok(frame) = Frame::parse(data) {
        // Re-encoding keeps the payload; reserved bytes are not preserved
        let encoded = frame.encode();
        assert_eq!(encoded.len(), frame.encoded_len());
        assert_eq!(&encoded[8..], frame.payload());
    }
});
