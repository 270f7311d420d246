//! Fuzz target for protocol message decoding
//!
//! Feeds arbitrary frame types and payloads to the message decoder.

#![no_main]

use arbitrary::Arbitrary;
use filestream_core::{Frame, Message};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    frame_type: u8,
    payload: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let mut bytes = vec![filestream_core::PROTOCOL_VERSION, input.frame_type, 0, 0];
    bytes.extend_from_slice(&(input.payload.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&input.payload);

    if let Ok(frame) = Frame::parse(&bytes) {
        if let Ok(message) = Message::from_frame(&frame) {
            // Decoded messages always encode again
            let _ = message.to_frame();
        }
    }
});
