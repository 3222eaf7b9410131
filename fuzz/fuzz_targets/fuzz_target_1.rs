#![no_main]

use courier_protocol::LogicPacket;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Fuzz packet decoding - test for panics, crashes, unbounded allocation
    if let Ok(packet) = LogicPacket::from_bytes(data) {
        // Anything that decodes must re-encode to a frame that decodes the same
        if let Ok(bytes) = packet.to_bytes() {
            assert_eq!(LogicPacket::from_bytes(&bytes).ok(), Some(packet));
        }
    }
});
