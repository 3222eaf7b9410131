#![no_main]

use courier_protocol::Header;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Header block decoding plus lenient metadata access on whatever decodes
    if let Ok(header) = Header::from_bytes(data) {
        let _ = header.service_name();
        for entry in header.meta.iter() {
            let _ = header.meta.get(&entry.key);
            let _ = entry.decode();
        }
    }
});
