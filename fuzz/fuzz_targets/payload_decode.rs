//! Fuzz target for compressed `<diagram>` payload decoding.

#![no_main]

use std::path::Path;

use a2dl::diagram::codec::decode_payload;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(payload) = std::str::from_utf8(data) else {
        return;
    };

    let _ = decode_payload(payload, Path::new("fuzz.drawio"));
});
