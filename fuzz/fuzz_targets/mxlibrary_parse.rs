//! Fuzz target for the `<mxlibrary>` container parser.

#![no_main]

use a2dl::library::parse_mxlibrary_slice;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(entries) = parse_mxlibrary_slice(data) {
        for entry in &entries {
            let _ = entry.object();
        }
    }
});
