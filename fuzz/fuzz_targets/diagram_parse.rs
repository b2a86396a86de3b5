//! Fuzz target for diagram loading, including the compressed-page path.

#![no_main]

use std::path::Path;

use a2dl::diagram::Diagram;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(diagram) = Diagram::from_slice(data, Path::new("fuzz.drawio")) {
        let _ = diagram.to_xml_string(false);
    }
});
