//! Fuzz target for the icon document parser.
//!
//! The image marker is disabled so fuzz input never names a file to read.

#![no_main]

use std::path::Path;

use a2dl::config::BuildOptions;
use a2dl::icon::{Icon, Placement};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Cap input size to avoid excessive memory usage.
    if data.len() > 1024 * 1024 {
        return;
    }

    let mut opts = BuildOptions::default();
    opts.tokens.icon_image.clear();
    if let Ok(icon) = Icon::from_adoc_slice(data, Path::new("."), &opts) {
        let _ = icon.to_xml_string(Placement::new(0.0, 0.0, 80.0, 80.0));
    }
});
