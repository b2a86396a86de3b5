#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// PNG signature plus an IHDR chunk: enough for dimension sniffing.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 2, 0, 0, 0]);
    bytes.extend_from_slice(&0u32.to_be_bytes());
    bytes
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, png_bytes(width, height)).expect("write png file");
}

/// One tooltip section: `(title, variable name, body)`.
pub type Section<'a> = (&'a str, &'a str, &'a str);

/// Render an icon document.
pub fn icon_adoc(name: &str, image: Option<&str>, sections: &[Section<'_>]) -> String {
    let mut doc = format!("= {name}\n:icon_name: {name}\n");
    if let Some(image) = image {
        doc.push_str(&format!(":icon_image_path: {image}\n"));
    }
    for (title, variable, body) in sections {
        doc.push_str(&format!("\n== {title}\n:variable_name: {variable}\n{body}\n"));
    }
    doc
}

pub fn write_adoc(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, contents).expect("write adoc file");
}

/// A document with neither sections nor an image.
pub fn write_note(path: &Path) {
    write_adoc(path, "= Notes\n\nJust prose, no icon here.\n");
}
