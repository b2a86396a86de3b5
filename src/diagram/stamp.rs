//! Node fingerprints.

use serde::Serialize;

use crate::xml::XmlElement;

/// Fingerprint of one icon-bearing node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Stamp {
    pub name: Option<String>,
    pub label: Option<String>,
    /// CRC32C of the embedded image data URI, 0 when the style has none.
    pub image_hash: u32,
    /// CRC32C over the object and cell attributes, sorted by key.
    pub attributes_hash: u32,
}

impl Stamp {
    pub fn of(object: &XmlElement) -> Self {
        let cell = object.child("mxCell");
        let image_hash = cell
            .and_then(|cell| cell.attr("style"))
            .and_then(image_from_style)
            .map(|image| crc32c::crc32c(image.as_bytes()))
            .unwrap_or(0);

        let mut buffer = String::new();
        append_sorted(&mut buffer, object);
        if let Some(cell) = cell {
            buffer.push('\u{1}');
            append_sorted(&mut buffer, cell);
        }

        Self {
            name: object.attr("name").map(str::to_string),
            label: object.attr("label").map(str::to_string),
            image_hash,
            attributes_hash: crc32c::crc32c(buffer.as_bytes()),
        }
    }
}

fn image_from_style(style: &str) -> Option<&str> {
    style
        .split(';')
        .find_map(|entry| entry.strip_prefix("image="))
        .filter(|image| !image.is_empty())
}

fn append_sorted(buffer: &mut String, element: &XmlElement) {
    let mut attributes: Vec<&(String, String)> = element.attributes.iter().collect();
    attributes.sort();
    for (key, value) in attributes {
        buffer.push_str(key);
        buffer.push('=');
        buffer.push_str(value);
        buffer.push('\0');
    }
}
