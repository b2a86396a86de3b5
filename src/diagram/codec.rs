//! Compressed `<diagram>` payloads.
//!
//! draw.io stores a page either as an inline `mxGraphModel` or as text:
//! `base64(raw_deflate(encodeURIComponent(model_xml)))`. The deflate stream
//! has no zlib or gzip framing.

use std::io::{Read, Write};
use std::path::Path;

use base64::Engine as _;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::A2dlError;

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Decode a compressed payload back to model XML.
///
/// Whitespace inside the base64 text is ignored. `path` only provides
/// error context.
pub fn decode_payload(payload: &str, path: &Path) -> Result<String, A2dlError> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let deflated = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|source| payload_error(path, format!("invalid base64: {source}")))?;

    let mut escaped = String::new();
    DeflateDecoder::new(deflated.as_slice())
        .read_to_string(&mut escaped)
        .map_err(|source| payload_error(path, format!("invalid deflate stream: {source}")))?;

    percent_decode_str(&escaped)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|source| payload_error(path, format!("invalid percent-encoding: {source}")))
}

/// Encode model XML as a compressed payload.
pub fn encode_payload(xml: &str) -> Result<String, A2dlError> {
    let escaped = utf8_percent_encode(xml, URI_COMPONENT).to_string();
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(escaped.as_bytes())?;
    let deflated = encoder.finish()?;
    Ok(base64::engine::general_purpose::STANDARD.encode(deflated))
}

fn payload_error(path: &Path, message: String) -> A2dlError {
    A2dlError::CompressedPayload {
        path: path.to_path_buf(),
        message,
    }
}
