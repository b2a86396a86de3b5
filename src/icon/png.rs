//! PNG dimension sniffing.
//!
//! Only the IHDR header is read: the 8-byte signature, then the big-endian
//! width and height at bytes 16..20 and 20..24. No image decoder involved.

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
const PNG_HEADER_LEN: usize = 24;

/// Read `(width, height)` from the start of a PNG file.
///
/// Returns `(None, None)` when the buffer is shorter than the header or the
/// signature does not match.
pub fn png_dimensions(bytes: &[u8]) -> (Option<u32>, Option<u32>) {
    if bytes.len() < PNG_HEADER_LEN || bytes[..8] != PNG_SIGNATURE {
        return (None, None);
    }
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    (Some(width), Some(height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes
    }

    #[test]
    fn reads_big_endian_dimensions() {
        assert_eq!(png_dimensions(&header(640, 480)), (Some(640), Some(480)));
    }

    #[test]
    fn short_buffer_has_no_dimensions() {
        let bytes = header(640, 480);
        assert_eq!(png_dimensions(&bytes[..23]), (None, None));
        assert_eq!(png_dimensions(&[]), (None, None));
    }

    #[test]
    fn wrong_magic_has_no_dimensions() {
        let mut bytes = header(640, 480);
        bytes[1] = b'X';
        assert_eq!(png_dimensions(&bytes), (None, None));
    }
}
