//! Inflate an inbound message payload.
//!
//! Producers send zlib-wrapped DEFLATE. Older servers sent gzip, and some
//! transports strip the wrapper entirely, so the container is sniffed from
//! the first two bytes.

use std::io::{self, Read};

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Zlib,
    Gzip,
    RawDeflate,
}

/// Guess the container from the payload header.
pub fn detect_container(payload: &[u8]) -> Container {
    match payload {
        [a, b, ..] if [*a, *b] == GZIP_MAGIC => Container::Gzip,
        // CMF/FLG: deflate method, and the 16-bit header is a multiple of 31
        [cmf, flg, ..]
            if cmf & 0x0F == 0x08 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0 =>
        {
            Container::Zlib
        }
        _ => Container::RawDeflate,
    }
}

/// Inflate one message. An empty payload is an empty buffer.
pub fn decompress(payload: &[u8]) -> io::Result<Vec<u8>> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }

    // Backlogs compress well; start with room for a few multiples.
    let mut out = Vec::with_capacity(payload.len().saturating_mul(4));
    match detect_container(payload) {
        Container::Zlib => ZlibDecoder::new(payload).read_to_end(&mut out)?,
        Container::Gzip => GzDecoder::new(payload).read_to_end(&mut out)?,
        Container::RawDeflate => DeflateDecoder::new(payload).read_to_end(&mut out)?,
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::{DeflateEncoder, GzEncoder};
    use std::io::Write;

    const BODY: &[u8] = b"\x63\x00\x06active\x01\x63\x00\x06active\x00";

    #[test]
    fn test_zlib_payload() {
        let payload = crate::wire::compress(BODY).unwrap();
        assert_eq!(detect_container(&payload), Container::Zlib);
        assert_eq!(decompress(&payload).unwrap(), BODY);
    }

    #[test]
    fn test_gzip_payload() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(BODY).unwrap();
        let payload = encoder.finish().unwrap();

        assert_eq!(detect_container(&payload), Container::Gzip);
        assert_eq!(decompress(&payload).unwrap(), BODY);
    }

    #[test]
    fn test_raw_deflate_payload() {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(BODY).unwrap();
        let payload = encoder.finish().unwrap();

        assert_eq!(decompress(&payload).unwrap(), BODY);
    }

    #[test]
    fn test_empty_payload() {
        assert!(decompress(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_payload_is_error() {
        // valid zlib header, garbage body
        let payload = [0x78, 0x9C, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(decompress(&payload).is_err());
    }
}
