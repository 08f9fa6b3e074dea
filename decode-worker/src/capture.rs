//! Capture files: recorded transport messages, back to back.
//!
//! Each message is a `u32` big-endian length followed by that many
//! compressed bytes, exactly as it arrived from the server.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

const LENGTH_PREFIX: usize = 4;

/// Split a capture into its message payloads.
///
/// A final message cut short by the end of the file is dropped with a
/// warning; everything before it is still returned.
pub fn split_messages(bytes: &[u8]) -> Vec<&[u8]> {
    let mut messages = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let Some(prefix) = bytes.get(pos..pos + LENGTH_PREFIX) else {
            tracing::warn!(offset = pos, "Capture ends inside a length prefix");
            break;
        };
        let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
        let start = pos + LENGTH_PREFIX;
        let Some(payload) = bytes.get(start..start + len) else {
            tracing::warn!(
                offset = pos,
                declared = len,
                available = bytes.len() - start,
                "Capture ends inside a message"
            );
            break;
        };
        messages.push(payload);
        pos = start + len;
    }

    messages
}

/// Memory-mapped capture file.
pub struct Capture {
    mmap: Mmap,
}

impl Capture {
    pub fn open(path: &Path) -> Result<Self, String> {
        let file = File::open(path).map_err(|e| format!("Failed to open capture: {}", e))?;
        // Safety: the capture is read-only input and not modified while mapped
        let mmap = unsafe { Mmap::map(&file).map_err(|e| format!("Failed to mmap: {}", e))? };
        Ok(Self { mmap })
    }

    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    pub fn messages(&self) -> Vec<&[u8]> {
        split_messages(&self.mmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn frame(payloads: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for payload in payloads {
            out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            out.extend_from_slice(payload);
        }
        out
    }

    #[test]
    fn test_split_messages() {
        let bytes = frame(&[b"first", b"", b"third message"]);
        let messages = split_messages(&bytes);
        assert_eq!(messages, vec![&b"first"[..], &b""[..], &b"third message"[..]]);
    }

    #[test]
    fn test_truncated_tail_is_dropped() {
        let mut bytes = frame(&[b"kept"]);
        bytes.extend_from_slice(&100u32.to_be_bytes());
        bytes.extend_from_slice(b"short");
        assert_eq!(split_messages(&bytes), vec![&b"kept"[..]]);

        let mut bytes = frame(&[b"kept"]);
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(split_messages(&bytes), vec![&b"kept"[..]]);
    }

    #[test]
    fn test_open_capture_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&frame(&[b"abc", b"defg"])).unwrap();
        file.flush().unwrap();

        let capture = Capture::open(file.path()).unwrap();
        assert_eq!(capture.len(), 4 + 3 + 4 + 4);
        assert_eq!(capture.messages(), vec![&b"abc"[..], &b"defg"[..]]);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Capture::open(&dir.path().join("missing.bin")).is_err());
    }
}
