//! Primitive big-endian readers over a byte buffer.
//!
//! Every reader takes `(buffer, offset)` and returns the value with the offset
//! just past it. Nothing here mutates or retains the buffer.

use super::error::DecodeError;

pub const SIZE_BYTE: usize = 1;
pub const SIZE_INT16: usize = 2;
pub const SIZE_INT32: usize = 4;

/// Borrow `width` bytes at `offset`, or report how short the buffer is.
#[inline]
fn take(buffer: &[u8], offset: usize, width: usize) -> Result<&[u8], DecodeError> {
    let end = offset.checked_add(width).filter(|end| *end <= buffer.len());
    match end {
        Some(end) => Ok(&buffer[offset..end]),
        None => Err(DecodeError::TruncatedBuffer {
            offset,
            needed: width,
            available: buffer.len().saturating_sub(offset),
        }),
    }
}

#[inline]
fn take_array<const N: usize>(buffer: &[u8], offset: usize) -> Result<[u8; N], DecodeError> {
    let mut out = [0u8; N];
    out.copy_from_slice(take(buffer, offset, N)?);
    Ok(out)
}

pub fn read_u8(buffer: &[u8], offset: usize) -> Result<(u8, usize), DecodeError> {
    let [b] = take_array::<SIZE_BYTE>(buffer, offset)?;
    Ok((b, offset + SIZE_BYTE))
}

/// Single byte, any non-zero value is `true`.
pub fn read_bool(buffer: &[u8], offset: usize) -> Result<(bool, usize), DecodeError> {
    let (b, next) = read_u8(buffer, offset)?;
    Ok((b != 0, next))
}

pub fn read_u16(buffer: &[u8], offset: usize) -> Result<(u16, usize), DecodeError> {
    let bytes = take_array::<SIZE_INT16>(buffer, offset)?;
    Ok((u16::from_be_bytes(bytes), offset + SIZE_INT16))
}

pub fn read_u32(buffer: &[u8], offset: usize) -> Result<(u32, usize), DecodeError> {
    let bytes = take_array::<SIZE_INT32>(buffer, offset)?;
    Ok((u32::from_be_bytes(bytes), offset + SIZE_INT32))
}

pub fn read_i32(buffer: &[u8], offset: usize) -> Result<(i32, usize), DecodeError> {
    let bytes = take_array::<SIZE_INT32>(buffer, offset)?;
    Ok((i32::from_be_bytes(bytes), offset + SIZE_INT32))
}

/// `u16` byte length followed by that many bytes of UTF-8.
///
/// A length running past the end of the buffer is `TruncatedBuffer`; bytes
/// that are present but not UTF-8 are `MalformedString`.
pub fn read_length_prefixed_string(
    buffer: &[u8],
    offset: usize,
) -> Result<(String, usize), DecodeError> {
    let (len, body_start) = read_u16(buffer, offset)?;
    let body = take(buffer, body_start, len as usize)?;
    let value = std::str::from_utf8(body).map_err(|e| DecodeError::MalformedString {
        offset,
        reason: e.to_string(),
    })?;
    Ok((value.to_owned(), body_start + len as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integers_big_endian() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0xFF, 0xFF, 0xFF, 0xFE];

        assert_eq!(read_u8(&buf, 0).unwrap(), (0x01, 1));
        assert_eq!(read_u16(&buf, 0).unwrap(), (0x0102, 2));
        assert_eq!(read_u32(&buf, 0).unwrap(), (0x0102_0304, 4));
        assert_eq!(read_i32(&buf, 4).unwrap(), (-2, 8));
        assert_eq!(read_u32(&buf, 4).unwrap(), (0xFFFF_FFFE, 8));
    }

    #[test]
    fn test_read_bool() {
        let buf = [0x00, 0x01, 0x7F];
        assert_eq!(read_bool(&buf, 0).unwrap(), (false, 1));
        assert_eq!(read_bool(&buf, 1).unwrap(), (true, 2));
        assert_eq!(read_bool(&buf, 2).unwrap(), (true, 3));
    }

    #[test]
    fn test_read_past_end_is_truncated() {
        let buf = [0x00, 0x01, 0x02];

        let err = read_u32(&buf, 0).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TruncatedBuffer {
                offset: 0,
                needed: 4,
                available: 3
            }
        );
        assert!(read_u8(&buf, 3).unwrap_err().is_truncated());
        assert!(read_u16(&buf, 2).unwrap_err().is_truncated());
        assert!(read_u8(&buf, usize::MAX).unwrap_err().is_truncated());
    }

    #[test]
    fn test_read_string() {
        let mut buf = vec![0x00, 0x05];
        buf.extend_from_slice(b"hello");
        buf.push(0xAA);

        let (value, next) = read_length_prefixed_string(&buf, 0).unwrap();
        assert_eq!(value, "hello");
        assert_eq!(next, 7);
    }

    #[test]
    fn test_read_string_length_is_bytes_not_chars() {
        let text = "Ça va ✓";
        let mut buf = (text.len() as u16).to_be_bytes().to_vec();
        buf.extend_from_slice(text.as_bytes());

        let (value, next) = read_length_prefixed_string(&buf, 0).unwrap();
        assert_eq!(value, text);
        assert_eq!(next, 2 + text.len());
    }

    #[test]
    fn test_read_empty_string() {
        let buf = [0x00, 0x00];
        assert_eq!(
            read_length_prefixed_string(&buf, 0).unwrap(),
            (String::new(), 2)
        );
    }

    #[test]
    fn test_read_string_declared_length_too_long() {
        let buf = [0x00, 0x0A, b'a', b'b'];
        let err = read_length_prefixed_string(&buf, 0).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn test_read_string_invalid_utf8() {
        let buf = [0x00, 0x02, 0xC3, 0x28];
        let err = read_length_prefixed_string(&buf, 0).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedString { offset: 0, .. }));
    }
}
