use thiserror::Error;

/// Failure decoding a record from a decompressed buffer.
///
/// `TruncatedBuffer` is the normal end-of-data signal; the other two mean the
/// rest of the buffer can't be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("buffer truncated at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("unknown record kind {tag} at offset {offset}")]
    UnknownRecordKind { tag: u8, offset: usize },

    #[error("malformed string at offset {offset}: {reason}")]
    MalformedString { offset: usize, reason: String },
}

impl DecodeError {
    /// True for the benign "no more complete records" signal.
    pub fn is_truncated(&self) -> bool {
        matches!(self, DecodeError::TruncatedBuffer { .. })
    }

    pub fn is_unknown_kind(&self) -> bool {
        matches!(self, DecodeError::UnknownRecordKind { .. })
    }
}
