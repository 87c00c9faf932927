//! Error types for the Level II decoder.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for archive decoding.
///
/// Every variant is fatal to the decode of the current file. Conditions
/// that only warrant a diagnostic are reported as [`DecodeWarning`].
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// Malformed gzip envelope
    #[error("Malformed gzip stream: {0}")]
    Gzip(String),

    /// Malformed or truncated bzip2 block
    #[error("Bad bzip2 block at offset {offset}: {reason}")]
    Bzip2 { offset: u64, reason: String },

    /// Volume header does not start with `AR2V00`
    #[error("Invalid Level II archive: expected AR2V00 volume header")]
    BadMagic,

    /// Fewer bytes available than a fixed-size field requires
    #[error("Archive truncated at position {position}: {context}")]
    Truncated { context: &'static str, position: u64 },

    /// Metadata record of the wrong length
    #[error("Metadata record is {actual} bytes, expected {expected}")]
    MetadataSize { expected: usize, actual: usize },

    /// Message envelope could not be read, message boundaries are lost
    #[error("Bad message header at position {position}: {reason}")]
    BadMessageHeader { position: u64, reason: String },

    /// Moment block does not carry the expected tag
    #[error("Bad data block tag at position {position}: expected DREF, found {found:?}")]
    BadBlockTag { position: u64, found: String },

    /// Gate word size other than 8 bits
    #[error("Unsupported gate word size: {0} bits")]
    UnsupportedWordSize(u8),

    /// Decoded gate count differs from the block header
    #[error("Gate count mismatch: header declares {expected}, decoded {actual}")]
    GateCountMismatch { expected: usize, actual: usize },

    /// Nothing follows the metadata record
    #[error("Archive holds a header and metadata but no messages")]
    HeaderOnlyArchive,

    /// Elevation number outside the 0..=32 index
    #[error("Elevation index {0} out of range (max {max})", max = crate::level2::MAX_ELEVATION_INDEX)]
    ElevationOutOfRange(u8),

    /// Cursor repositioning outside the buffer
    #[error("Position {target} out of range (length {len})")]
    OutOfRange { target: i128, len: u64 },

    /// Message bookkeeping did not consume the buffer exactly
    #[error("Possibly corrupt archive: message stream stopped at {position} of {len} bytes")]
    PossiblyCorruptArchive { position: u64, len: u64 },

    /// Options file could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a truncation error.
    pub fn truncated(context: &'static str, position: u64) -> Self {
        Self::Truncated { context, position }
    }

    /// Create a bzip2 error for the block starting at `offset`.
    pub fn bzip2(offset: u64, reason: impl Into<String>) -> Self {
        Self::Bzip2 { offset, reason: reason.into() }
    }

    /// Whether the error comes from the decompression layer.
    pub fn is_compression(&self) -> bool {
        matches!(self, Self::Gzip(_) | Self::Bzip2 { .. })
    }
}

/// Result type alias for decoder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal conditions noticed while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// Message segment fields were not `1 / 1`; multi-segment messages are not reassembled.
    SegmentMismatch { position: u64, segments: u16, segment: u16 },
    /// A `BZh` signature without a usable length prefix; kept as literal bytes.
    UnframedBzip2Match { offset: u64 },
    /// A bzip2 stream ended before the declared block length.
    Bzip2TrailingBytes { offset: u64, declared: u64, consumed: u64 },
    /// The message loop did not end exactly at the end of the buffer.
    PossiblyCorruptArchive { position: u64, len: u64 },
}

impl std::fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SegmentMismatch { position, segments, segment } => write!(
                f,
                "message at {} is segment {} of {} (segments are not reassembled)",
                position, segment, segments
            ),
            Self::UnframedBzip2Match { offset } => {
                write!(f, "bzip2 signature at {} has no length prefix", offset)
            }
            Self::Bzip2TrailingBytes { offset, declared, consumed } => write!(
                f,
                "bzip2 block at {} declared {} bytes but its stream ended after {}",
                offset, declared, consumed
            ),
            Self::PossiblyCorruptArchive { position, len } => write!(
                f,
                "message stream stopped at {} of {} bytes",
                position, len
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::BadMagic;
        assert!(e.to_string().contains("AR2V00"));

        let e = Error::GateCountMismatch { expected: 5, actual: 3 };
        assert!(e.to_string().contains("5"));
        assert!(e.to_string().contains("3"));

        let e = Error::MetadataSize { expected: 325_888, actual: 10 };
        assert_eq!(e.to_string(), "Metadata record is 10 bytes, expected 325888");

        let e = Error::ElevationOutOfRange(40);
        assert!(e.to_string().contains("40"));
        assert!(e.to_string().contains("32"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_compression_kinds() {
        assert!(Error::Gzip("bad header".into()).is_compression());
        assert!(Error::bzip2(10, "eof").is_compression());
        assert!(!Error::HeaderOnlyArchive.is_compression());
    }

    #[test]
    fn test_warning_display() {
        let w = DecodeWarning::SegmentMismatch { position: 100, segments: 3, segment: 2 };
        assert!(w.to_string().contains("segment 2 of 3"));
    }
}
