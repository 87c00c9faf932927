//! Layered decompression of Level II archives.
//!
//! An archive may be wrapped in a whole-file gzip envelope, and its logical
//! stream may be split into independently bzip2-compressed blocks, each
//! preceded by a big-endian signed 32-bit length. There is no block table:
//! blocks are found by scanning for the `BZh1`..`BZh9` signature. Blocks are
//! indexed first, decoded independently (optionally on the rayon pool), then
//! spliced together with the literal bytes between them.

use std::borrow::Cow;
use std::io::Read;
use std::ops::Range;
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use rayon::prelude::*;

use super::options::DecodeOptions;
use super::source::Source;
use crate::level2::{is_bzip2_magic, is_gzip, BZIP2_LENGTH_PREFIX};
use crate::util::{DecodeWarning, Error, Result};

/// Output of the decompression stage.
#[derive(Debug, Clone, Default)]
pub struct Decompressed {
    /// Fully reconstructed logical stream.
    pub data: Vec<u8>,
    /// Number of bzip2 blocks spliced in.
    pub blocks: usize,
    pub warnings: Vec<DecodeWarning>,
}

/// A piece of the (gzip-inflated) input, in stream order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Bytes copied through unchanged.
    Literal(Range<usize>),
    /// A bzip2 stream; `prefix_offset` is where its length prefix starts.
    Block { prefix_offset: usize, range: Range<usize> },
}

impl Segment {
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block { .. })
    }
}

/// Decompress an archive file.
///
/// With `try_gzip`, a gzip envelope is inflated when the file starts with the
/// gzip magic; other files pass through unchanged. With `try_bzip2`, embedded
/// bzip2 blocks are located and spliced.
pub fn decompress(path: impl AsRef<Path>, try_gzip: bool, try_bzip2: bool) -> Result<Decompressed> {
    let source = Source::open(path)?;
    let options = DecodeOptions::default().with_gzip(try_gzip).with_bzip2(try_bzip2);
    decompress_bytes(&source, &options)
}

/// Decompress archive bytes already in memory.
#[tracing::instrument(skip_all, fields(len = raw.len(), gzip = options.gzip, bzip2 = options.bzip2))]
pub fn decompress_bytes(raw: &[u8], options: &DecodeOptions) -> Result<Decompressed> {
    let inflated: Cow<'_, [u8]> = if options.gzip && is_gzip(raw) {
        Cow::Owned(inflate_gzip(raw)?)
    } else {
        Cow::Borrowed(raw)
    };

    if !options.bzip2 {
        return Ok(Decompressed { data: inflated.into_owned(), ..Default::default() });
    }

    splice_bzip2_blocks(&inflated, options.parallel)
}

/// Inflate a single gzip member.
pub fn inflate_gzip(raw: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(raw);
    let mut out = Vec::with_capacity(raw.len().saturating_mul(4));
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::Gzip(e.to_string()))?;
    tracing::debug!(compressed = raw.len(), inflated = out.len(), "gzip envelope");
    Ok(out)
}

/// Locate every length-prefixed bzip2 block in `data`.
///
/// Signatures with no room for a length prefix, or with a zero prefix, stay
/// literal and are reported in `warnings`. The scan resumes right after each
/// block's declared length.
pub fn index_bzip2_blocks(data: &[u8], warnings: &mut Vec<DecodeWarning>) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal_start = 0usize;
    let mut scan = 0usize;

    while let Some(rel) = find_bzip2_magic(&data[scan..]) {
        let magic = scan + rel;

        let length = if magic >= literal_start + BZIP2_LENGTH_PREFIX {
            let prefix = &data[magic - BZIP2_LENGTH_PREFIX..magic];
            i32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]).unsigned_abs() as usize
        } else {
            0
        };

        if length == 0 {
            tracing::warn!(offset = magic, "bzip2 signature without length prefix");
            warnings.push(DecodeWarning::UnframedBzip2Match { offset: magic as u64 });
            scan = magic + 1;
            continue;
        }

        let end = magic
            .checked_add(length)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                Error::bzip2(
                    magic as u64,
                    format!("block of {} bytes runs past end of stream ({} bytes)", length, data.len()),
                )
            })?;

        let prefix_offset = magic - BZIP2_LENGTH_PREFIX;
        if prefix_offset > literal_start {
            segments.push(Segment::Literal(literal_start..prefix_offset));
        }
        segments.push(Segment::Block { prefix_offset, range: magic..end });

        scan = end;
        literal_start = end;
    }

    if literal_start < data.len() {
        segments.push(Segment::Literal(literal_start..data.len()));
    }
    Ok(segments)
}

/// Decode one bzip2 block of `data`.
///
/// Returns the decompressed bytes and, when the stream ended before the
/// declared length, a trailing-bytes warning.
pub fn decompress_block(data: &[u8], range: Range<usize>) -> Result<(Vec<u8>, Option<DecodeWarning>)> {
    let offset = range.start as u64;
    let input = &data[range];

    let mut decoder = BzDecoder::new(input);
    let mut out = Vec::with_capacity(input.len().saturating_mul(8));
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::bzip2(offset, e.to_string()))?;

    if decoder.total_out() != out.len() as u64 {
        return Err(Error::bzip2(
            offset,
            format!("decoder reported {} bytes, produced {}", decoder.total_out(), out.len()),
        ));
    }

    let consumed = decoder.total_in();
    let declared = input.len() as u64;
    let warning = (consumed < declared).then(|| {
        tracing::warn!(offset, declared, consumed, "bzip2 stream ended before declared length");
        DecodeWarning::Bzip2TrailingBytes { offset, declared, consumed }
    });

    tracing::debug!(offset, compressed = declared, decompressed = out.len(), "bzip2 block");
    Ok((out, warning))
}

/// Replace every embedded bzip2 block of `data` with its decompressed bytes.
#[tracing::instrument(skip_all, fields(len = data.len(), parallel = parallel))]
pub fn splice_bzip2_blocks(data: &[u8], parallel: bool) -> Result<Decompressed> {
    let mut warnings = Vec::new();
    let segments = index_bzip2_blocks(data, &mut warnings)?;
    let blocks = segments.iter().filter(|s| s.is_block()).count();

    let pieces: Vec<Piece<'_>> = if parallel && blocks > 1 {
        segments
            .par_iter()
            .map(|segment| decode_segment(data, segment))
            .collect::<Result<_>>()?
    } else {
        segments
            .iter()
            .map(|segment| decode_segment(data, segment))
            .collect::<Result<_>>()?
    };

    let total: usize = pieces.iter().map(|(bytes, _)| bytes.len()).sum();
    let mut out = Vec::with_capacity(total);
    for (bytes, warning) in pieces {
        out.extend_from_slice(&bytes);
        warnings.extend(warning);
    }

    tracing::debug!(blocks, input = data.len(), output = out.len(), "spliced bzip2 blocks");
    Ok(Decompressed { data: out, blocks, warnings })
}

type Piece<'a> = (Cow<'a, [u8]>, Option<DecodeWarning>);

fn decode_segment<'a>(data: &'a [u8], segment: &Segment) -> Result<Piece<'a>> {
    match segment {
        Segment::Literal(range) => Ok((Cow::Borrowed(&data[range.clone()]), None)),
        Segment::Block { range, .. } => {
            let (bytes, warning) = decompress_block(data, range.clone())?;
            Ok((Cow::Owned(bytes), warning))
        }
    }
}

fn find_bzip2_magic(data: &[u8]) -> Option<usize> {
    data.windows(4).position(is_bzip2_magic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn bz(data: &[u8]) -> Vec<u8> {
        let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::best());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn gz(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn framed(block: &[u8], negative: bool) -> Vec<u8> {
        let len = if negative { -(block.len() as i32) } else { block.len() as i32 };
        let mut out = len.to_be_bytes().to_vec();
        out.extend_from_slice(block);
        out
    }

    fn blocked_stream() -> (Vec<u8>, Vec<u8>) {
        let first = b"metadata record contents ".repeat(40);
        let second = b"radial messages ".repeat(64);
        let mut raw = b"AR2V0006.050".to_vec();
        raw.extend(framed(&bz(&first), false));
        raw.extend(framed(&bz(&second), true));

        let mut expected = b"AR2V0006.050".to_vec();
        expected.extend_from_slice(&first);
        expected.extend_from_slice(&second);
        (raw, expected)
    }

    #[test]
    fn test_no_blocks_passes_through() {
        let raw = b"AR2V0006.050 plain archive bytes".to_vec();
        let out = splice_bzip2_blocks(&raw, true).unwrap();
        assert_eq!(out.data, raw);
        assert_eq!(out.blocks, 0);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_index_segments() {
        let block = bz(b"hello");
        let mut raw = b"head".to_vec();
        raw.extend(framed(&block, false));
        raw.extend_from_slice(b"tail");

        let segments = index_bzip2_blocks(&raw, &mut Vec::new()).unwrap();
        let magic = 4 + BZIP2_LENGTH_PREFIX;
        assert_eq!(
            segments,
            vec![
                Segment::Literal(0..4),
                Segment::Block { prefix_offset: 4, range: magic..magic + block.len() },
                Segment::Literal(magic + block.len()..raw.len()),
            ]
        );
    }

    #[test]
    fn test_splice_blocks() {
        let (raw, expected) = blocked_stream();
        for parallel in [true, false] {
            let out = splice_bzip2_blocks(&raw, parallel).unwrap();
            assert_eq!(out.data, expected);
            assert_eq!(out.blocks, 2);
            assert!(out.warnings.is_empty());
        }
    }

    #[test]
    fn test_unframed_signature_is_literal() {
        // No room for a prefix in front of the signature
        let raw = b"xBZh9 and more".to_vec();
        let out = splice_bzip2_blocks(&raw, false).unwrap();
        assert_eq!(out.data, raw);
        assert_eq!(out.warnings, vec![DecodeWarning::UnframedBzip2Match { offset: 1 }]);

        // Zero-length prefix
        let mut raw = vec![0, 0, 0, 0];
        raw.extend_from_slice(b"BZh5");
        let out = splice_bzip2_blocks(&raw, false).unwrap();
        assert_eq!(out.data, raw);
        assert_eq!(out.blocks, 0);
    }

    #[test]
    fn test_block_past_end() {
        let block = bz(b"some data");
        let mut raw = ((block.len() + 10) as i32).to_be_bytes().to_vec();
        raw.extend_from_slice(&block);
        let err = splice_bzip2_blocks(&raw, false).unwrap_err();
        assert!(matches!(err, Error::Bzip2 { offset: 4, .. }));
    }

    #[test]
    fn test_corrupt_block() {
        let mut block = bz(&b"corrupt me ".repeat(100));
        let mid = block.len() / 2;
        for b in &mut block[mid..mid + 8] {
            *b ^= 0xFF;
        }
        let raw = framed(&block, false);
        assert!(splice_bzip2_blocks(&raw, false).unwrap_err().is_compression());
    }

    #[test]
    fn test_trailing_bytes_in_block() {
        let mut block = bz(b"payload");
        let stream_len = block.len() as u64;
        block.extend_from_slice(&[0, 0, 0]);
        let raw = framed(&block, false);

        let out = splice_bzip2_blocks(&raw, false).unwrap();
        assert_eq!(out.data, b"payload");
        assert_eq!(
            out.warnings,
            vec![DecodeWarning::Bzip2TrailingBytes { offset: 4, declared: stream_len + 3, consumed: stream_len }]
        );
    }

    #[test]
    fn test_gzip_round_trip() {
        let (raw, expected) = blocked_stream();
        let wrapped = gz(&raw);

        let out = decompress_bytes(&wrapped, &DecodeOptions::default()).unwrap();
        assert_eq!(out.data, expected);

        let inflated_only = decompress_bytes(&wrapped, &DecodeOptions::default().with_bzip2(false)).unwrap();
        assert_eq!(inflated_only.data, raw);

        let untouched = decompress_bytes(&wrapped, &DecodeOptions::default().with_gzip(false).with_bzip2(false)).unwrap();
        assert_eq!(untouched.data, wrapped);
    }

    #[test]
    fn test_non_gzip_passes_through() {
        let raw = b"AR2V0006.050 not gzip".to_vec();
        let out = decompress_bytes(&raw, &DecodeOptions::default().with_bzip2(false)).unwrap();
        assert_eq!(out.data, raw);
    }

    #[test]
    fn test_corrupt_gzip() {
        let mut wrapped = gz(&b"abc".repeat(1000));
        wrapped.truncate(wrapped.len() / 2);
        assert!(matches!(
            decompress_bytes(&wrapped, &DecodeOptions::default()),
            Err(Error::Gzip(_))
        ));
    }
}
