//! Message stream walking.
//!
//! Each message is `[12-byte padding][16-byte envelope][payload]`. The
//! envelope size (halfwords, or a 32-bit byte count behind the `0xFFFF`
//! sentinel) is the authoritative message boundary: the dispatcher always
//! resumes at `message_start + size_bytes`, however much the per-type
//! decoder consumed.

use super::cursor::ByteCursor;
use super::format::*;
use super::radial::decode_message31;
use crate::model::VolumeModel;
use crate::util::{DecodeWarning, Error, Integral, Result};

/// Common message envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Position of the envelope (after the padding).
    pub start: u64,
    /// Message size in bytes, envelope included.
    pub size_bytes: u64,
    pub channel: u8,
    pub msg_type: u8,
    /// `(segment count, segment number)`; absent for oversize messages.
    pub segments: Option<(u16, u16)>,
}

impl MessageHeader {
    /// Position where the next message's padding begins.
    #[inline]
    pub fn end(&self) -> u64 {
        self.start + self.size_bytes
    }

    /// Whether the segment fields describe a single-segment message.
    pub fn is_single_segment(&self) -> bool {
        self.segments.map_or(true, |s| s == (1, 1))
    }
}

/// Read the envelope at the cursor (the padding must already be skipped).
pub fn read_message_header(cursor: &mut ByteCursor) -> Result<MessageHeader> {
    let start = cursor.position();
    let size = envelope_field::<u16>(cursor, start)?;
    let channel = envelope_field::<u8>(cursor, start)?;
    let msg_type = envelope_field::<u8>(cursor, start)?;
    // sequence number, date, time
    cursor.read_exact(8, "message envelope").map_err(|_| bad_header(start, "envelope truncated"))?;

    let (size_bytes, segments) = if size == OVERSIZE_SENTINEL {
        let high = envelope_field::<u16>(cursor, start)?;
        let low = envelope_field::<u16>(cursor, start)?;
        ((u64::from(high) << 16) | u64::from(low), None)
    } else {
        let segments = envelope_field::<u16>(cursor, start)?;
        let segment = envelope_field::<u16>(cursor, start)?;
        (u64::from(size) * 2, Some((segments, segment)))
    };

    Ok(MessageHeader { start, size_bytes, channel, msg_type, segments })
}

/// Walk every message after the metadata record, decoding into `volume`.
///
/// Returns the number of messages visited.
#[tracing::instrument(skip_all, fields(start = cursor.position(), len = cursor.len()))]
pub fn dispatch_messages(cursor: &mut ByteCursor, volume: &mut VolumeModel) -> Result<usize> {
    let mut count = 0usize;

    while !cursor.at_end() {
        if cursor.remaining() < MESSAGE_PADDING {
            flag_trailing(cursor, volume);
            break;
        }
        cursor.skip(MESSAGE_PADDING as u64)?;

        let header = read_message_header(cursor)?;
        count += 1;
        volume.count_message(header.msg_type);

        if !header.is_single_segment() {
            if let Some((segments, segment)) = header.segments {
                tracing::warn!(position = header.start, segments, segment, "multi-segment message");
                volume.push_warning(DecodeWarning::SegmentMismatch {
                    position: header.start,
                    segments,
                    segment,
                });
            }
        }

        tracing::trace!(
            position = header.start,
            msg_type = header.msg_type,
            size = header.size_bytes,
            "message"
        );

        if header.size_bytes < MESSAGE_HEADER_SIZE as u64 {
            tracing::debug!(position = header.start, size = header.size_bytes, "message smaller than its envelope");
        }

        if header.msg_type == MSG_TYPE_DIGITAL_RADAR_DATA {
            decode_message31(cursor, volume)?;
        }

        if header.end() > cursor.len() {
            cursor.seek(cursor.len())?;
            tracing::warn!(position = header.start, end = header.end(), "message runs past end of archive");
            volume.push_warning(DecodeWarning::PossiblyCorruptArchive {
                position: header.start,
                len: cursor.len(),
            });
            break;
        }
        cursor.seek(header.end())?;
    }

    Ok(count)
}

fn flag_trailing(cursor: &ByteCursor, volume: &mut VolumeModel) {
    tracing::warn!(
        position = cursor.position(),
        trailing = cursor.remaining(),
        "trailing bytes after last message"
    );
    volume.push_warning(DecodeWarning::PossiblyCorruptArchive {
        position: cursor.position(),
        len: cursor.len(),
    });
}

fn envelope_field<T: Integral>(cursor: &mut ByteCursor, start: u64) -> Result<T> {
    cursor
        .read_integral::<T>()
        .map_err(|_| bad_header(start, "envelope truncated"))
}

fn bad_header(position: u64, reason: impl Into<String>) -> Error {
    Error::BadMessageHeader { position, reason: reason.into() }
}
