//! Volume header and metadata record decoding.

use super::cursor::ByteCursor;
use super::format::*;
use crate::model::{MetadataBlob, VolumeHeader};
use crate::util::{Error, Integral, Result};

const HEADER_CONTEXT: &str = "volume header";

/// Parse the 24-byte volume header at the cursor.
///
/// Layout: `AR2V00` + 2-digit version + `.` + 3-digit extension number +
/// date (u32) + time (u32) + 4-character site identifier.
pub fn decode_volume_header(cursor: &mut ByteCursor) -> Result<VolumeHeader> {
    let magic: [u8; 6] = cursor.read_array(HEADER_CONTEXT)?;
    if &magic != VOLUME_MAGIC {
        return Err(Error::BadMagic);
    }

    let version: [u8; 2] = cursor.read_array(HEADER_CONTEXT)?;
    let version = parse_ascii_decimal(&version).ok_or(Error::BadMagic)?;
    // '.' separator
    cursor.read_exact(1, HEADER_CONTEXT)?;
    let extension: [u8; 3] = cursor.read_array(HEADER_CONTEXT)?;
    let extension_num = parse_ascii_decimal(&extension).ok_or(Error::BadMagic)?;

    let date = read_field::<u32>(cursor)?;
    let time = read_field::<u32>(cursor)?;
    let icao: [u8; 4] = cursor.read_array(HEADER_CONTEXT)?;
    let icao = String::from_utf8_lossy(&icao)
        .trim_end_matches(['\0', ' '])
        .to_string();

    let header = VolumeHeader {
        version: u8::try_from(version).map_err(|_| Error::BadMagic)?,
        extension_num: extension_num as u16,
        date,
        time,
        icao,
    };
    tracing::debug!(
        version = header.version,
        extension = header.extension_num,
        icao = %header.icao,
        "volume header"
    );
    Ok(header)
}

/// Copy the fixed-size metadata record that follows the volume header.
pub fn read_metadata(cursor: &mut ByteCursor) -> Result<MetadataBlob> {
    let bytes = cursor.read_exact(METADATA_SIZE, "archive ends inside metadata record")?;
    MetadataBlob::new(bytes.to_vec())
}

fn read_field<T: Integral>(cursor: &mut ByteCursor) -> Result<T> {
    let position = cursor.position();
    cursor
        .read_integral::<T>()
        .map_err(|_| Error::truncated(HEADER_CONTEXT, position))
}

fn parse_ascii_decimal(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(bytes).ok()?.parse().ok()
}
