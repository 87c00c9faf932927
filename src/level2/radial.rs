//! Message 31 (digital radar data) decoding.
//!
//! A message 31 payload starts with a fixed header holding the azimuth,
//! elevation and a table of data-block pointers. Pointers are byte offsets
//! relative to the start of that header; each moment block begins with a
//! four-character tag such as `DREF`.

use smallvec::SmallVec;

use super::cursor::ByteCursor;
use super::format::*;
use crate::model::{MomentData, MomentKind, Radial, VolumeModel};
use crate::util::{Error, Integral, Result};

const HEADER_CONTEXT: &str = "message 31 header";
const BLOCK_CONTEXT: &str = "reflectivity block";

/// Fields of the fixed message 31 header.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialHeader {
    pub collection_time: u32,
    pub collection_date: u16,
    pub azimuth_index: u16,
    pub azimuth: f32,
    pub radial_length: u16,
    pub azimuth_spacing: u8,
    pub radial_status: u8,
    pub elevation_index: u8,
    pub elevation_angle: f32,
    pub data_block_count: u16,
    pub pointers: SmallVec<[u32; MAX_DATA_BLOCKS]>,
}

/// Decode one message 31 payload at the cursor into `volume`.
///
/// The radial is appended to its elevation (created on first reference)
/// together with its decoded reflectivity moment.
pub fn decode_message31(cursor: &mut ByteCursor, volume: &mut VolumeModel) -> Result<()> {
    let base = cursor.position();
    let header = read_radial_header(cursor)?;

    let mut velocity_ptr = None;
    let mut spectrum_width_ptr = None;
    for &ptr in header.pointers.iter().skip(FIXED_POINTER_COUNT) {
        match peek_tag(cursor, base, ptr).and_then(MomentKind::from_tag) {
            Some(MomentKind::Velocity) => velocity_ptr = Some(ptr),
            Some(MomentKind::SpectrumWidth) => spectrum_width_ptr = Some(ptr),
            _ => {}
        }
    }

    let elevation = volume.elevation_entry(header.elevation_index)?;
    elevation.angle = header.elevation_angle;

    let reflectivity = decode_reflectivity(cursor, base, header.pointers[REFLECTIVITY_POINTER_SLOT])?;
    let radial = Radial {
        azimuth: header.azimuth,
        azimuth_index: header.azimuth_index,
        collection_time: header.collection_time,
        collection_date: header.collection_date,
        azimuth_spacing: header.azimuth_spacing,
        radial_status: header.radial_status,
        radial_length: header.radial_length,
        data_block_count: header.data_block_count,
        pointers: header.pointers,
        velocity_ptr,
        spectrum_width_ptr,
        reflectivity,
    };

    tracing::trace!(
        elevation = header.elevation_index,
        azimuth = radial.azimuth,
        gates = radial.reflectivity.num_gates,
        "radial"
    );
    elevation.radials.push(radial);
    Ok(())
}

/// Read the fixed message 31 header, leaving the cursor after the pointer table.
///
/// The VOL, ELV, RAD and REF pointers are always read. Further slots are
/// read only as far as the declared block count reaches.
pub fn read_radial_header(cursor: &mut ByteCursor) -> Result<RadialHeader> {
    // radar identifier
    skip(cursor, 4)?;
    let collection_time = field::<u32>(cursor)?;
    let collection_date = field::<u16>(cursor)?;
    let azimuth_index = field::<u16>(cursor)?;
    let azimuth = float(cursor)?;
    // compression indicator, spare
    skip(cursor, 2)?;
    let radial_length = field::<u16>(cursor)?;
    let azimuth_spacing = field::<u8>(cursor)?;
    let radial_status = field::<u8>(cursor)?;
    let elevation_index = field::<u8>(cursor)?;
    // cut sector number
    skip(cursor, 1)?;
    let elevation_angle = float(cursor)?;
    // spot blanking, azimuth indexing mode
    skip(cursor, 2)?;
    let data_block_count = field::<u16>(cursor)?;

    let slots = (data_block_count as usize)
        .min(MAX_DATA_BLOCKS)
        .max(FIXED_POINTER_COUNT);
    let mut pointers = SmallVec::new();
    for _ in 0..slots {
        pointers.push(field::<u32>(cursor)?);
    }

    Ok(RadialHeader {
        collection_time,
        collection_date,
        azimuth_index,
        azimuth,
        radial_length,
        azimuth_spacing,
        radial_status,
        elevation_index,
        elevation_angle,
        data_block_count,
        pointers,
    })
}

/// Decode the reflectivity block at `base + ptr`.
pub fn decode_reflectivity(cursor: &mut ByteCursor, base: u64, ptr: u32) -> Result<MomentData> {
    cursor
        .seek_relative(base, u64::from(ptr))
        .map_err(|_| Error::truncated("reflectivity block pointer", base + u64::from(ptr)))?;

    let tag_position = cursor.position();
    let tag: [u8; 4] = cursor.read_array(BLOCK_CONTEXT)?;
    if &tag != TAG_REFLECTIVITY {
        return Err(Error::BadBlockTag {
            position: tag_position,
            found: String::from_utf8_lossy(&tag).into_owned(),
        });
    }

    // reserved
    cursor.read_exact(4, BLOCK_CONTEXT)?;
    let num_gates = block_field::<u16>(cursor)?;
    let first_gate = block_field::<u16>(cursor)?;
    let gate_interval = block_field::<u16>(cursor)?;
    let tover = block_field::<i16>(cursor)?;
    let snr_threshold = block_field::<i16>(cursor)?;
    let control_flags = block_field::<u8>(cursor)?;
    let word_size = block_field::<u8>(cursor)?;
    if word_size != SUPPORTED_WORD_SIZE {
        return Err(Error::UnsupportedWordSize(word_size));
    }
    let scale = block_float(cursor)?;
    let offset = block_float(cursor)?;

    let codes = cursor.read_exact(num_gates as usize, "reflectivity gates")?;
    let data: Vec<f32> = codes
        .iter()
        .map(|&code| MomentData::decode_gate(code, scale, offset))
        .collect();
    if data.len() != num_gates as usize {
        return Err(Error::GateCountMismatch {
            expected: num_gates as usize,
            actual: data.len(),
        });
    }

    Ok(MomentData {
        kind: MomentKind::Reflectivity,
        num_gates,
        first_gate_km: f32::from(first_gate) / RANGE_SCALE,
        gate_interval_km: f32::from(gate_interval) / RANGE_SCALE,
        tover: f32::from(tover) / TOVER_SCALE,
        snr_threshold: f32::from(snr_threshold) / SNR_SCALE,
        control_flags,
        word_size,
        scale,
        offset,
        data,
    })
}

fn peek_tag(cursor: &ByteCursor, base: u64, ptr: u32) -> Option<&[u8]> {
    if ptr == 0 {
        return None;
    }
    cursor.peek_at(base + u64::from(ptr), 4)
}

fn skip(cursor: &mut ByteCursor, n: usize) -> Result<()> {
    cursor.read_exact(n, HEADER_CONTEXT).map(|_| ())
}

fn field<T: Integral>(cursor: &mut ByteCursor) -> Result<T> {
    let position = cursor.position();
    cursor
        .read_integral::<T>()
        .map_err(|_| Error::truncated(HEADER_CONTEXT, position))
}

fn float(cursor: &mut ByteCursor) -> Result<f32> {
    let position = cursor.position();
    cursor
        .read_float()
        .map_err(|_| Error::truncated(HEADER_CONTEXT, position))
}

fn block_field<T: Integral>(cursor: &mut ByteCursor) -> Result<T> {
    let position = cursor.position();
    cursor
        .read_integral::<T>()
        .map_err(|_| Error::truncated(BLOCK_CONTEXT, position))
}

fn block_float(cursor: &mut ByteCursor) -> Result<f32> {
    let position = cursor.position();
    cursor
        .read_float()
        .map_err(|_| Error::truncated(BLOCK_CONTEXT, position))
}
