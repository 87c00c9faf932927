//! Synthetic Level II archive builder shared by the integration tests.

#![allow(dead_code)]

use std::io::Write;

use nexrad_level2::level2::{METADATA_SIZE, MESSAGE_PADDING};

pub const ICAO: &str = "KDIX";
/// 2024-05-17 as a modified Julian date (day 1 = 1970-01-01).
pub const DATE: u32 = 19861;
/// 02:52:06 UTC in milliseconds past midnight.
pub const TIME: u32 = 10_326_000;

pub const REF_SCALE: f32 = 2.0;
pub const REF_OFFSET: f32 = 66.0;

/// One radial to encode as a message 31.
#[derive(Debug, Clone)]
pub struct RadialSpec {
    pub elevation: u8,
    pub angle: f32,
    pub azimuth: f32,
    pub azimuth_index: u16,
    pub codes: Vec<u8>,
    pub with_reflectivity: bool,
    pub with_velocity: bool,
}

impl RadialSpec {
    pub fn new(elevation: u8, azimuth_index: u16, codes: Vec<u8>) -> Self {
        Self {
            elevation,
            angle: 0.5 + f32::from(elevation),
            azimuth: f32::from(azimuth_index) * 0.5,
            azimuth_index,
            codes,
            with_reflectivity: true,
            with_velocity: false,
        }
    }

    pub fn velocity(mut self) -> Self {
        self.with_velocity = true;
        self
    }

    pub fn no_reflectivity(mut self) -> Self {
        self.with_reflectivity = false;
        self
    }
}

/// 24-byte volume header.
pub fn volume_header(icao: &str) -> Vec<u8> {
    let mut bytes = b"AR2V0006.050".to_vec();
    bytes.extend_from_slice(&DATE.to_be_bytes());
    bytes.extend_from_slice(&TIME.to_be_bytes());
    bytes.extend_from_slice(&icao.as_bytes()[..4]);
    bytes
}

/// Metadata record with a recognizable fill pattern.
pub fn metadata() -> Vec<u8> {
    (0..METADATA_SIZE).map(|i| (i % 241) as u8).collect()
}

/// Message 31 payload (fixed header, pointer table, blocks).
pub fn message31_payload(spec: &RadialSpec) -> Vec<u8> {
    let mut blocks: Vec<(&[u8; 4], Vec<u8>)> = vec![(b"RVOL", vec![0; 40]), (b"RELV", vec![0; 8]), (b"RRAD", vec![0; 16])];
    if spec.with_reflectivity {
        blocks.push((b"DREF", reflectivity_block_body(&spec.codes)));
    }
    if spec.with_velocity {
        blocks.push((b"DVEL", vec![0; 24]));
    }

    // an empty slot 3 stays in the table when reflectivity is absent
    let slots = blocks.len() + usize::from(!spec.with_reflectivity);
    let header_len = 32 + 4 * slots;
    let mut pointers = Vec::new();
    let mut body = Vec::new();
    for (tag, content) in &blocks {
        pointers.push((header_len + body.len()) as u32);
        body.extend_from_slice(*tag);
        body.extend_from_slice(content);
    }
    if !spec.with_reflectivity {
        pointers.insert(3, 0);
    }

    let mut payload = Vec::new();
    payload.extend_from_slice(ICAO.as_bytes());
    payload.extend_from_slice(&TIME.to_be_bytes());
    payload.extend_from_slice(&(DATE as u16).to_be_bytes());
    payload.extend_from_slice(&spec.azimuth_index.to_be_bytes());
    payload.extend_from_slice(&spec.azimuth.to_be_bytes());
    payload.extend_from_slice(&[0, 0]);
    payload.extend_from_slice(&0u16.to_be_bytes());
    payload.push(1);
    payload.push(1);
    payload.push(spec.elevation);
    payload.push(0);
    payload.extend_from_slice(&spec.angle.to_be_bytes());
    payload.extend_from_slice(&[0, 0]);
    payload.extend_from_slice(&(pointers.len() as u16).to_be_bytes());
    for p in &pointers {
        payload.extend_from_slice(&p.to_be_bytes());
    }
    payload.extend(body);
    payload
}

/// Reflectivity block after its `DREF` tag.
fn reflectivity_block_body(codes: &[u8]) -> Vec<u8> {
    let mut b = vec![0; 4];
    b.extend_from_slice(&(codes.len() as u16).to_be_bytes());
    b.extend_from_slice(&2125u16.to_be_bytes());
    b.extend_from_slice(&250u16.to_be_bytes());
    b.extend_from_slice(&50i16.to_be_bytes());
    b.extend_from_slice(&16i16.to_be_bytes());
    b.push(0);
    b.push(8);
    b.extend_from_slice(&REF_SCALE.to_be_bytes());
    b.extend_from_slice(&REF_OFFSET.to_be_bytes());
    b.extend_from_slice(codes);
    b
}

/// Padding + envelope + payload, with the given segment fields.
pub fn message(msg_type: u8, payload: &[u8], segments: (u16, u16)) -> Vec<u8> {
    let mut size = 16 + payload.len();
    size += size % 2;

    let mut b = vec![0u8; MESSAGE_PADDING];
    b.extend_from_slice(&((size / 2) as u16).to_be_bytes());
    b.push(0);
    b.push(msg_type);
    b.extend_from_slice(&[0; 8]);
    b.extend_from_slice(&segments.0.to_be_bytes());
    b.extend_from_slice(&segments.1.to_be_bytes());
    b.extend_from_slice(payload);
    b.resize(MESSAGE_PADDING + size, 0);
    b
}

/// Message using the `0xFFFF` size sentinel and a 32-bit byte size.
pub fn oversize_message(msg_type: u8, payload: &[u8]) -> Vec<u8> {
    let size = 16 + payload.len();
    let mut b = vec![0u8; MESSAGE_PADDING];
    b.extend_from_slice(&0xFFFFu16.to_be_bytes());
    b.push(0);
    b.push(msg_type);
    b.extend_from_slice(&[0; 8]);
    b.extend_from_slice(&((size >> 16) as u16).to_be_bytes());
    b.extend_from_slice(&((size & 0xFFFF) as u16).to_be_bytes());
    b.extend_from_slice(payload);
    b
}

/// Builds the decompressed logical stream of an archive.
pub struct ArchiveBuilder {
    stream: Vec<u8>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        let mut stream = volume_header(ICAO);
        stream.extend(metadata());
        Self { stream }
    }

    pub fn radial(mut self, spec: &RadialSpec) -> Self {
        self.stream.extend(message(31, &message31_payload(spec), (1, 1)));
        self
    }

    pub fn message(mut self, msg_type: u8, payload_len: usize) -> Self {
        self.stream.extend(message(msg_type, &vec![0x5A; payload_len], (1, 1)));
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.stream.extend_from_slice(bytes);
        self
    }

    /// A plain volume: two elevations, a status message in between.
    pub fn sample() -> Self {
        Self::new()
            .radial(&RadialSpec::new(1, 1, vec![0, 1, 2, 66, 255]).velocity())
            .radial(&RadialSpec::new(1, 2, vec![100; 8]))
            .message(2, 52)
            .radial(&RadialSpec::new(3, 1, vec![130; 12]).velocity())
    }

    pub fn build(self) -> Vec<u8> {
        self.stream
    }
}

pub fn bz(data: &[u8]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::best());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn gz(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Frame everything after the volume header as length-prefixed bzip2
/// blocks of `chunk` bytes. The last block gets a negative length.
pub fn bzip2_blocks(plain: &[u8], chunk: usize) -> Vec<u8> {
    let mut out = plain[..24].to_vec();
    let chunks: Vec<&[u8]> = plain[24..].chunks(chunk).collect();
    for (i, c) in chunks.iter().enumerate() {
        let block = bz(c);
        let len = block.len() as i32;
        let len = if i + 1 == chunks.len() { -len } else { len };
        out.extend_from_slice(&len.to_be_bytes());
        out.extend(block);
    }
    out
}

/// Write bytes to a named temp file.
pub fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}
