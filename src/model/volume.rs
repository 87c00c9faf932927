//! Volume-level model: header, metadata and the elevation index.

use std::collections::BTreeMap;

use serde::Serialize;
use time::{Duration, OffsetDateTime};

use super::Radial;
use crate::level2::{MAX_ELEVATIONS, MAX_ELEVATION_INDEX, METADATA_SIZE};
use crate::util::{DecodeWarning, Error, Result};

/// Fixed 24-byte volume header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeHeader {
    /// Archive format version (e.g. 6 for `AR2V0006`).
    pub version: u8,
    /// Volume extension number, rolls over after 999.
    pub extension_num: u16,
    /// Modified Julian date (day 1 = 1970-01-01).
    pub date: u32,
    /// Milliseconds past midnight.
    pub time: u32,
    /// Four-letter radar site identifier.
    pub icao: String,
}

impl VolumeHeader {
    /// Volume start as a UTC timestamp.
    pub fn date_time(&self) -> Option<OffsetDateTime> {
        let days = i64::from(self.date).checked_sub(1)?;
        OffsetDateTime::UNIX_EPOCH
            .checked_add(Duration::days(days))?
            .checked_add(Duration::milliseconds(i64::from(self.time)))
    }
}

/// Opaque metadata record, exactly [`METADATA_SIZE`] bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct MetadataBlob(Box<[u8]>);

impl MetadataBlob {
    /// Wrap a metadata record. Fails unless it has the exact record size.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() != METADATA_SIZE {
            return Err(Error::MetadataSize {
                expected: METADATA_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes.into_boxed_slice()))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for MetadataBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MetadataBlob({} bytes)", self.0.len())
    }
}

/// One elevation cut and its radials in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Elevation {
    pub index: u8,
    /// Elevation angle (degrees), from the most recent radial.
    pub angle: f32,
    pub radials: Vec<Radial>,
}

impl Elevation {
    pub fn new(index: u8) -> Self {
        Self { index, angle: 0.0, radials: Vec::new() }
    }

    #[inline]
    pub fn radial_count(&self) -> usize {
        self.radials.len()
    }

    /// Largest reflectivity gate count among the radials.
    pub fn max_gates(&self) -> usize {
        self.radials
            .iter()
            .map(|r| r.reflectivity_gates().len())
            .max()
            .unwrap_or(0)
    }
}

/// Result of decoding one archive file.
#[derive(Debug, Clone)]
pub struct VolumeModel {
    header: VolumeHeader,
    metadata: MetadataBlob,
    elevations: Vec<Option<Elevation>>,
    message_counts: BTreeMap<u8, usize>,
    decompressed_len: u64,
    bzip2_blocks: usize,
    warnings: Vec<DecodeWarning>,
}

impl VolumeModel {
    /// Create an empty volume for a parsed header and metadata record.
    pub fn new(header: VolumeHeader, metadata: MetadataBlob) -> Self {
        Self {
            header,
            metadata,
            elevations: vec![None; MAX_ELEVATIONS],
            message_counts: BTreeMap::new(),
            decompressed_len: 0,
            bzip2_blocks: 0,
            warnings: Vec::new(),
        }
    }

    #[inline]
    pub fn header(&self) -> &VolumeHeader {
        &self.header
    }

    #[inline]
    pub fn metadata(&self) -> &MetadataBlob {
        &self.metadata
    }

    /// Elevation at `index`, if any message referenced it.
    pub fn elevation(&self, index: u8) -> Option<&Elevation> {
        self.elevations.get(index as usize).and_then(Option::as_ref)
    }

    /// Present elevations in ascending index order.
    pub fn elevations(&self) -> impl Iterator<Item = &Elevation> + '_ {
        self.elevations.iter().flatten()
    }

    /// Number of elevations referenced by at least one radial.
    pub fn elevation_count(&self) -> usize {
        self.elevations().count()
    }

    /// Total radials across all elevations.
    pub fn radial_count(&self) -> usize {
        self.elevations().map(Elevation::radial_count).sum()
    }

    /// Messages seen per message type.
    pub fn message_counts(&self) -> &BTreeMap<u8, usize> {
        &self.message_counts
    }

    pub fn message_count(&self, msg_type: u8) -> usize {
        self.message_counts.get(&msg_type).copied().unwrap_or(0)
    }

    /// Length of the decompressed stream the volume was decoded from.
    #[inline]
    pub fn decompressed_len(&self) -> u64 {
        self.decompressed_len
    }

    /// Number of bzip2 blocks spliced during decompression.
    #[inline]
    pub fn bzip2_blocks(&self) -> usize {
        self.bzip2_blocks
    }

    #[inline]
    pub fn warnings(&self) -> &[DecodeWarning] {
        &self.warnings
    }

    /// Fail with [`Error::PossiblyCorruptArchive`] when the message stream
    /// did not consume the decompressed buffer exactly.
    pub fn check_integrity(&self) -> Result<()> {
        match self.warnings.iter().find_map(|w| match w {
            DecodeWarning::PossiblyCorruptArchive { position, len } => Some((*position, *len)),
            _ => None,
        }) {
            Some((position, len)) => Err(Error::PossiblyCorruptArchive { position, len }),
            None => Ok(()),
        }
    }

    /// Look up or lazily create the elevation at `index`.
    pub(crate) fn elevation_entry(&mut self, index: u8) -> Result<&mut Elevation> {
        if index > MAX_ELEVATION_INDEX {
            return Err(Error::ElevationOutOfRange(index));
        }
        Ok(self.elevations[index as usize].get_or_insert_with(|| Elevation::new(index)))
    }

    pub(crate) fn count_message(&mut self, msg_type: u8) {
        *self.message_counts.entry(msg_type).or_insert(0) += 1;
    }

    pub(crate) fn push_warning(&mut self, warning: DecodeWarning) {
        self.warnings.push(warning);
    }

    pub(crate) fn set_source_stats(&mut self, decompressed_len: u64, bzip2_blocks: usize) {
        self.decompressed_len = decompressed_len;
        self.bzip2_blocks = bzip2_blocks;
    }
}
