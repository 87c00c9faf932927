//! Level II archive layout constants.

/// Gzip member signature.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// bzip2 stream signature prefix; followed by a block-size digit `1`..=`9`.
pub const BZIP2_MAGIC: &[u8; 3] = b"BZh";

/// Size of the big-endian signed length that precedes each bzip2 block.
pub const BZIP2_LENGTH_PREFIX: usize = 4;

/// First six bytes of every volume header.
pub const VOLUME_MAGIC: &[u8; 6] = b"AR2V00";

/// Total size of the volume header.
pub const VOLUME_HEADER_SIZE: usize = 24;

/// Size of the metadata record that follows the volume header.
pub const METADATA_SIZE: usize = 325_888;

/// Transport padding in front of every message.
pub const MESSAGE_PADDING: usize = 12;

/// Size of the common message envelope (after the padding).
pub const MESSAGE_HEADER_SIZE: usize = 16;

/// Size field value announcing a 32-bit byte size in the segment fields.
pub const OVERSIZE_SENTINEL: u16 = 0xFFFF;

/// Digital radar data generic format.
pub const MSG_TYPE_DIGITAL_RADAR_DATA: u8 = 31;

/// Highest elevation index an archive may reference.
pub const MAX_ELEVATION_INDEX: u8 = 32;

/// Number of elevation slots in a volume (indices 0..=32).
pub const MAX_ELEVATIONS: usize = MAX_ELEVATION_INDEX as usize + 1;

/// Upper bound on data-block pointers in a message 31 header.
pub const MAX_DATA_BLOCKS: usize = 10;

/// Pointer slot of the reflectivity block (after VOL, ELV, RAD).
pub const REFLECTIVITY_POINTER_SLOT: usize = 3;

/// Pointer slots present in every message 31 (VOL, ELV, RAD, REF).
pub const FIXED_POINTER_COUNT: usize = REFLECTIVITY_POINTER_SLOT + 1;

/// Reflectivity moment block tag.
pub const TAG_REFLECTIVITY: &[u8; 4] = b"DREF";

/// Velocity moment block tag.
pub const TAG_VELOCITY: &[u8; 4] = b"DVEL";

/// Spectrum width moment block tag.
pub const TAG_SPECTRUM_WIDTH: &[u8; 4] = b"DSW ";

/// Gate code for a sample below the signal-to-noise threshold.
pub const GATE_BELOW_THRESHOLD: u8 = 0;

/// Gate code for a range-folded sample.
pub const GATE_RANGE_FOLDED: u8 = 1;

/// The only supported gate word size, in bits.
pub const SUPPORTED_WORD_SIZE: u8 = 8;

/// Fixed-point divisors for moment block fields.
pub const RANGE_SCALE: f32 = 1000.0;
pub const TOVER_SCALE: f32 = 10.0;
pub const SNR_SCALE: f32 = 8.0;

/// Check for a gzip signature at the start of `data`.
#[inline]
pub fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[..2] == GZIP_MAGIC
}

/// Check for a bzip2 stream signature (`BZh1`..`BZh9`) at the start of `data`.
#[inline]
pub fn is_bzip2_magic(data: &[u8]) -> bool {
    data.len() >= 4 && &data[..3] == BZIP2_MAGIC && (b'1'..=b'9').contains(&data[3])
}
