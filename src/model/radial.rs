//! Radials and per-gate moment data.

use serde::Serialize;
use smallvec::SmallVec;

use crate::level2::{
    GATE_BELOW_THRESHOLD, GATE_RANGE_FOLDED, MAX_DATA_BLOCKS, REFLECTIVITY_POINTER_SLOT,
    TAG_REFLECTIVITY, TAG_SPECTRUM_WIDTH, TAG_VELOCITY,
};

/// Radar moment carried by a data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MomentKind {
    Reflectivity,
    Velocity,
    SpectrumWidth,
}

impl MomentKind {
    /// Map a moment block tag to its kind.
    pub fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            t if t == TAG_REFLECTIVITY => Some(Self::Reflectivity),
            t if t == TAG_VELOCITY => Some(Self::Velocity),
            t if t == TAG_SPECTRUM_WIDTH => Some(Self::SpectrumWidth),
            _ => None,
        }
    }

    /// Block tag for this kind.
    pub fn tag(self) -> &'static [u8; 4] {
        match self {
            Self::Reflectivity => TAG_REFLECTIVITY,
            Self::Velocity => TAG_VELOCITY,
            Self::SpectrumWidth => TAG_SPECTRUM_WIDTH,
        }
    }
}

/// One decoded moment along a radial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MomentData {
    pub kind: MomentKind,
    pub num_gates: u16,
    /// Range to the center of the first gate (km).
    pub first_gate_km: f32,
    /// Gate spacing (km).
    pub gate_interval_km: f32,
    /// Threshold parameter TOVER (dB).
    pub tover: f32,
    /// Signal-to-noise threshold (dB).
    pub snr_threshold: f32,
    pub control_flags: u8,
    /// Bits per gate.
    pub word_size: u8,
    pub scale: f32,
    pub offset: f32,
    /// Physical values, one per gate, in increasing range.
    pub data: Vec<f32>,
}

impl MomentData {
    /// Convert a recorded gate code to its physical value.
    ///
    /// Codes 0 (below threshold) and 1 (range folded) decode to `0.0`.
    #[inline]
    pub fn decode_gate(code: u8, scale: f32, offset: f32) -> f32 {
        match code {
            GATE_BELOW_THRESHOLD | GATE_RANGE_FOLDED => 0.0,
            _ => (f32::from(code) - offset) / scale,
        }
    }

    /// Range (km) to the center of gate `index`.
    pub fn gate_range_km(&self, index: usize) -> f32 {
        self.first_gate_km + index as f32 * self.gate_interval_km
    }

    /// Range (km) covered by the last gate.
    pub fn max_range_km(&self) -> f32 {
        match self.num_gates {
            0 => self.first_gate_km,
            n => self.gate_range_km(n as usize - 1),
        }
    }
}

/// One azimuthal position within an elevation cut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Radial {
    /// Azimuth angle (degrees).
    pub azimuth: f32,
    /// Azimuth number within the cut.
    pub azimuth_index: u16,
    /// Collection time (ms past midnight).
    pub collection_time: u32,
    /// Collection date (modified Julian).
    pub collection_date: u16,
    /// Azimuthal spacing code (1 = 0.5 deg, 2 = 1.0 deg).
    pub azimuth_spacing: u8,
    /// Radial status (start/intermediate/end of elevation or volume).
    pub radial_status: u8,
    /// Uncompressed radial length (bytes).
    pub radial_length: u16,
    pub data_block_count: u16,
    /// Data-block pointers, relative to the message 31 header start.
    pub pointers: SmallVec<[u32; MAX_DATA_BLOCKS]>,
    /// Velocity block pointer, when present.
    pub velocity_ptr: Option<u32>,
    /// Spectrum width block pointer, when present.
    pub spectrum_width_ptr: Option<u32>,
    pub reflectivity: MomentData,
}

impl Radial {
    /// Volume-constants block pointer.
    pub fn volume_constants_ptr(&self) -> Option<u32> {
        self.pointers.first().copied()
    }

    /// Elevation-constants block pointer.
    pub fn elevation_constants_ptr(&self) -> Option<u32> {
        self.pointers.get(1).copied()
    }

    /// Radial-constants block pointer.
    pub fn radial_constants_ptr(&self) -> Option<u32> {
        self.pointers.get(2).copied()
    }

    /// Reflectivity block pointer.
    pub fn reflectivity_ptr(&self) -> Option<u32> {
        self.pointers.get(REFLECTIVITY_POINTER_SLOT).copied()
    }

    /// Decoded moment data for `kind`. Only reflectivity is decoded.
    pub fn moment(&self, kind: MomentKind) -> Option<&MomentData> {
        match kind {
            MomentKind::Reflectivity => Some(&self.reflectivity),
            _ => None,
        }
    }

    /// Reflectivity gates (dBZ).
    #[inline]
    pub fn reflectivity_gates(&self) -> &[f32] {
        &self.reflectivity.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_sentinel_codes() {
        assert_eq!(MomentData::decode_gate(0, 2.0, 66.0), 0.0);
        assert_eq!(MomentData::decode_gate(1, 2.0, 66.0), 0.0);
        assert_eq!(MomentData::decode_gate(2, 2.0, 66.0), -32.0);
        assert_eq!(MomentData::decode_gate(66, 2.0, 66.0), 0.0);
        assert_eq!(MomentData::decode_gate(255, 2.0, 66.0), 94.5);
    }

    #[test]
    fn test_moment_tags() {
        assert_eq!(MomentKind::from_tag(b"DREF"), Some(MomentKind::Reflectivity));
        assert_eq!(MomentKind::from_tag(b"DSW "), Some(MomentKind::SpectrumWidth));
        assert_eq!(MomentKind::from_tag(b"DZDR"), None);
        assert_eq!(MomentKind::Velocity.tag(), b"DVEL");
    }

    fn moment(codes: &[u8]) -> MomentData {
        MomentData {
            kind: MomentKind::Reflectivity,
            num_gates: codes.len() as u16,
            first_gate_km: 2.125,
            gate_interval_km: 0.25,
            tover: 5.0,
            snr_threshold: 2.0,
            control_flags: 0,
            word_size: 8,
            scale: 2.0,
            offset: 66.0,
            data: codes.iter().map(|&c| MomentData::decode_gate(c, 2.0, 66.0)).collect(),
        }
    }

    #[test]
    fn test_gate_ranges() {
        let m = moment(&[0, 0, 0]);
        assert_eq!(m.gate_range_km(0), 2.125);
        assert_eq!(m.max_range_km(), 2.625);
        assert_eq!(moment(&[]).max_range_km(), 2.125);
    }

    #[test]
    fn test_pointer_accessors() {
        let radial = Radial {
            azimuth: 0.0,
            azimuth_index: 1,
            collection_time: 0,
            collection_date: 0,
            azimuth_spacing: 1,
            radial_status: 0,
            radial_length: 0,
            data_block_count: 5,
            pointers: smallvec![68, 112, 132, 152, 180],
            velocity_ptr: Some(180),
            spectrum_width_ptr: None,
            reflectivity: moment(&[2, 255]),
        };
        assert_eq!(radial.volume_constants_ptr(), Some(68));
        assert_eq!(radial.elevation_constants_ptr(), Some(112));
        assert_eq!(radial.radial_constants_ptr(), Some(132));
        assert_eq!(radial.reflectivity_ptr(), Some(152));
        assert_eq!(radial.reflectivity_gates(), &[-32.0, 94.5]);
        assert!(radial.moment(MomentKind::Reflectivity).is_some());
        assert!(radial.moment(MomentKind::Velocity).is_none());
    }
}
