//! Decoded volume model.
//!
//! - [`VolumeModel`] - Header, metadata and the sparse elevation index
//! - [`Elevation`] - One cut with its radials in arrival order
//! - [`Radial`] / [`MomentData`] - Per-azimuth pointers and decoded gates

mod radial;
mod volume;

pub use radial::{MomentData, MomentKind, Radial};
pub use volume::{Elevation, MetadataBlob, VolumeHeader, VolumeModel};
