//! # NEXRAD Level II
//!
//! Decoder for NEXRAD Level II weather-radar archive files.
//!
//! An archive is optionally gzip-wrapped, its logical stream is usually split
//! into embedded bzip2 blocks, and the decompressed stream holds a volume
//! header, an opaque metadata record and a sequence of messages. Message
//! type 31 carries one radial of moment data; reflectivity is decoded into
//! physical gate values.
//!
//! ## Modules
//!
//! - [`util`] - Errors, warnings and big-endian integer reads
//! - [`core`] - File loading, decompression and decode options
//! - [`level2`] - Archive layout, cursor and message decoders
//! - [`model`] - Decoded volume (elevations, radials, gates)
//!
//! ## Example
//!
//! ```ignore
//! use nexrad_level2::prelude::*;
//!
//! let volume = decode_archive("KDIX20240517_025206_V06", &DecodeOptions::default())?;
//! println!("{} {}", volume.header().icao, volume.radial_count());
//!
//! for elevation in volume.elevations() {
//!     for radial in &elevation.radials {
//!         let gates = radial.reflectivity_gates();
//!     }
//! }
//! ```

pub mod util;
pub mod core;
pub mod level2;
pub mod model;

// Re-export commonly used types
pub use crate::util::{DecodeWarning, Error, Result};
pub use crate::core::{decompress, DecodeOptions, Decompressed};
pub use crate::level2::{decode_archive, decode_archive_bytes, decode_bytes};
pub use crate::model::{Elevation, MetadataBlob, MomentData, MomentKind, Radial, VolumeHeader, VolumeModel};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{DecodeWarning, Error, Result};
    pub use crate::core::{decompress, DecodeOptions, Decompressed};
    pub use crate::level2::{decode_archive, decode_archive_bytes, decode_bytes};
    pub use crate::model::*;
}
