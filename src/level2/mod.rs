//! NEXRAD Level II archive format.
//!
//! ## Layout
//!
//! ```text
//! [gzip envelope, optional]
//!   [len][BZh..] [len][BZh..] ...       bzip2 blocks, optional
//!     AR2V00vv.eee date time ICAO        24-byte volume header
//!     metadata record                    325,888 bytes, opaque
//!     [pad 12][envelope 16][payload]...  message stream
//! ```
//!
//! Everything is big-endian. Message type 31 (digital radar data) carries
//! one radial: a fixed header, a table of data-block pointers relative to
//! the start of that header, and the pointed-to moment blocks.

mod archive;
mod cursor;
mod format;
mod header;
mod message;
mod radial;

pub use archive::{decode_archive, decode_archive_bytes, decode_bytes};
pub use cursor::ByteCursor;
pub use format::*;
pub use header::{decode_volume_header, read_metadata};
pub use message::{dispatch_messages, read_message_header, MessageHeader};
pub use radial::{decode_message31, decode_reflectivity, read_radial_header, RadialHeader};
