//! Utility types shared by the decoder layers.
//!
//! - [`Error`] / [`Result`] / [`DecodeWarning`] - Error handling
//! - [`Integral`] - Big-endian field decoding and byte-order reversal

mod endian;
mod error;

pub use endian::*;
pub use error::*;
