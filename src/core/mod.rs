//! Core layer - archive loading, decompression and decode options.
//!
//! This module provides:
//! - [`Source`] - Memory-mapped or buffered archive bytes
//! - [`decompress`] / [`decompress_bytes`] - gzip inflate and bzip2 block splicing
//! - [`DecodeOptions`] - Pipeline switches, loadable from a JSON config file

mod compression;
mod options;
mod source;

pub use compression::{
    decompress, decompress_block, decompress_bytes, index_bzip2_blocks, inflate_gzip,
    splice_bzip2_blocks, Decompressed, Segment,
};
pub use options::{dump_path_for, DecodeOptions, DUMP_SUFFIX};
pub use source::Source;
