//! Whole-archive decode: decompression, header, metadata, then messages.

use std::path::Path;

use super::cursor::ByteCursor;
use super::header::{decode_volume_header, read_metadata};
use super::message::dispatch_messages;
use crate::core::{decompress_bytes, dump_path_for, DecodeOptions, Decompressed, Source};
use crate::model::VolumeModel;
use crate::util::{DecodeWarning, Error, Result};

/// Decode a Level II archive file into a [`VolumeModel`].
///
/// The file is fully decompressed (gzip envelope and bzip2 blocks, as
/// enabled in `options`) before any structured parsing starts.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn decode_archive(path: impl AsRef<Path>, options: &DecodeOptions) -> Result<VolumeModel> {
    let path = path.as_ref();
    let decompressed = {
        let source = Source::open(path)?;
        decompress_bytes(&source, options)?
    };

    if options.dump_intermediate {
        dump_intermediate(path, &decompressed.data);
    }

    decode_decompressed(decompressed)
}

/// Decode raw archive bytes held in memory (compressed or not).
pub fn decode_archive_bytes(raw: &[u8], options: &DecodeOptions) -> Result<VolumeModel> {
    decode_decompressed(decompress_bytes(raw, options)?)
}

/// Decode an already decompressed logical stream.
pub fn decode_bytes(data: Vec<u8>) -> Result<VolumeModel> {
    decode_stream(data, 0, Vec::new())
}

fn decode_decompressed(decompressed: Decompressed) -> Result<VolumeModel> {
    let Decompressed { data, blocks, warnings } = decompressed;
    decode_stream(data, blocks, warnings)
}

fn decode_stream(data: Vec<u8>, blocks: usize, warnings: Vec<DecodeWarning>) -> Result<VolumeModel> {
    let len = data.len() as u64;
    let mut cursor = ByteCursor::new(data);

    let header = decode_volume_header(&mut cursor)?;
    let metadata = read_metadata(&mut cursor)?;
    if cursor.at_end() {
        return Err(Error::HeaderOnlyArchive);
    }

    let mut volume = VolumeModel::new(header, metadata);
    volume.set_source_stats(len, blocks);
    for warning in warnings {
        volume.push_warning(warning);
    }

    let messages = dispatch_messages(&mut cursor, &mut volume)?;

    tracing::info!(
        icao = %volume.header().icao,
        bytes = len,
        blocks,
        messages,
        elevations = volume.elevation_count(),
        radials = volume.radial_count(),
        warnings = volume.warnings().len(),
        "decoded volume"
    );
    Ok(volume)
}

fn dump_intermediate(path: &Path, data: &[u8]) {
    let dump = dump_path_for(path);
    match std::fs::write(&dump, data) {
        Ok(()) => tracing::info!(path = %dump.display(), bytes = data.len(), "wrote decompressed stream"),
        Err(e) => tracing::warn!(path = %dump.display(), error = %e, "failed to write decompressed stream"),
    }
}
