//! Raw archive bytes, memory-mapped or read into memory.

use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;

use crate::util::{Error, Result};

/// Read-only view of an archive file as it sits on disk.
pub struct Source {
    inner: SourceInner,
}

enum SourceInner {
    /// Memory-mapped file (preferred for large files)
    Mmap(Mmap),
    /// Whole file read into memory (empty files, or mapping disabled)
    Bytes(Vec<u8>),
}

impl Source {
    /// Open a file, memory-mapping it when the `mmap` feature is enabled.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_opts(path, cfg!(feature = "mmap"))
    }

    /// Open a file with optional memory mapping.
    pub fn open_opts(path: impl AsRef<Path>, use_mmap: bool) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let size = file.metadata()?.len();

        let inner = if use_mmap && size > 0 {
            // Safety: file is opened read-only and the map is dropped with the source
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
            SourceInner::Mmap(mmap)
        } else {
            let mut bytes = Vec::with_capacity(size as usize);
            file.read_to_end(&mut bytes)?;
            SourceInner::Bytes(bytes)
        };

        tracing::debug!(path = %path.display(), size, mapped = matches!(inner, SourceInner::Mmap(_)), "opened archive");
        Ok(Self { inner })
    }

    #[inline]
    pub fn is_mapped(&self) -> bool {
        matches!(self.inner, SourceInner::Mmap(_))
    }

    /// Take the bytes, copying out of the map if needed.
    pub fn into_vec(self) -> Vec<u8> {
        match self.inner {
            SourceInner::Mmap(mmap) => mmap.to_vec(),
            SourceInner::Bytes(bytes) => bytes,
        }
    }
}

impl Deref for Source {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match &self.inner {
            SourceInner::Mmap(mmap) => &mmap[..],
            SourceInner::Bytes(bytes) => &bytes[..],
        }
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("len", &self.len())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}
