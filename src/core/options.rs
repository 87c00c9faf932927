//! Decode options, optionally persisted as JSON in the user config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::util::{Error, Result};

/// Suffix appended to the archive file name for the intermediate dump.
pub const DUMP_SUFFIX: &str = "decompressed";

/// Switches for the decode pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Inflate a whole-file gzip envelope when present.
    pub gzip: bool,
    /// Scan for and splice embedded bzip2 blocks.
    pub bzip2: bool,
    /// Write the decompressed stream next to the archive.
    pub dump_intermediate: bool,
    /// Decompress bzip2 blocks on the rayon pool.
    pub parallel: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            gzip: true,
            bzip2: true,
            dump_intermediate: false,
            parallel: true,
        }
    }
}

impl DecodeOptions {
    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    pub fn with_bzip2(mut self, bzip2: bool) -> Self {
        self.bzip2 = bzip2;
        self
    }

    pub fn with_dump_intermediate(mut self, dump: bool) -> Self {
        self.dump_intermediate = dump;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Parse options from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Load options from a JSON file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_json(&text)
    }

    /// Default options file: `<config dir>/nexrad-level2/options.json`.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("nexrad-level2");
            p.push("options.json");
            p
        })
    }

    /// Load the user's options file, falling back to defaults when it is
    /// missing or malformed.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring options file");
                Self::default()
            }
        }
    }

    /// Write options as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Side file for the intermediate dump: `<archive>.decompressed`.
pub fn dump_path_for(archive: impl AsRef<Path>) -> PathBuf {
    let archive = archive.as_ref();
    let mut name = archive.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(DUMP_SUFFIX);
    archive.with_file_name(name)
}
