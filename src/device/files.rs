//! Destinations for downloaded files.

use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use tracing::debug;

use crate::error::{Error, Result};

// ============================================================================
// FileSink
// ============================================================================

/// Receives a downloaded file.
pub trait FileSink: Send + Sync {
    /// Stores `contents` (base64) under `filename`.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be decoded or stored.
    fn save(&self, filename: &str, contents: &str) -> Result<()>;
}

// ============================================================================
// DirectorySink
// ============================================================================

/// Writes downloaded files into a directory.
#[derive(Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl fmt::Debug for DirectorySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DirectorySink").field(&self.dir).finish()
    }
}

impl DirectorySink {
    /// Creates a sink writing into `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the target directory.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSink for DirectorySink {
    fn save(&self, filename: &str, contents: &str) -> Result<()> {
        // Only the final component is used so a remote name cannot escape the directory.
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| Error::protocol(format!("Invalid file name: {filename:?}")))?;

        let bytes = Base64Standard.decode(contents)?;
        let path = self.dir.join(name);

        std::fs::write(&path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "File saved");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
