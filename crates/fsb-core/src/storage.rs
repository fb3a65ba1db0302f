//! Disk side of an intake: `.part` staging file and atomic finalize.
//!
//! Bytes are streamed into a freshly created `<final>.<random>.part` next to
//! the target; only a complete, synced body is moved onto the final name, and
//! never over an existing entry. A staged file dropped without `finalize`
//! removes its own staging file and nothing else.

use std::ffi::OsString;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::TransferError;

/// Suffix of staging files.
pub const TEMP_SUFFIX: &str = ".part";

/// Create `dir` and its parents. Existing directories are fine.
pub fn ensure_dir(dir: &Path) -> Result<(), TransferError> {
    fs::create_dir_all(dir).map_err(|source| TransferError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Sequential writer for one incoming file.
pub struct StagedFile {
    writer: BufWriter<NamedTempFile>,
    final_path: PathBuf,
}

impl StagedFile {
    /// Create a new staging file beside `final_path`. Existing files are never opened.
    pub fn create(final_path: &Path) -> Result<Self, TransferError> {
        let dir = final_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut prefix = final_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(OsString::new);
        prefix.push(".");
        let file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)
            .map_err(|source| TransferError::CreateFile {
                path: final_path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            writer: BufWriter::new(file),
            final_path: final_path.to_path_buf(),
        })
    }

    /// Flush, sync and move onto the final path. Fails if the final path is taken.
    pub fn finalize(self) -> Result<PathBuf, TransferError> {
        let final_path = self.final_path;
        let finalize_err = |source| TransferError::Finalize {
            path: final_path.clone(),
            source,
        };
        let file = self
            .writer
            .into_inner()
            .map_err(|e| finalize_err(e.into_error()))?;
        file.as_file().sync_all().map_err(finalize_err)?;
        file.persist_noclobber(&final_path)
            .map_err(|e| finalize_err(e.error))?;
        Ok(final_path)
    }
}

impl Write for StagedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
