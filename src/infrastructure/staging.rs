use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

use crate::domain::document::DocumentFormat;

/// An uploaded document copied to disk for parsers that need a file handle.
///
/// The file is removed when the value is dropped, on success and failure alike.
pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    /// Writes `bytes` to a fresh file in `dir`, creating the directory if needed.
    pub fn create(dir: &Path, format: DocumentFormat, bytes: &[u8]) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let mut file = Builder::new()
            .prefix("staged-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
