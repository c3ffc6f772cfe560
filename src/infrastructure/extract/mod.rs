//! Format-specific converters from document files to plain text.

pub mod doc;
pub mod docx;
pub mod pdf;
pub mod text;

use std::path::Path;

use crate::domain::document::{DocumentFormat, IngestStage};
use crate::domain::error::RagError;
use crate::infrastructure::staging::StagedFile;

/// Extracts plain text from a file already on disk.
pub fn extract_text(format: DocumentFormat, path: &Path) -> anyhow::Result<String> {
    match format {
        DocumentFormat::Pdf => pdf::extract_pdf_text(path),
        DocumentFormat::Docx => docx::extract_docx_text(path),
        DocumentFormat::Doc => doc::extract_doc_text(path),
        DocumentFormat::Txt => text::extract_plain_text(path),
    }
}

/// Stages `bytes` in `staging_dir`, extracts its text and removes the staged file.
///
/// Blocking; run it on the blocking pool.
pub fn stage_and_extract(
    staging_dir: &Path,
    name: &str,
    format: DocumentFormat,
    bytes: &[u8],
) -> Result<String, RagError> {
    let staged = StagedFile::create(staging_dir, format, bytes).map_err(|e| RagError::Extraction {
        name: name.to_string(),
        reason: format!("failed to stage upload: {e}"),
    })?;
    log::debug!("'{}': {} at {:?}", name, IngestStage::Staged, staged.path());

    extract_text(format, staged.path()).map_err(|e| RagError::Extraction {
        name: name.to_string(),
        reason: format!("{e:#}"),
    })
}
