use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::document_service::DocumentService;
use crate::domain::error::RagError;
use crate::infrastructure::file_system::{collect_supported_files, identity_for};

/// Outcome of ingesting one directory.
#[derive(Debug, Default)]
pub struct BulkIngestReport {
    pub ingested: Vec<String>,
    pub failed: Vec<(PathBuf, String)>,
}

impl BulkIngestReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

async fn ingest_path(service: &dyn DocumentService, root: &Path, path: &Path) -> Result<String, RagError> {
    let name = identity_for(root, path).ok_or_else(|| RagError::Extraction {
        name: path.display().to_string(),
        reason: "path is not a file under the ingested directory".to_string(),
    })?;
    let bytes = tokio::fs::read(path).await.map_err(|e| RagError::Extraction {
        name: name.clone(),
        reason: format!("failed to read file: {e}"),
    })?;
    service.ingest_document(&name, bytes).await.map(|receipt| receipt.id)
}

/// Ingests every supported file under `dir`, at most `concurrency` at a time.
///
/// Each record is keyed by the file's path relative to `dir`. A failing file is recorded in the report and does not stop the run.
pub async fn ingest_directory(
    service: Arc<dyn DocumentService>,
    dir: &Path,
    concurrency: usize,
) -> anyhow::Result<BulkIngestReport> {
    let files = collect_supported_files(dir)?;
    log::info!("Ingesting {} files from {:?}", files.len(), dir);

    let outcomes: Vec<(PathBuf, Result<String, RagError>)> = stream::iter(files)
        .map(|path| {
            let service = service.clone();
            async move {
                let outcome = ingest_path(service.as_ref(), dir, &path).await;
                (path, outcome)
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = BulkIngestReport::default();
    for (path, outcome) in outcomes {
        match outcome {
            Ok(id) => report.ingested.push(id),
            Err(e) => {
                log::warn!("Failed to ingest {:?}: {}", path, e);
                report.failed.push((path, e.to_string()));
            }
        }
    }
    report.ingested.sort();
    report.failed.sort();
    Ok(report)
}
