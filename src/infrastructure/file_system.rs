use anyhow::{bail, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::domain::document::DocumentFormat;

/// Recursively lists files under `dir` whose extension maps to a supported format.
///
/// Paths are returned sorted so bulk runs are reproducible. Unreadable
/// directory entries are logged and skipped.
pub fn collect_supported_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Specified path is not a directory: {:?}", dir);
    }

    let mut files = Vec::new();
    let mut skipped = 0usize;
    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {:?}: {}", dir, e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if DocumentFormat::from_file_name(&name).is_ok() {
            files.push(entry.into_path());
        } else {
            debug!("Ignoring unsupported file {:?}", entry.path());
            skipped += 1;
        }
    }
    files.sort();
    debug!("Found {} supported files ({} skipped) in {:?}", files.len(), skipped, dir);
    Ok(files)
}

/// Storage identity for a file found under `root`: its relative path with `/`
/// separators, so equal file names in different subdirectories stay distinct.
pub fn identity_for(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_collect_supported_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("sub")).unwrap();
        File::create(root.join("b.txt")).unwrap();
        File::create(root.join("sub/a.PDF")).unwrap();
        File::create(root.join("sub/c.docx")).unwrap();
        File::create(root.join("image.png")).unwrap();
        File::create(root.join("notes")).unwrap();

        let files = collect_supported_files(root).unwrap();
        let names: Vec<String> = files.iter().filter_map(|p| identity_for(root, p)).collect();
        assert_eq!(names, vec!["b.txt", "sub/a.PDF", "sub/c.docx"]);
    }

    #[test]
    fn test_collect_supported_files_not_a_directory() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("a_file.txt");
        File::create(&file_path).unwrap();
        let result = collect_supported_files(&file_path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_identity_for() {
        let root = Path::new("/tmp/docs");
        assert_eq!(identity_for(root, &root.join("report.pdf")), Some("report.pdf".to_string()));
        assert_eq!(
            identity_for(root, &root.join("a").join("notes.txt")),
            Some("a/notes.txt".to_string())
        );
        assert_ne!(
            identity_for(root, &root.join("a/notes.txt")),
            identity_for(root, &root.join("b/notes.txt"))
        );
        assert_eq!(identity_for(root, root), None);
        assert_eq!(identity_for(root, Path::new("/elsewhere/x.txt")), None);
    }
}
