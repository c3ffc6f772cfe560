use anyhow::{Context, Result};
use std::path::Path;

/// Reads the file as UTF-8 without any transformation.
pub fn extract_plain_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).context("file is not valid UTF-8 text")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_plain_text_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let content = "  Line one\r\nLine two ü\n\n";
        fs::write(&path, content).unwrap();

        assert_eq!(extract_plain_text(&path).unwrap(), content);
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("binary.txt");
        fs::write(&path, [0xff, 0xfe, 0x00, 0xc3]).unwrap();

        assert!(extract_plain_text(&path).is_err());
    }
}
