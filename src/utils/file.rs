//! File utilities for corpus loading.

use std::fs;
use std::path::Path;

/// Check if a path looks like a markdown corpus file.
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "md" || ext == "markdown"
        })
        .unwrap_or(false)
}

/// Read file content with size limit.
pub fn read_file_content(path: &Path, max_size: u64) -> std::io::Result<String> {
    let metadata = fs::metadata(path)?;

    if metadata.len() > max_size {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "file exceeds maximum size: {} > {}",
                metadata.len(),
                max_size
            ),
        ));
    }

    fs::read_to_string(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_is_markdown_file() {
        assert!(is_markdown_file(&PathBuf::from("10.1000@x.md")));
        assert!(is_markdown_file(&PathBuf::from("paper.markdown")));
        assert!(!is_markdown_file(&PathBuf::from("paper.pdf")));
        assert!(!is_markdown_file(&PathBuf::from("README")));
    }

    #[test]
    fn test_read_file_content_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.md");
        fs::write(&path, "0123456789").unwrap();

        assert_eq!(read_file_content(&path, 100).unwrap(), "0123456789");
        assert!(read_file_content(&path, 5).is_err());
    }
}
