//! Reversible mapping between DOIs and corpus filenames.
//!
//! DOIs contain a `/`, which cannot appear in a filename, so corpus files
//! store it as `@`: `10.1000/xyz123` lives in `10.1000@xyz123.md`.

use std::path::Path;

/// Recover the source identifier from a corpus file path.
pub fn source_id_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.replace('@', "/"))
}

/// Build the corpus filename for a source identifier.
pub fn filename_from_source_id(source_id: &str) -> String {
    format!("{}.md", source_id.replace('/', "@"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_round_trip() {
        let doi = "10.1016/j.cell.2020.01.021";
        let name = filename_from_source_id(doi);
        assert_eq!(name, "10.1016@j.cell.2020.01.021.md");
        assert_eq!(
            source_id_from_path(&PathBuf::from(name)).unwrap(),
            doi
        );
    }

    #[test]
    fn test_plain_identifier() {
        assert_eq!(
            source_id_from_path(&PathBuf::from("2024/PMC1234567.md")).unwrap(),
            "PMC1234567"
        );
    }

    #[test]
    fn test_no_stem() {
        assert!(source_id_from_path(&PathBuf::from("")).is_none());
    }
}
