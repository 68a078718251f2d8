//! Filesystem access for steps, with errors that fit the pipeline.

use crate::step::StepError;
use std::path::Path;

/// Read a whole file as UTF-8 text.
pub fn read_file(path: impl AsRef<Path>) -> Result<String, StepError> {
    let path = path.as_ref();
    std::fs::read_to_string(path)
        .map_err(|e| StepError::other(format!("read {}: {e}", path.display())))
}

/// Write a file, creating missing parent directories first.
pub fn write_file(path: impl AsRef<Path>, content: &str) -> Result<(), StepError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| StepError::other(format!("mkdir {}: {e}", parent.display())))?;
    }
    std::fs::write(path, content)
        .map_err(|e| StepError::other(format!("write {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_creates_parents_and_read_gets_it_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/digest.txt");

        write_file(&path, "2 units summarized").unwrap();
        assert_eq!(read_file(&path).unwrap(), "2 units summarized");
    }

    #[test]
    fn read_error_names_the_path() {
        let err = read_file("/no_such_dir_anywhere/f.txt").err().unwrap();
        assert!(matches!(err, StepError::Other(_)));
        assert!(err.to_string().contains("/no_such_dir_anywhere/f.txt"));
    }
}
