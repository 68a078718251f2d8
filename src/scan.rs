//! Deterministic pattern scan: line-based substring and regex search.

use regex::Regex;
use std::path::{Path, PathBuf};

use crate::step::StepError;

/// One matching line, with a 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    pub path: PathBuf,
    pub line_no: usize,
    pub text: String,
}

/// Scan a file for lines containing `needle` as a plain substring.
pub fn scan_lines(path: impl AsRef<Path>, needle: &str) -> Result<Vec<LineMatch>, StepError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    Ok(collect(path, &content, |line| line.contains(needle)))
}

/// Scan a file for lines matching `re`.
pub fn scan_regex(path: impl AsRef<Path>, re: &Regex) -> Result<Vec<LineMatch>, StepError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    Ok(collect(path, &content, |line| re.is_match(line)))
}

fn collect(path: &Path, content: &str, pred: impl Fn(&str) -> bool) -> Vec<LineMatch> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| pred(line))
        .map(|(i, line)| LineMatch {
            path: path.to_path_buf(),
            line_no: i + 1,
            text: line.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn substring_scan_reports_line_numbers() {
        let f = fixture("alpha\nneedle here\ngamma\nanother needle\n");
        let matches = scan_lines(f.path(), "needle").unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].line_no, 2);
        assert_eq!(matches[0].text, "needle here");
        assert_eq!(matches[1].line_no, 4);
    }

    #[test]
    fn substring_scan_no_match() {
        let f = fixture("alpha\nbeta\n");
        let matches = scan_lines(f.path(), "needle").unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn regex_scan_matches_lines() {
        let f = fixture("fn alpha()\nlet x = 1;\nfn beta()\n");
        let re = Regex::new(r"^fn\s+\w+").unwrap();
        let matches = scan_regex(f.path(), &re).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[1].line_no, 3);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(scan_lines("/nonexistent_dir_xyz_abc/f.rs", "x").is_err());
    }
}
