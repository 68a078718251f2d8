//! Deterministic file discovery: a directory walk with extension filtering.
//!
//! This is the kind of step that never needs a model. The output order is
//! sorted so a pipeline run over the same tree is reproducible.

use log::debug;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A file selected for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub ext: String,
}

// Build output and vendored trees; not worth scanning.
const SKIP_DIRS: &[&str] = &["target", "node_modules", "vendor", "dist"];

fn skip(entry: &DirEntry) -> bool {
    // depth 0 is the root itself; never prune it, whatever it is named
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIP_DIRS.contains(&name.as_ref())
}

/// Walk `root` and collect files whose extension is in `extensions`
/// (with or without a leading dot). Hidden and vendored directories are
/// pruned; unreadable entries are skipped. Results are sorted by path.
pub fn discover_sources(root: impl AsRef<Path>, extensions: &[&str]) -> Vec<SourceFile> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root.as_ref())
        .into_iter()
        .filter_entry(|e| !skip(e))
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_string)
        else {
            continue;
        };
        if extensions.iter().any(|want| want.trim_start_matches('.') == ext) {
            files.push(SourceFile {
                path: entry.into_path(),
                ext,
            });
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(
        "discovered {} files under {}",
        files.len(),
        root.as_ref().display()
    );
    files
}
