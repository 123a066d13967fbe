//! Directory walking with gitignore-style exclude globs.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::warn;
use walkdir::WalkDir;

use crate::errors::{DolceError, DolceResult};

const PYTHON_EXTENSION: &str = "py";

/// Exclude globs compiled against a walk root.
pub struct ExcludeMatcher {
    gitignore: Gitignore,
}

impl ExcludeMatcher {
    pub fn new(root: &Path, patterns: &[String]) -> DolceResult<Self> {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in patterns.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            builder
                .add_line(None, pattern)
                .map_err(|e| DolceError::Config(format!("Invalid exclude pattern '{pattern}': {e}")))?;
        }
        let gitignore = builder
            .build()
            .map_err(|e| DolceError::Config(format!("Invalid exclude patterns: {e}")))?;
        Ok(Self { gitignore })
    }

    pub fn is_excluded(&self, path: &Path, is_dir: bool) -> bool {
        self.gitignore.matched(path, is_dir).is_ignore()
    }
}

fn is_python_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == PYTHON_EXTENSION)
}

/// Python files under `root` (or `root` itself), sorted by path.
///
/// Excluded directories are pruned without being descended into.
pub fn iter_python_files(root: &Path, excludes: &[String]) -> DolceResult<Vec<PathBuf>> {
    if !root.exists() {
        return Err(DolceError::Extract(format!(
            "Path does not exist: {}",
            root.display()
        )));
    }

    if root.is_file() {
        let base = root.parent().unwrap_or(Path::new(""));
        let matcher = ExcludeMatcher::new(base, excludes)?;
        if is_python_file(root) && !matcher.is_excluded(root, false) {
            return Ok(vec![root.to_path_buf()]);
        }
        return Ok(Vec::new());
    }

    let matcher = ExcludeMatcher::new(root, excludes)?;
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !matcher.is_excluded(entry.path(), entry.file_type().is_dir())
        });
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_python_file(entry.path()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable entry: {e}"),
        }
    }
    files.sort();
    Ok(files)
}

/// Forward-slash display form of a path.
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
