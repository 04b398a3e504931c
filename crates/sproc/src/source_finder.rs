// Source Finder
// Discovers routine source files below the configured source directory

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Directory names never descended into
const DEFAULT_IGNORE_DIRS: &[&str] = &[".git", "target", "build", "vendor", "node_modules"];

/// Finds routine sources by extension
pub struct SourceFinder {
    root: PathBuf,
    extension: String,
    ignore_dirs: HashSet<String>,
}

impl SourceFinder {
    /// `extension` is given without the leading dot
    pub fn new(root: impl AsRef<Path>, extension: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: extension.into(),
            ignore_dirs: DEFAULT_IGNORE_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// All source files below the root, sorted by path
    pub fn scan(&self) -> Result<Vec<PathBuf>, io::Error> {
        let mut files = Vec::new();
        self.scan_directory(&self.root, &mut files)?;

        files.sort();

        Ok(files)
    }

    fn scan_directory(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), io::Error> {
        if !dir.is_dir() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_name = entry.file_name();
            let file_name_str = file_name.to_string_lossy();

            // Hidden entries are editor swap files and the like
            if file_name_str.starts_with('.') {
                continue;
            }

            if path.is_dir() {
                if self.ignore_dirs.contains(file_name_str.as_ref()) {
                    continue;
                }
                self.scan_directory(&path, files)?;
            } else if path.is_file() && self.has_extension(&path) {
                files.push(path);
            }
        }

        Ok(())
    }

    fn has_extension(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.to_string_lossy() == self.extension)
    }
}
