// Source Scanner
// Reads a routine source file and locates the line that opens the routine body

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::error::CompileErrorKind;

/// Line (after trimming) that opens the routine body. Everything above it is
/// the directive region.
pub const BODY_MARKER: &str = "begin";

/// A scanned routine source file. Read-only once scanned.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path of the file
    pub path: PathBuf,
    pub text: String,
    pub lines: Vec<String>,
    /// Modification time in seconds since the Unix epoch
    pub timestamp: i64,
    /// Index of the first body marker line, if any
    pub body_marker: Option<usize>,
}

impl SourceFile {
    /// Read and scan a source file from disk
    pub fn read(path: &Path) -> Result<Self, CompileErrorKind> {
        let io_error = |source| CompileErrorKind::SourceIo {
            path: path.to_path_buf(),
            source,
        };

        let absolute = path.canonicalize().map_err(io_error)?;
        let text = fs::read_to_string(&absolute).map_err(io_error)?;
        let timestamp = modification_time(&absolute).map_err(io_error)?;

        Ok(Self::from_text(absolute, text, timestamp))
    }

    /// Scan source text that has already been loaded
    pub fn from_text(path: impl Into<PathBuf>, text: impl Into<String>, timestamp: i64) -> Self {
        let text = text.into();
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        let body_marker = lines.iter().position(|line| line.trim() == BODY_MARKER);

        Self {
            path: path.into(),
            text,
            lines,
            timestamp,
            body_marker,
        }
    }

    /// Lines strictly above the body marker, or `None` if there is no marker
    pub fn directive_region(&self) -> Option<&[String]> {
        self.body_marker.map(|index| &self.lines[..index])
    }

    /// File name without extension; must equal the routine name
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Directory containing the file
    pub fn directory(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Modification time of a file in seconds since the Unix epoch
pub fn modification_time(path: &Path) -> std::io::Result<i64> {
    let modified = fs::metadata(path)?.modified()?;
    let seconds = modified
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0);
    Ok(seconds)
}
