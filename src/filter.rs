//! Path eligibility rules
//!
//! A path is trackable unless its base name is hidden (leading dot), its
//! path ends with one of the ignored suffixes, it matches a user-supplied
//! glob, or it lives in a location the engine writes to itself (change log,
//! backup directory). Evaluation is pure and performs no I/O.

use crate::error::{Result, TrackError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};

/// Suffixes of editor swap files, temp files and partial downloads
pub const DEFAULT_IGNORED_EXTENSIONS: &[&str] = &[
    ".swp",
    ".swo",
    ".tmp",
    ".~",
    ".crdownload",
    ".part",
    ".goutputstream",
];

/// Decides whether a filesystem path is eligible for tracking
#[derive(Debug, Clone)]
pub struct PathFilter {
    ignored_extensions: Vec<String>,
    ignore_patterns: Vec<String>,
    ignore_globs: Option<GlobSet>,
    excluded_dirs: Vec<PathBuf>,
    excluded_files: Vec<PathBuf>,
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORED_EXTENSIONS.iter().map(|ext| ext.to_string()))
    }
}

impl PathFilter {
    /// Create a filter with the given ignored suffixes
    pub fn new<I, S>(ignored_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored_extensions: ignored_extensions.into_iter().map(Into::into).collect(),
            ignore_patterns: Vec::new(),
            ignore_globs: None,
            excluded_dirs: Vec::new(),
            excluded_files: Vec::new(),
        }
    }

    /// Add glob patterns (e.g. `"*.log"`, `"build/**"`)
    ///
    /// Patterns are matched against both the file name and the full path.
    ///
    /// # Errors
    ///
    /// - [`TrackError::InvalidPattern`] if a pattern is not a valid glob
    pub fn with_ignore_patterns<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.ignore_patterns.push(pattern.as_ref().to_string());
        }

        if self.ignore_patterns.is_empty() {
            self.ignore_globs = None;
            return Ok(self);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in &self.ignore_patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| TrackError::InvalidPattern(format!("{} ({})", pattern, e)))?;
            builder.add(glob);
        }
        let globs = builder
            .build()
            .map_err(|e| TrackError::InvalidPattern(e.to_string()))?;
        self.ignore_globs = Some(globs);
        Ok(self)
    }

    /// Never track anything below `dir`
    pub fn with_excluded_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded_dirs.push(dir.into());
        self
    }

    /// Never track `file`
    pub fn with_excluded_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.excluded_files.push(file.into());
        self
    }

    /// Decide whether `path` should be tracked
    pub fn is_trackable(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name() else {
            return false;
        };
        let file_name = file_name.to_string_lossy();
        if file_name.starts_with('.') {
            return false;
        }

        let full_path = path.to_string_lossy();
        if self
            .ignored_extensions
            .iter()
            .any(|ext| full_path.ends_with(ext.as_str()))
        {
            return false;
        }

        if let Some(globs) = &self.ignore_globs {
            if globs.is_match(&*file_name) || globs.is_match(path) {
                return false;
            }
        }

        if self.excluded_dirs.iter().any(|dir| path.starts_with(dir)) {
            return false;
        }
        !self.excluded_files.iter().any(|file| file == path)
    }
}
