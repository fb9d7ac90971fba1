//! Input file discovery.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::ConfigError;

/// Collects the container files named by the command line.
pub struct FileDiscovery {
    patterns: Vec<glob::Pattern>,
}

impl FileDiscovery {
    /// Creates a discovery matching file names against glob `patterns`.
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ConfigError::ParseFailed {
                path: PathBuf::from("files.patterns"),
                message: format!("Invalid file pattern: {}", e),
            })?;

        Ok(Self { patterns })
    }

    /// Returns true if the file name matches any pattern.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.patterns.iter().any(|p| p.matches(name))
    }

    /// Expands files and directories into matching files.
    ///
    /// Directories are walked recursively. Duplicates are dropped, keeping
    /// the first occurrence.
    pub fn collect(&self, inputs: &[PathBuf]) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for input in inputs {
            if input.is_file() {
                if self.matches(input) {
                    push_unique(&mut files, &mut seen, input.clone());
                } else {
                    debug!(path = ?input, "Skipping file not matching patterns");
                }
            } else if input.is_dir() {
                for entry in WalkDir::new(input).follow_links(true).sort_by_file_name() {
                    match entry {
                        Ok(entry) if entry.file_type().is_file() && self.matches(entry.path()) => {
                            push_unique(&mut files, &mut seen, entry.into_path());
                        }
                        Ok(_) => {}
                        Err(e) => warn!(path = ?input, error = %e, "Failed to walk directory"),
                    }
                }
            } else {
                warn!(path = ?input, "Path does not exist");
            }
        }

        files
    }
}

fn push_unique(files: &mut Vec<PathBuf>, seen: &mut HashSet<PathBuf>, path: PathBuf) {
    let key = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
    if seen.insert(key) {
        files.push(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn walks_directories_and_filters_by_pattern() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.mkv"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("season 1/b.mkv"));
        touch(&dir.path().join("season 1/extras/c.mkv"));

        let discovery = FileDiscovery::new(&["*.mkv".to_string()]).unwrap();
        let files = discovery.collect(&[dir.path().to_path_buf()]);

        assert_eq!(
            files,
            vec![
                dir.path().join("a.mkv"),
                dir.path().join("season 1/b.mkv"),
                dir.path().join("season 1/extras/c.mkv"),
            ]
        );
    }

    #[test]
    fn explicit_files_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let movie = dir.path().join("movie.mkv");
        touch(&movie);
        touch(&dir.path().join("movie.mp4"));

        let discovery = FileDiscovery::new(&["*.mkv".to_string()]).unwrap();
        let files = discovery.collect(&[
            movie.clone(),
            dir.path().join("movie.mp4"),
            dir.path().to_path_buf(),
            dir.path().join("missing.mkv"),
        ]);

        assert_eq!(files, vec![movie]);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(FileDiscovery::new(&["[".to_string()]).is_err());
    }
}
