//! Resolution of external tool executables.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Resolves the executable for `program`.
///
/// Explicit paths are returned as-is. Bare names are looked up next to the
/// running binary first when `prefer_bundled` is set, then in `PATH`. When
/// neither lookup succeeds the bare name is returned and the spawn reports
/// the failure.
pub fn resolve_program(program: &str, prefer_bundled: bool) -> PathBuf {
    let as_path = Path::new(program);
    if as_path.components().count() > 1 {
        return as_path.to_path_buf();
    }

    if prefer_bundled {
        if let Some(bundled) = bundled_candidate(program) {
            debug!(program, path = ?bundled, "Using bundled tool");
            return bundled;
        }
    }

    match which::which(program) {
        Ok(path) => path,
        Err(_) => PathBuf::from(program),
    }
}

/// Returns the executable with this name in the running binary's directory.
fn bundled_candidate(program: &str) -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?;
    bundled_in(dir, program)
}

fn bundled_in(dir: &Path, program: &str) -> Option<PathBuf> {
    let plain = dir.join(program);
    if plain.is_file() {
        return Some(plain);
    }

    let suffix = std::env::consts::EXE_SUFFIX;
    if !suffix.is_empty() {
        let with_suffix = dir.join(format!("{program}{suffix}"));
        if with_suffix.is_file() {
            return Some(with_suffix);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_paths_are_kept() {
        let path = resolve_program("/opt/tools/mkvinfo", true);
        assert_eq!(path, PathBuf::from("/opt/tools/mkvinfo"));
    }

    #[test]
    fn unknown_tool_falls_back_to_bare_name() {
        let path = resolve_program("definitely_not_a_tool_4821", true);
        assert_eq!(path, PathBuf::from("definitely_not_a_tool_4821"));
    }

    #[test]
    fn bundled_tool_is_found_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(bundled_in(dir.path(), "mkvinfo").is_none());

        std::fs::write(dir.path().join("mkvinfo"), b"").unwrap();
        assert_eq!(
            bundled_in(dir.path(), "mkvinfo"),
            Some(dir.path().join("mkvinfo"))
        );
    }
}
