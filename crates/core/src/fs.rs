//! Filesystem helpers shared by the toolchain.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PlugError, Result};

/// Reads a whole file as UTF-8 text.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| PlugError::read(path, e))
}

/// Writes text to a file, replacing it if it exists.
pub fn write(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    fs::write(path, contents).map_err(|e| PlugError::write(path, e))
}

/// Whether `path` is a file (as opposed to a directory).
pub fn is_file(path: &Path) -> Result<bool> {
    let meta = fs::metadata(path).map_err(|e| PlugError::read(path, e))?;
    Ok(!meta.is_dir())
}

/// Directory containing `path`; a directory is its own containing directory.
pub fn containing_dir(path: &Path) -> Result<PathBuf> {
    if !is_file(path)? {
        return Ok(path.to_path_buf());
    }

    Ok(match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    })
}

/// Copies `src` into `dest_dir` (created if missing), keeping its file name.
pub fn copy_into_dir(src: &Path, dest_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dest_dir).map_err(|e| PlugError::write(dest_dir, e))?;

    let file_name = src
        .file_name()
        .ok_or_else(|| PlugError::read(src, std::io::Error::other("path has no file name")))?;
    let dest = dest_dir.join(file_name);

    fs::copy(src, &dest).map_err(|e| PlugError::write(&dest, e))?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_is_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plugin.go");
        fs::write(&file, "package main").unwrap();

        assert!(is_file(&file).unwrap());
        assert!(!is_file(dir.path()).unwrap());
        assert!(is_file(&dir.path().join("missing.go")).is_err());
    }

    #[test]
    fn test_containing_dir() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plugin.go");
        fs::write(&file, "package main").unwrap();

        assert_eq!(containing_dir(&file).unwrap(), dir.path());
        assert_eq!(containing_dir(dir.path()).unwrap(), dir.path());
    }

    #[test]
    fn test_read_missing_file_names_path() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.go");
        let err = read_to_string(&missing).unwrap_err();
        assert!(err.to_string().contains("nope.go"));
    }

    #[test]
    fn test_copy_into_dir() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("fuzzTypes.go");
        fs::write(&src, "package fuzzTypes\n").unwrap();

        let dest_dir = dir.path().join("components/fuzzTypes");
        let dest = copy_into_dir(&src, &dest_dir).unwrap();

        assert_eq!(dest, dest_dir.join("fuzzTypes.go"));
        assert_eq!(fs::read_to_string(dest).unwrap(), "package fuzzTypes\n");
    }
}
