//! Atomic persistence for small JSON state files
//!
//! Writes go to a temporary file in the destination directory, are fsynced,
//! then renamed over the target. A crash at any point leaves either the old
//! complete file or the new complete file on disk.

use crate::error::{PhonedeskError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Atomically replace `path` with `data`
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => {
            return Err(PhonedeskError::NoParentDirectory {
                path: path.to_path_buf(),
            })
        },
    };

    fs::create_dir_all(parent)
        .map_err(|e| PhonedeskError::state_file("create parent directory", parent, e))?;

    // Same directory as the target so the rename stays on one filesystem
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .map_err(|e| PhonedeskError::state_file("create temp file", parent, e))?;

    tmp.write_all(data)
        .map_err(|e| PhonedeskError::state_file("write temp file", tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| PhonedeskError::state_file("fsync temp file", tmp.path(), e))?;

    tmp.persist(path)
        .map_err(|e| PhonedeskError::state_file("rename temp file", path, e.error))?;

    sync_directory(parent);

    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    atomic_write(path, &json)
}

/// Read a JSON state file.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PhonedeskError::state_file("read state file", path, e)),
    };

    Ok(Some(serde_json::from_slice(&content)?))
}

// Directory fsync makes the rename durable. Not supported everywhere, so
// failures are only logged.
fn sync_directory(dir: &Path) {
    #[cfg(unix)]
    {
        if let Err(e) = File::open(dir).and_then(|d| d.sync_all()) {
            tracing::debug!(dir = %dir.display(), error = %e, "Directory fsync failed");
        }
    }
    #[cfg(not(unix))]
    {
        let _ = dir;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        count: u32,
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        atomic_write_json(&path, &Sample { count: 3 }).unwrap();
        let loaded: Option<Sample> = read_json(&path).unwrap();
        assert_eq!(loaded, Some(Sample { count: 3 }));
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        atomic_write_json(&path, &Sample { count: 1 }).unwrap();
        atomic_write_json(&path, &Sample { count: 2 }).unwrap();

        let loaded: Option<Sample> = read_json(&path).unwrap();
        assert_eq!(loaded, Some(Sample { count: 2 }));

        // no temp files left behind
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_read_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let loaded: Option<Sample> = read_json(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/state.json");
        atomic_write(&path, b"{}").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_fails_when_parent_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let result = atomic_write(&blocker.join("state.json"), b"{}");
        assert!(result.is_err());
    }
}
