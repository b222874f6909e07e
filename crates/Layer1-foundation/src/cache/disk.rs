//! Disk tier
//!
//! One JSON file per key, named after the SHA-256 of the key. There is no
//! index: listing the directory enumerates the tier. Writes go to a temporary
//! file that is renamed into place, so readers never see a half-written entry.

use super::entry::CacheEntry;
use super::util::hash_str;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

const ENTRY_EXTENSION: &str = "cache";
const TEMP_EXTENSION: &str = "tmp";

/// Disk-tier failure. Never escapes the cache manager: it is logged and the
/// entry is treated as absent.
#[derive(Error, Debug)]
pub enum CacheIoError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to remove {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to list {}: {source}", .path.display())]
    List {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt cache entry {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to encode entry '{key}': {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

/// Directory of serialized [`CacheEntry`] files
#[derive(Debug, Clone)]
pub struct DiskTier {
    dir: PathBuf,
}

impl DiskTier {
    /// Open (creating if needed) the cache directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheIoError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| CacheIoError::Write {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", hash_str(key), ENTRY_EXTENSION))
    }

    /// `Ok(None)` when no file exists for the key
    pub fn read(&self, key: &str) -> Result<Option<CacheEntry>, CacheIoError> {
        match self.read_path(&self.path_for(key)) {
            Ok(entry) => Ok(Some(entry)),
            Err(CacheIoError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn read_path(&self, path: &Path) -> Result<CacheEntry, CacheIoError> {
        let bytes = std::fs::read(path).map_err(|source| CacheIoError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| CacheIoError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overwrite the entry's file
    pub fn write(&self, entry: &CacheEntry) -> Result<(), CacheIoError> {
        let bytes = serde_json::to_vec(entry).map_err(|source| CacheIoError::Encode {
            key: entry.key.clone(),
            source,
        })?;

        let path = self.path_for(&entry.key);
        let temp = path.with_extension(format!("{}.{}", uuid::Uuid::new_v4(), TEMP_EXTENSION));

        std::fs::write(&temp, bytes).map_err(|source| CacheIoError::Write {
            path: temp.clone(),
            source,
        })?;
        std::fs::rename(&temp, &path).map_err(|source| {
            let _ = std::fs::remove_file(&temp);
            CacheIoError::Write {
                path: path.clone(),
                source,
            }
        })
    }

    /// Returns whether a file was removed; a missing file is not an error
    pub fn remove(&self, key: &str) -> Result<bool, CacheIoError> {
        self.remove_path(&self.path_for(key))
    }

    pub fn remove_path(&self, path: &Path) -> Result<bool, CacheIoError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheIoError::Remove {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Paths of all committed entry files
    pub fn entry_paths(&self) -> Result<Vec<PathBuf>, CacheIoError> {
        self.list(|ext| ext == ENTRY_EXTENSION)
    }

    /// Entry files plus leftover temporaries
    pub fn all_paths(&self) -> Result<Vec<PathBuf>, CacheIoError> {
        self.list(|ext| ext == ENTRY_EXTENSION || ext == TEMP_EXTENSION)
    }

    fn list<F>(&self, keep: F) -> Result<Vec<PathBuf>, CacheIoError>
    where
        F: Fn(&str) -> bool,
    {
        let read_dir = std::fs::read_dir(&self.dir).map_err(|source| CacheIoError::List {
            path: self.dir.clone(),
            source,
        })?;

        Ok(read_dir
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(&keep)
                    .unwrap_or(false)
            })
            .collect())
    }

    /// Number of committed entry files
    pub fn len(&self) -> usize {
        self.entry_paths().map(|paths| paths.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn tier() -> (tempfile::TempDir, DiskTier) {
        let dir = tempfile::tempdir().unwrap();
        let tier = DiskTier::open(dir.path().join("cache")).unwrap();
        (dir, tier)
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, tier) = tier();
        let entry = CacheEntry::new("inbox:unread", json!([1, 2, 3]), Duration::from_secs(60));

        tier.write(&entry).unwrap();

        let read = tier.read("inbox:unread").unwrap().unwrap();
        assert_eq!(read, entry);
        assert_eq!(tier.len(), 1);
    }

    #[test]
    fn test_read_missing_is_none() {
        let (_dir, tier) = tier();
        assert!(tier.read("absent").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let (_dir, tier) = tier();
        std::fs::write(tier.path_for("bad"), b"\x00garbage").unwrap();

        assert!(matches!(tier.read("bad"), Err(CacheIoError::Decode { .. })));
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let (_dir, tier) = tier();
        tier.write(&CacheEntry::new("k", json!(1), Duration::from_secs(60)))
            .unwrap();
        tier.write(&CacheEntry::new("k", json!(2), Duration::from_secs(60)))
            .unwrap();

        assert_eq!(tier.read("k").unwrap().unwrap().value, json!(2));
        assert_eq!(tier.len(), 1);
    }

    #[test]
    fn test_remove_missing_is_false() {
        let (_dir, tier) = tier();
        assert!(!tier.remove("absent").unwrap());
    }

    #[test]
    fn test_keys_with_path_characters() {
        let (_dir, tier) = tier();
        let key = "../../etc/passwd?q=a/b";
        tier.write(&CacheEntry::new(key, json!("ok"), Duration::from_secs(60)))
            .unwrap();

        assert!(tier.path_for(key).starts_with(tier.dir()));
        assert_eq!(tier.read(key).unwrap().unwrap().value, json!("ok"));
    }

    #[test]
    fn test_listing_ignores_foreign_files() {
        let (_dir, tier) = tier();
        std::fs::write(tier.dir().join("notes.txt"), b"hi").unwrap();
        tier.write(&CacheEntry::new("k", json!(1), Duration::from_secs(60)))
            .unwrap();

        assert_eq!(tier.entry_paths().unwrap().len(), 1);
    }
}
