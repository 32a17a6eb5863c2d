use super::medium::StorageMedium;
use crate::error::{Result, StoreError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File-per-key storage medium. Each key becomes `<root>/<key>.json`.
///
/// Entity and backup keys stay within `[A-Za-z0-9_]`, so keys map to file
/// names without escaping.
pub struct FsMedium {
    root: PathBuf,
}

impl FsMedium {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn ensure_root(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(|e| map_medium_err("", e))?;
        }
        Ok(())
    }
}

// Quota exhaustion and an unreachable medium are distinct failures so the
// store can surface them differently.
fn map_medium_err(key: &str, e: io::Error) -> StoreError {
    match e.kind() {
        io::ErrorKind::StorageFull | io::ErrorKind::QuotaExceeded => StoreError::QuotaExceeded {
            key: key.to_string(),
        },
        io::ErrorKind::PermissionDenied => StoreError::MediumUnavailable(e.to_string()),
        _ => StoreError::Io(e),
    }
}

impl StorageMedium for FsMedium {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.file_path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(map_medium_err(key, e)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.ensure_root()?;

        let target_path = self.file_path(key);

        // Atomic write
        let tmp_path = self.root.join(format!(".{}-{}.tmp", key, Uuid::new_v4()));
        fs::write(&tmp_path, value).map_err(|e| map_medium_err(key, e))?;
        fs::rename(&tmp_path, target_path).map_err(|e| {
            // Leave no tmp file behind when the commit step fails.
            let _ = fs::remove_file(&tmp_path);
            map_medium_err(key, e)
        })?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.file_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(map_medium_err(key, e)),
        }
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let entries = fs::read_dir(&self.root).map_err(|e| map_medium_err("", e))?;

        for entry in entries {
            let entry = entry.map_err(StoreError::Io)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if let Some(key) = name.strip_suffix(".json") {
                if key.starts_with(prefix) {
                    keys.push(key.to_string());
                }
            }
        }
        Ok(keys)
    }
}
