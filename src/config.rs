//! # Configuration
//!
//! Store behavior knobs, managed by [`confique`] with layered loading:
//!
//! 1. **Environment variables**: `FOLIO_STORE_DATA_DIR` (primarily for testing).
//! 2. **Config file**: an optional TOML file supplied by the host application.
//! 3. **Compiled defaults**: built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `backup_keep` | `5` | Rolling snapshots retained per entity key |
//! | `require_profile_image` | `false` | Reject About content without an image reference |
//! | `data_dir` | OS data dir | Root directory for the on-disk medium |

use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// How many rolling snapshots to retain per entity key. Older ones are
    /// pruned after every new snapshot.
    #[config(default = 5)]
    pub backup_keep: usize,

    /// When true, About content must carry a non-empty profile image
    /// reference to pass validation.
    #[config(default = false)]
    pub require_profile_image: bool,

    /// Root directory for the on-disk medium. When absent, the
    /// OS-appropriate data directory is used.
    #[config(env = "FOLIO_STORE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backup_keep: 5,
            require_profile_image: false,
            data_dir: None,
        }
    }
}

impl StoreConfig {
    /// Load configuration from the environment and an optional TOML file.
    /// A missing file is fine; a malformed one falls back to defaults with a
    /// logged warning rather than blocking startup.
    pub fn load(file: Option<&Path>) -> StoreConfig {
        let mut builder = StoreConfig::builder().env();
        if let Some(file) = file {
            builder = builder.file(file);
        }
        builder.load().unwrap_or_else(|e| {
            log::warn!("Failed to load store config: {e}. Using defaults.");
            StoreConfig::default()
        })
    }

    /// Retention count, floored at 1 so the newest snapshot always survives.
    pub fn backup_keep(&self) -> usize {
        self.backup_keep.max(1)
    }

    /// Resolved medium root: the configured directory, or the
    /// OS-appropriate data directory.
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => {
                let proj_dirs = ProjectDirs::from("com", "folio", "folio-store")
                    .expect("Could not determine data dir");
                proj_dirs.data_dir().to_path_buf()
            }
        }
    }
}
