use crate::config::StoreConfig;
use crate::store::{ContentStore, FsMedium};
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    // We keep _temp_dir to ensure the directory is not dropped until the test is done
    pub _temp_dir: TempDir,
    pub store: ContentStore<FsMedium>,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let store = ContentStore::open(FsMedium::new(root.clone()), config)
            .expect("failed to open store");
        Self {
            _temp_dir: temp_dir,
            store,
            root,
        }
    }

    /// Drop the store and open a fresh one over the same directory, as a
    /// process restart would. The configuration carries over.
    pub fn reopen(self) -> Self {
        let Self {
            _temp_dir,
            store,
            root,
        } = self;
        let config = store.config().clone();
        drop(store);
        let store = ContentStore::open(FsMedium::new(root.clone()), config)
            .expect("failed to reopen store");
        Self {
            _temp_dir,
            store,
            root,
        }
    }
}
