use super::medium::StorageMedium;
use crate::error::{Result, StoreError};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// In-memory storage medium for testing.
///
/// Uses `RefCell` for interior mutability since the store is single-threaded.
/// This avoids the overhead of a lock while still letting the
/// [`StorageMedium`] trait use `&self` for all methods.
///
/// Cloning shares the underlying map, so two [`super::ContentStore`]
/// instances over clones of one `MemMedium` model two tabs sharing a medium.
#[derive(Clone, Default)]
pub struct MemMedium {
    inner: Rc<MemInner>,
}

#[derive(Default)]
struct MemInner {
    entries: RefCell<BTreeMap<String, Vec<u8>>>,
    simulate_quota_error: RefCell<bool>,
    simulate_unavailable: RefCell<bool>,
}

impl MemMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `set` fail with a quota error.
    pub fn set_simulate_quota_error(&self, simulate: bool) {
        *self.inner.simulate_quota_error.borrow_mut() = simulate;
    }

    /// Take the whole medium down: every operation fails until cleared.
    pub fn set_simulate_unavailable(&self, simulate: bool) {
        *self.inner.simulate_unavailable.borrow_mut() = simulate;
    }

    /// Test helper: write a raw blob directly, bypassing failure toggles.
    /// Used to plant corrupt data for recovery tests.
    pub fn plant(&self, key: &str, value: &[u8]) {
        self.inner
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_vec());
    }

    fn check_available(&self) -> Result<()> {
        if *self.inner.simulate_unavailable.borrow() {
            return Err(StoreError::MediumUnavailable(
                "simulated medium outage".to_string(),
            ));
        }
        Ok(())
    }
}

impl StorageMedium for MemMedium {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_available()?;
        let entries = self.inner.entries.borrow();
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.check_available()?;
        if *self.inner.simulate_quota_error.borrow() {
            return Err(StoreError::QuotaExceeded {
                key: key.to_string(),
            });
        }
        let mut entries = self.inner.entries.borrow_mut();
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check_available()?;
        let mut entries = self.inner.entries.borrow_mut();
        entries.remove(key);
        Ok(())
    }

    fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.check_available()?;
        let entries = self.inner.entries.borrow();
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
