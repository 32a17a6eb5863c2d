use crate::error::Result;

/// Abstract interface for the durable key-value medium.
/// This trait handles the "how" of persistence (filesystem vs memory),
/// while [`super::ContentStore`] handles the "what" (entities, validation,
/// backups). Implementations know nothing about entity semantics; they move
/// opaque blobs under string keys.
pub trait StorageMedium {
    /// Read the blob under `key`.
    /// Returns Ok(None) if the key does not exist.
    /// Returns Err only on actual medium failures (permissions, outage).
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`.
    /// MUST be atomic from the caller's perspective (e.g. write to tmp then
    /// rename): either the new blob is fully committed or the prior one is
    /// retained. Quota exhaustion and medium outage surface as the distinct
    /// typed errors, never as silent truncation.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`. Removing an absent key is a no-op, not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// List all keys starting with `prefix`, in no particular order.
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;
}
