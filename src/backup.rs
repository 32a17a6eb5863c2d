//! # Rolling Backups
//!
//! Before an entity blob is overwritten, the previously committed blob is
//! copied under `<entityKey>_backup_<millis>`. Only the newest `keep`
//! snapshots survive; pruning runs after every snapshot, so the bound is a
//! true invariant rather than eventually consistent.
//!
//! Snapshots are taken from the medium, not from memory, so a snapshot always
//! represents a previously committed, already validated state. A first-ever
//! write has no predecessor and takes no snapshot.
//!
//! Backups are best-effort: the store logs a snapshot failure and proceeds
//! with the primary write.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::error::{Result, StoreError};
use crate::store::StorageMedium;

const BACKUP_INFIX: &str = "_backup_";

/// One retained snapshot, newest-first in listings.
#[derive(Debug, Clone)]
pub struct BackupEntry {
    pub key: String,
    pub timestamp: DateTime<Utc>,
    pub value: Vec<u8>,
}

/// Snapshot policy for one store instance.
pub struct BackupManager {
    keep: usize,
}

impl BackupManager {
    pub fn new(keep: usize) -> Self {
        Self { keep }
    }

    pub fn keep(&self) -> usize {
        self.keep
    }

    /// Copy the currently persisted blob for `entity_key` into the backup
    /// namespace, then prune. Returns the new backup key, or `None` when
    /// nothing is persisted yet (first write).
    pub fn snapshot<M: StorageMedium>(
        &self,
        medium: &M,
        entity_key: &str,
    ) -> Result<Option<String>> {
        let Some(blob) = medium.get(entity_key)? else {
            return Ok(None);
        };

        let prefix = backup_prefix(entity_key);
        let taken: HashSet<i64> = medium
            .list_keys(&prefix)?
            .iter()
            .filter_map(|key| parse_stamp(&prefix, key))
            .collect();

        // Millisecond stamps collide under rapid writes; bump until free.
        let mut stamp = Utc::now().timestamp_millis();
        while taken.contains(&stamp) {
            stamp += 1;
        }

        let backup_key = format!("{}{}", prefix, stamp);
        medium.set(&backup_key, &blob)?;
        self.prune(medium, entity_key)?;
        Ok(Some(backup_key))
    }

    /// All snapshots for `entity_key`, newest first.
    pub fn list<M: StorageMedium>(&self, medium: &M, entity_key: &str) -> Result<Vec<BackupEntry>> {
        let prefix = backup_prefix(entity_key);
        let mut stamped: Vec<(i64, String)> = medium
            .list_keys(&prefix)?
            .into_iter()
            .filter_map(|key| parse_stamp(&prefix, &key).map(|stamp| (stamp, key)))
            .collect();
        stamped.sort_by(|a, b| b.0.cmp(&a.0));

        let mut entries = Vec::with_capacity(stamped.len());
        for (stamp, key) in stamped {
            let Some(value) = medium.get(&key)? else {
                continue;
            };
            let Some(timestamp) = DateTime::from_timestamp_millis(stamp) else {
                continue;
            };
            entries.push(BackupEntry {
                key,
                timestamp,
                value,
            });
        }
        Ok(entries)
    }

    /// Fetch a specific snapshot's blob. The key must belong to
    /// `entity_key`'s backup namespace.
    pub fn restore<M: StorageMedium>(
        &self,
        medium: &M,
        entity_key: &str,
        backup_key: &str,
    ) -> Result<Vec<u8>> {
        let prefix = backup_prefix(entity_key);
        if !backup_key.starts_with(&prefix) {
            return Err(StoreError::BackupMissing(backup_key.to_string()));
        }
        medium
            .get(backup_key)?
            .ok_or_else(|| StoreError::BackupMissing(backup_key.to_string()))
    }

    /// Delete all but the newest `keep` snapshots. Returns how many were
    /// removed.
    pub fn prune<M: StorageMedium>(&self, medium: &M, entity_key: &str) -> Result<usize> {
        let prefix = backup_prefix(entity_key);
        let mut stamped: Vec<(i64, String)> = medium
            .list_keys(&prefix)?
            .into_iter()
            .filter_map(|key| parse_stamp(&prefix, &key).map(|stamp| (stamp, key)))
            .collect();
        stamped.sort_by(|a, b| b.0.cmp(&a.0));

        let mut removed = 0;
        for (_, key) in stamped.into_iter().skip(self.keep) {
            medium.remove(&key)?;
            removed += 1;
        }
        Ok(removed)
    }
}

/// The backup-namespace prefix for an entity key.
pub fn backup_prefix(entity_key: &str) -> String {
    format!("{}{}", entity_key, BACKUP_INFIX)
}

/// True for keys in any entity's backup namespace. External-change handling
/// uses this to ignore snapshot writes.
pub fn is_backup_key(key: &str) -> bool {
    key.contains(BACKUP_INFIX)
}

fn parse_stamp(prefix: &str, key: &str) -> Option<i64> {
    key.strip_prefix(prefix)?.parse().ok()
}
