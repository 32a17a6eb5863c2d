//! # Storage Layer
//!
//! This module defines the durability abstraction and the orchestrating
//! [`ContentStore`]. The [`StorageMedium`] trait handles the "how" of storage
//! (filesystem vs memory), while the store handles the "what" (validation,
//! backups, events, recovery).
//!
//! ## Ownership model
//!
//! The store holds the authoritative in-memory copy of every entity:
//!
//! 1. **Truth (runtime)**: the in-memory state, hydrated once at open.
//! 2. **Durability**: the medium, written through on every mutation.
//!
//! Reads never touch the medium on the hot path. The medium is read at
//! bootstrap, on an explicit backup restore, and when a second instance
//! sharing the medium signals an external write.
//!
//! ## Write pipeline
//!
//! Every mutation runs the same sequence:
//!
//! ```text
//! validate -> snapshot pre-write blob -> medium.set -> swap memory -> notify
//! ```
//!
//! A validation failure stops before the snapshot; a failed `set` leaves both
//! the memory copy and the previously persisted blob untouched, so callers
//! never observe a half-applied state.
//!
//! ## Recovery
//!
//! At open, each entity key is loaded with a fallback chain: the current blob,
//! else the newest parseable backup, else the built-in default. Which source
//! won is recorded in a [`BootstrapReport`] and logged.
//!
//! ## Key namespace
//!
//! ```text
//! heroContent                     # entity blob (one JSON document per kind)
//! heroContent_backup_1714060800000
//! services                        # collections persist as one array blob
//! services_backup_1714060912345
//! ```
//!
//! ## Implementations
//!
//! - [`FsMedium`]: file-per-key under a root directory, atomic tmp+rename
//!   writes.
//! - [`MemMedium`]: in-memory medium for tests; cloning shares the map so a
//!   second store instance models a second tab.

pub mod content_store;
pub mod fs_medium;
pub mod medium;
pub mod mem_medium;

pub use content_store::ContentStore;
pub use fs_medium::FsMedium;
pub use medium::StorageMedium;
pub use mem_medium::MemMedium;

use std::collections::HashMap;

use crate::model::EntityKind;

/// Where an entity's bootstrap value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapSource {
    /// The persisted blob parsed and validated.
    Current,
    /// The persisted blob was unusable; a backup snapshot was loaded.
    Backup,
    /// Nothing usable was persisted; the built-in default (or an empty
    /// collection) was used.
    Default,
}

/// What the fallback chain did for each entity kind at open.
#[derive(Debug, Clone, Default)]
pub struct BootstrapReport {
    sources: HashMap<EntityKind, BootstrapSource>,
    /// Human-readable notes for every fallback that occurred.
    pub notes: Vec<String>,
}

impl BootstrapReport {
    pub fn source(&self, kind: EntityKind) -> BootstrapSource {
        self.sources
            .get(&kind)
            .copied()
            .unwrap_or(BootstrapSource::Default)
    }

    /// True when every kind loaded from its current blob or a fresh default
    /// without any corruption note.
    pub fn clean(&self) -> bool {
        self.notes.is_empty()
    }

    pub(crate) fn record(&mut self, kind: EntityKind, source: BootstrapSource) {
        self.sources.insert(kind, source);
    }

    pub(crate) fn note(&mut self, message: String) {
        log::warn!("{}", message);
        self.notes.push(message);
    }
}

/// Result of an integrity check for one entity kind.
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub kind: EntityKind,
    /// Human-readable findings; empty means the persisted blob matches the
    /// in-memory copy and re-validates.
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}
