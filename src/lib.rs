//! # Folio Store Architecture
//!
//! Folio Store is an **embeddable bilingual content store** for personal
//! portfolio sites. It is not a web backend with a storage module bolted
//! on—it's a storage library that a web backend (or desktop shell, or static
//! site generator) embeds.
//!
//! Every piece of site content—hero banner, about section, services,
//! projects, blog posts, contact messages, contact details, site settings—is
//! held in Vietnamese and English side by side and survives restarts,
//! crashes, and the occasional corrupted write.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Host application (admin panel, public site, importer)      │
//! │  - Owns the UI, auth, and HTTP/IPC surface                  │
//! │  - The ONLY place that knows how content is displayed       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ContentStore (store/content_store.rs)                      │
//! │  - Typed operations per entity kind                         │
//! │  - Runs every mutation through one pipeline:                │
//! │    validate -> snapshot -> persist -> swap memory -> notify │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Support layers                                             │
//! │  - validate/: per-kind field rules + markup stripping       │
//! │  - backup: rolling pre-write snapshots, bounded per entity  │
//! │  - notify: synchronous change events for live UIs           │
//! │  - transfer: versioned whole-store export/import            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage layer (store/medium.rs)                            │
//! │  - Abstract StorageMedium trait (get/set/remove/list)       │
//! │  - FsMedium (production), MemMedium (testing, shared-state) │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Memory Is Truth, the Medium Is Durability
//!
//! The store hydrates once at open and serves every read from memory.
//! The medium is only touched to persist a mutation, to restore a backup,
//! and when another instance sharing the medium signals a write. A failed
//! persist leaves both the memory copy and the previously persisted blob
//! exactly as they were.
//!
//! ## Key Principle: Nothing Invalid Is Ever Persisted
//!
//! All writes funnel through the per-kind validators in [`validate`], which
//! also strip markup from free-text fields. Data that fails re-validation
//! when read back is treated as corruption and triggers the backup fallback
//! chain, so a valid store can always be opened.
//!
//! ## Testing Strategy
//!
//! 1. **Validators** (`validate/*.rs`): unit tests per rule, the bulk of
//!    the fine-grained coverage.
//! 2. **Store** (`store/content_store.rs`): pipeline behavior over
//!    [`store::MemMedium`], including simulated quota and unavailability.
//! 3. **Integration** (`tests/`): full flows over a real temp directory
//!    with [`store::FsMedium`], and export/import round trips.
//!
//! ## Module Overview
//!
//! - [`store`]: The [`store::ContentStore`] orchestrator—entry point for
//!   all operations—plus the medium trait and its two implementations
//! - [`model`]: Entity types, patch types, filters, and built-in defaults
//! - [`validate`]: Field validation and markup sanitization
//! - [`backup`]: Rolling snapshot retention and restore
//! - [`notify`]: Change events and subscriptions
//! - [`transfer`]: Versioned export/import documents
//! - [`config`]: Store configuration (file + environment)
//! - [`error`]: Error types

pub mod backup;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod store;
pub mod transfer;
pub mod validate;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
