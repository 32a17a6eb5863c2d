use thiserror::Error;
use uuid::Uuid;

use crate::model::EntityKind;
use crate::validate::FieldErrors;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Entity not found: {kind} {id}")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("Storage quota exceeded while writing '{key}'")]
    QuotaExceeded { key: String },

    #[error("Storage medium unavailable: {0}")]
    MediumUnavailable(String),

    #[error("Corrupt data under '{key}': {reason}")]
    Corruption { key: String, reason: String },

    #[error("Unsupported document version {found} (supported up to {supported})")]
    Versioning { found: String, supported: String },

    #[error("Backup not found: {0}")]
    BackupMissing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
