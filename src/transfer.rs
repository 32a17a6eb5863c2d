//! Whole-store export and import as a single versioned JSON document.
//!
//! The document embeds a `version` so older exports stay readable as the
//! format evolves; a document newer than this build understands is refused
//! wholesale rather than half-applied. Import replaces exactly the kinds
//! present in the document and leaves absent kinds untouched, so a partial
//! export (`export_kind`) round-trips into a targeted restore.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::model::{
    AboutContent, BlogPost, ContactInfo, ContactMessage, EntityKind, HeroContent, MessageFilter,
    PostFilter, Project, ProjectFilter, Service, SystemSettings,
};
use crate::store::{ContentStore, StorageMedium};

/// Document version this build writes, and the newest it will read.
pub const SUPPORTED_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDocument {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub entities: TransferEntities,
}

/// One optional slot per entity kind, keyed like the medium namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferEntities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_content: Option<HeroContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_content: Option<AboutContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<Service>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<Project>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog_posts: Option<Vec<BlogPost>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_messages: Option<Vec<ContactMessage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_settings: Option<SystemSettings>,
}

impl TransferDocument {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Outcome of an import: how many entities landed, how many were dropped,
/// and a note per drop.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub applied: usize,
    pub rejected: usize,
    pub notes: Vec<String>,
}

/// Snapshot every entity kind into one document.
pub fn export_all<M: StorageMedium>(store: &ContentStore<M>) -> TransferDocument {
    TransferDocument {
        version: SUPPORTED_VERSION.to_string(),
        exported_at: Utc::now(),
        entities: TransferEntities {
            hero_content: Some(store.hero()),
            about_content: Some(store.about()),
            services: Some(store.services()),
            projects: Some(store.projects(&ProjectFilter::default())),
            blog_posts: Some(store.posts(&PostFilter::default())),
            contact_messages: Some(store.messages(&MessageFilter::default())),
            contact_info: Some(store.contact_info()),
            system_settings: Some(store.settings()),
        },
    }
}

/// Snapshot a single entity kind; the other slots stay empty.
pub fn export_kind<M: StorageMedium>(
    store: &ContentStore<M>,
    kind: EntityKind,
) -> TransferDocument {
    let mut entities = TransferEntities::default();
    match kind {
        EntityKind::Hero => entities.hero_content = Some(store.hero()),
        EntityKind::About => entities.about_content = Some(store.about()),
        EntityKind::Service => entities.services = Some(store.services()),
        EntityKind::Project => entities.projects = Some(store.projects(&ProjectFilter::default())),
        EntityKind::BlogPost => entities.blog_posts = Some(store.posts(&PostFilter::default())),
        EntityKind::ContactMessage => {
            entities.contact_messages = Some(store.messages(&MessageFilter::default()))
        }
        EntityKind::ContactInfo => entities.contact_info = Some(store.contact_info()),
        EntityKind::Settings => entities.system_settings = Some(store.settings()),
    }
    TransferDocument {
        version: SUPPORTED_VERSION.to_string(),
        exported_at: Utc::now(),
        entities,
    }
}

/// Apply a document to the store. Each kind present replaces the stored
/// value for that kind wholesale; ids and timestamps come through verbatim.
/// Collection items are validated one by one, so a bad entry drops only
/// itself. A document version newer than [`SUPPORTED_VERSION`] fails before
/// anything is touched.
pub fn import<M: StorageMedium>(
    store: &ContentStore<M>,
    document: TransferDocument,
) -> Result<ImportReport> {
    check_version(&document.version)?;

    let mut report = ImportReport::default();
    let entities = document.entities;

    if let Some(value) = entities.hero_content {
        import_singleton(&mut report, EntityKind::Hero, store.import_hero(value))?;
    }
    if let Some(value) = entities.about_content {
        import_singleton(&mut report, EntityKind::About, store.import_about(value))?;
    }
    if let Some(value) = entities.contact_info {
        import_singleton(
            &mut report,
            EntityKind::ContactInfo,
            store.import_contact_info(value),
        )?;
    }
    if let Some(value) = entities.system_settings {
        import_singleton(
            &mut report,
            EntityKind::Settings,
            store.import_settings(value),
        )?;
    }

    if let Some(items) = entities.services {
        let total = items.len();
        let applied = store.import_services(items, &mut report.notes)?;
        report.applied += applied;
        report.rejected += total - applied;
    }
    if let Some(items) = entities.projects {
        let total = items.len();
        let applied = store.import_projects(items, &mut report.notes)?;
        report.applied += applied;
        report.rejected += total - applied;
    }
    if let Some(items) = entities.blog_posts {
        let total = items.len();
        let applied = store.import_posts(items, &mut report.notes)?;
        report.applied += applied;
        report.rejected += total - applied;
    }
    if let Some(items) = entities.contact_messages {
        let total = items.len();
        let applied = store.import_messages(items, &mut report.notes)?;
        report.applied += applied;
        report.rejected += total - applied;
    }

    Ok(report)
}

/// A rejected singleton keeps the stored value; medium failures abort the
/// whole import.
fn import_singleton<T>(
    report: &mut ImportReport,
    kind: EntityKind,
    outcome: Result<T>,
) -> Result<()> {
    match outcome {
        Ok(_) => report.applied += 1,
        Err(StoreError::Validation(errors)) => {
            report.rejected += 1;
            report.notes.push(format!("{}: {}", kind, errors));
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

fn check_version(version: &str) -> Result<()> {
    let found = parse_version(version)?;
    let supported = parse_version(SUPPORTED_VERSION)?;
    if found > supported {
        return Err(StoreError::Versioning {
            found: version.to_string(),
            supported: SUPPORTED_VERSION.to_string(),
        });
    }
    Ok(())
}

fn parse_version(version: &str) -> Result<(u32, u32)> {
    let mut parts = version.split('.');
    let major = parts.next().and_then(|p| p.parse().ok());
    let minor = parts.next().and_then(|p| p.parse().ok());
    match (major, minor, parts.next()) {
        (Some(major), Some(minor), None) => Ok((major, minor)),
        _ => Err(StoreError::Versioning {
            found: version.to_string(),
            supported: SUPPORTED_VERSION.to_string(),
        }),
    }
}
