//! # Domain Model: Bilingual Portfolio Entities
//!
//! This module defines the eight entity kinds the store manages, the typed
//! partial patches used to mutate them, and the built-in defaults singletons
//! fall back to when nothing was ever written.
//!
//! ## Bilingual text
//!
//! Every piece of admin-authored copy is a [`LocalizedText`] pair
//! `{vi, en}`. The two languages are independent: validation checks each side
//! on its own, and a missing translation is a field error, never silently
//! inherited from the other language.
//!
//! ## Singletons vs collections
//!
//! | Kind | Shape | Medium key |
//! |------|-------|------------|
//! | Hero | singleton | `heroContent` |
//! | About | singleton | `aboutContent` |
//! | Service | collection | `services` |
//! | Project | collection | `projects` |
//! | BlogPost | collection | `blogPosts` |
//! | ContactMessage | collection | `contactMessages` |
//! | ContactInfo | singleton | `contactInfo` |
//! | Settings | singleton | `systemSettings` |
//!
//! Singletons exist from first write (or the built-in default) and are only
//! ever overwritten. Collection entries get a generated [`Uuid`] on create,
//! are mutated through their patch type, and are hard-deleted.
//!
//! ## Patches
//!
//! Mutations arrive as typed partial structures (every field optional) and
//! are merged field-by-field onto the current value with `merge`. Merging is
//! pure; the store validates the complete merged candidate before anything
//! is written. The patch types also encode immutability: `MessagePatch`
//! carries only the `read` flag, and `PostPatch` has no status or publish
//! date, so the publish/unpublish operations are the only state transition.
//!
//! Persisted JSON and the export document use camelCase field names.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A bilingual text pair. Both sides are validated independently.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    pub vi: String,
    pub en: String,
}

impl LocalizedText {
    pub fn new(vi: &str, en: &str) -> Self {
        Self {
            vi: vi.to_string(),
            en: en.to_string(),
        }
    }
}

/// The eight entity kinds managed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Hero,
    About,
    Service,
    Project,
    BlogPost,
    ContactMessage,
    ContactInfo,
    Settings,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Hero,
        EntityKind::About,
        EntityKind::Service,
        EntityKind::Project,
        EntityKind::BlogPost,
        EntityKind::ContactMessage,
        EntityKind::ContactInfo,
        EntityKind::Settings,
    ];

    /// The key this kind's blob lives under in the storage medium. Also the
    /// field name used for it in export documents.
    pub fn key(self) -> &'static str {
        match self {
            EntityKind::Hero => "heroContent",
            EntityKind::About => "aboutContent",
            EntityKind::Service => "services",
            EntityKind::Project => "projects",
            EntityKind::BlogPost => "blogPosts",
            EntityKind::ContactMessage => "contactMessages",
            EntityKind::ContactInfo => "contactInfo",
            EntityKind::Settings => "systemSettings",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        EntityKind::ALL.into_iter().find(|k| k.key() == key)
    }

    /// Collections hold many id-addressed entries; singletons hold one value.
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            EntityKind::Service
                | EntityKind::Project
                | EntityKind::BlogPost
                | EntityKind::ContactMessage
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Vi,
    En,
}

impl Default for Lang {
    fn default() -> Self {
        Self::Vi
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Default for Theme {
    fn default() -> Self {
        Self::Light
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl Default for PostStatus {
    fn default() -> Self {
        Self::Draft
    }
}

// =============================================================================
// Singletons
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroContent {
    pub greeting: LocalizedText,
    pub name: LocalizedText,
    pub title: LocalizedText,
    pub subtitle: LocalizedText,
    pub cta_text: LocalizedText,
    pub cta_link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroPatch {
    pub greeting: Option<LocalizedText>,
    pub name: Option<LocalizedText>,
    pub title: Option<LocalizedText>,
    pub subtitle: Option<LocalizedText>,
    pub cta_text: Option<LocalizedText>,
    pub cta_link: Option<String>,
}

impl HeroContent {
    pub fn merge(&self, patch: &HeroPatch) -> HeroContent {
        HeroContent {
            greeting: patch.greeting.clone().unwrap_or_else(|| self.greeting.clone()),
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            title: patch.title.clone().unwrap_or_else(|| self.title.clone()),
            subtitle: patch.subtitle.clone().unwrap_or_else(|| self.subtitle.clone()),
            cta_text: patch.cta_text.clone().unwrap_or_else(|| self.cta_text.clone()),
            cta_link: patch.cta_link.clone().unwrap_or_else(|| self.cta_link.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutContent {
    /// Markdown body. Sanitized on write (raw HTML stripped).
    pub description: LocalizedText,
    pub experience: LocalizedText,
    /// Opaque stored-reference string from the upload collaborator. May be
    /// empty unless the `require_profile_image` policy is on.
    pub profile_image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutPatch {
    pub description: Option<LocalizedText>,
    pub experience: Option<LocalizedText>,
    pub profile_image: Option<String>,
}

impl AboutContent {
    pub fn merge(&self, patch: &AboutPatch) -> AboutContent {
        AboutContent {
            description: patch
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            experience: patch
                .experience
                .clone()
                .unwrap_or_else(|| self.experience.clone()),
            profile_image: patch
                .profile_image
                .clone()
                .unwrap_or_else(|| self.profile_image.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub email: String,
    pub phone: String,
    pub github: Option<String>,
    pub linkedin: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfoPatch {
    pub email: Option<String>,
    pub phone: Option<String>,
    /// An empty string clears the profile link.
    pub github: Option<String>,
    pub linkedin: Option<String>,
}

impl ContactInfo {
    pub fn merge(&self, patch: &ContactInfoPatch) -> ContactInfo {
        ContactInfo {
            email: patch.email.clone().unwrap_or_else(|| self.email.clone()),
            phone: patch.phone.clone().unwrap_or_else(|| self.phone.clone()),
            github: merge_clearable(&self.github, &patch.github),
            linkedin: merge_clearable(&self.linkedin, &patch.linkedin),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSettings {
    pub default_language: Lang,
    pub default_theme: Theme,
    /// Site accent palette, hex color codes. Size bounded to [4, 16].
    pub color_palette: Vec<String>,
    pub maintenance_mode: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub default_language: Option<Lang>,
    pub default_theme: Option<Theme>,
    pub color_palette: Option<Vec<String>>,
    pub maintenance_mode: Option<bool>,
}

impl SystemSettings {
    pub fn merge(&self, patch: &SettingsPatch) -> SystemSettings {
        SystemSettings {
            default_language: patch.default_language.unwrap_or(self.default_language),
            default_theme: patch.default_theme.unwrap_or(self.default_theme),
            color_palette: patch
                .color_palette
                .clone()
                .unwrap_or_else(|| self.color_palette.clone()),
            maintenance_mode: patch.maintenance_mode.unwrap_or(self.maintenance_mode),
        }
    }
}

// =============================================================================
// Collections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub title: LocalizedText,
    pub description: LocalizedText,
    /// Icon name as understood by the rendering layer, e.g. `"code"`.
    pub icon: String,
    pub color: String,
    pub bg_color: String,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Candidate for a new service. The store assigns id, order (unless given)
/// and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewService {
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub icon: String,
    pub color: String,
    pub bg_color: String,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePatch {
    pub title: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub bg_color: Option<String>,
    pub order: Option<i64>,
}

impl Service {
    pub fn new(input: NewService, order: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            icon: input.icon,
            color: input.color,
            bg_color: input.bg_color,
            order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn merge(&self, patch: &ServicePatch) -> Service {
        Service {
            id: self.id,
            title: patch.title.clone().unwrap_or_else(|| self.title.clone()),
            description: patch
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            icon: patch.icon.clone().unwrap_or_else(|| self.icon.clone()),
            color: patch.color.clone().unwrap_or_else(|| self.color.clone()),
            bg_color: patch.bg_color.clone().unwrap_or_else(|| self.bg_color.clone()),
            order: patch.order.unwrap_or(self.order),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub image: String,
    /// Gallery references beyond the cover image.
    #[serde(default)]
    pub images: Vec<String>,
    pub link: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub category: String,
    pub featured: bool,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub title: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    /// An empty string clears the link.
    pub link: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub order: Option<i64>,
}

impl Project {
    pub fn new(input: NewProject, order: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            image: input.image,
            images: input.images,
            link: input.link,
            technologies: input.technologies,
            category: input.category,
            featured: input.featured,
            order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn merge(&self, patch: &ProjectPatch) -> Project {
        Project {
            id: self.id,
            title: patch.title.clone().unwrap_or_else(|| self.title.clone()),
            description: patch
                .description
                .clone()
                .unwrap_or_else(|| self.description.clone()),
            image: patch.image.clone().unwrap_or_else(|| self.image.clone()),
            images: patch.images.clone().unwrap_or_else(|| self.images.clone()),
            link: merge_clearable(&self.link, &patch.link),
            technologies: patch
                .technologies
                .clone()
                .unwrap_or_else(|| self.technologies.clone()),
            category: patch.category.clone().unwrap_or_else(|| self.category.clone()),
            featured: patch.featured.unwrap_or(self.featured),
            order: patch.order.unwrap_or(self.order),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: LocalizedText,
    /// Markdown body. Sanitized on write.
    pub content: LocalizedText,
    pub excerpt: LocalizedText,
    pub thumbnail: String,
    pub status: PostStatus,
    /// Set on publish, cleared on unpublish. `Some` iff published.
    pub publish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New posts always start as drafts with no publish date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: LocalizedText,
    pub content: LocalizedText,
    pub excerpt: LocalizedText,
    pub thumbnail: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Deliberately has no status or publish date field. The only way to move a
/// post between draft and published is through the publish/unpublish
/// operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    pub title: Option<LocalizedText>,
    pub content: Option<LocalizedText>,
    pub excerpt: Option<LocalizedText>,
    pub thumbnail: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl BlogPost {
    pub fn new(input: NewPost) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            content: input.content,
            excerpt: input.excerpt,
            thumbnail: input.thumbnail,
            status: PostStatus::Draft,
            publish_date: None,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn merge(&self, patch: &PostPatch) -> BlogPost {
        BlogPost {
            id: self.id,
            title: patch.title.clone().unwrap_or_else(|| self.title.clone()),
            content: patch.content.clone().unwrap_or_else(|| self.content.clone()),
            excerpt: patch.excerpt.clone().unwrap_or_else(|| self.excerpt.clone()),
            thumbnail: patch.thumbnail.clone().unwrap_or_else(|| self.thumbnail.clone()),
            status: self.status,
            publish_date: self.publish_date,
            tags: patch.tags.clone().unwrap_or_else(|| self.tags.clone()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Messages are immutable once received except for the read flag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePatch {
    pub read: Option<bool>,
}

impl ContactMessage {
    pub fn new(input: NewMessage) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            email: input.email,
            message: input.message,
            timestamp: Utc::now(),
            read: false,
        }
    }

    pub fn merge(&self, patch: &MessagePatch) -> ContactMessage {
        ContactMessage {
            read: patch.read.unwrap_or(self.read),
            ..self.clone()
        }
    }
}

// Patch semantics for optional links: absent keeps the current value, an
// empty or blank string clears it.
fn merge_clearable(current: &Option<String>, patch: &Option<String>) -> Option<String> {
    match patch {
        None => current.clone(),
        Some(s) if s.trim().is_empty() => None,
        Some(s) => Some(s.clone()),
    }
}

// =============================================================================
// List filters
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub category: Option<String>,
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub unread_only: bool,
}

// =============================================================================
// Built-in defaults
// =============================================================================

// Singleton fallbacks for a fresh medium or an unrecoverable blob. These must
// pass their own validators (covered by tests in the validate module).

static DEFAULT_HERO: Lazy<HeroContent> = Lazy::new(|| HeroContent {
    greeting: LocalizedText::new("Xin chào, tôi là", "Hi, my name is"),
    name: LocalizedText::new("Chủ trang", "Site Owner"),
    title: LocalizedText::new("Lập trình viên", "Software Developer"),
    subtitle: LocalizedText::new(
        "Tôi xây dựng các ứng dụng web hiện đại.",
        "I build modern web applications.",
    ),
    cta_text: LocalizedText::new("Xem dự án", "View projects"),
    cta_link: "#projects".to_string(),
});

static DEFAULT_ABOUT: Lazy<AboutContent> = Lazy::new(|| AboutContent {
    description: LocalizedText::new(
        "Giới thiệu đang được cập nhật.",
        "This introduction is being written.",
    ),
    experience: LocalizedText::new(
        "Kinh nghiệm đang được cập nhật.",
        "Experience details coming soon.",
    ),
    profile_image: String::new(),
});

static DEFAULT_CONTACT_INFO: Lazy<ContactInfo> = Lazy::new(|| ContactInfo {
    email: "hello@example.com".to_string(),
    phone: String::new(),
    github: None,
    linkedin: None,
});

static DEFAULT_SETTINGS: Lazy<SystemSettings> = Lazy::new(|| SystemSettings {
    default_language: Lang::Vi,
    default_theme: Theme::Light,
    color_palette: vec![
        "#0f172a".to_string(),
        "#1e40af".to_string(),
        "#38bdf8".to_string(),
        "#f8fafc".to_string(),
    ],
    maintenance_mode: false,
});

impl Default for HeroContent {
    fn default() -> Self {
        DEFAULT_HERO.clone()
    }
}

impl Default for AboutContent {
    fn default() -> Self {
        DEFAULT_ABOUT.clone()
    }
}

impl Default for ContactInfo {
    fn default() -> Self {
        DEFAULT_CONTACT_INFO.clone()
    }
}

impl Default for SystemSettings {
    fn default() -> Self {
        DEFAULT_SETTINGS.clone()
    }
}
