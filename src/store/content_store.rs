//! The orchestrating store: typed operations over the in-memory state, with
//! the validate -> snapshot -> persist -> swap -> notify pipeline around
//! every mutation. See the parent module doc for the architecture.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cell::RefCell;
use uuid::Uuid;

use super::medium::StorageMedium;
use super::{BootstrapReport, BootstrapSource, FsMedium, IntegrityReport};
use crate::backup::{self, BackupEntry, BackupManager};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::model::{
    AboutContent, AboutPatch, BlogPost, ContactInfo, ContactInfoPatch, ContactMessage, EntityKind,
    HeroContent, HeroPatch, MessageFilter, MessagePatch, NewMessage, NewPost, NewProject,
    NewService, PostFilter, PostPatch, PostStatus, Project, ProjectFilter, ProjectPatch, Service,
    ServicePatch, SettingsPatch, SystemSettings,
};
use crate::notify::{ChangeEvent, ChangeNotifier, ChangeOp, SubscriptionToken};
use crate::validate::{self, FieldErrors};

/// The in-memory authoritative copy of all eight entity kinds.
#[derive(Debug, Default)]
struct StoreState {
    hero: HeroContent,
    about: AboutContent,
    services: Vec<Service>,
    projects: Vec<Project>,
    posts: Vec<BlogPost>,
    messages: Vec<ContactMessage>,
    contact_info: ContactInfo,
    settings: SystemSettings,
}

/// The content store. Construct one per process/session with [`open`] and
/// pass it by reference to consumers; tests construct isolated instances
/// over a [`super::MemMedium`].
///
/// All methods take `&self`: the store is single-threaded and uses interior
/// mutability, mirroring the medium trait.
///
/// [`open`]: ContentStore::open
pub struct ContentStore<M: StorageMedium> {
    medium: M,
    state: RefCell<StoreState>,
    backups: BackupManager,
    notifier: ChangeNotifier,
    config: StoreConfig,
    bootstrap: BootstrapReport,
}

impl ContentStore<FsMedium> {
    /// Open a store over the on-disk medium at the configured data
    /// directory.
    pub fn open_default(config: StoreConfig) -> Result<Self> {
        let medium = FsMedium::new(config.data_dir());
        Self::open(medium, config)
    }
}

impl<M: StorageMedium> ContentStore<M> {
    /// Hydrate the store from the medium. Each entity key is loaded with the
    /// fallback chain current blob -> newest usable backup -> built-in
    /// default; whatever the chain did is recorded in the bootstrap report.
    pub fn open(medium: M, config: StoreConfig) -> Result<Self> {
        let backups = BackupManager::new(config.backup_keep());
        let mut report = BootstrapReport::default();

        // The profile image policy gates authored writes, not loads, so
        // data predating the policy still opens.
        let state = StoreState {
            hero: load_singleton(&medium, &backups, EntityKind::Hero, &mut report, |v| {
                validate::hero::validate(v)
            })?,
            about: load_singleton(&medium, &backups, EntityKind::About, &mut report, |v| {
                validate::about::validate(v, false)
            })?,
            services: load_collection(&medium, &backups, EntityKind::Service, &mut report, |v| {
                validate::service::validate(v)
            })?,
            projects: load_collection(&medium, &backups, EntityKind::Project, &mut report, |v| {
                validate::project::validate(v)
            })?,
            posts: load_collection(&medium, &backups, EntityKind::BlogPost, &mut report, |v| {
                validate::blog_post::validate(v)
            })?,
            messages: load_collection(
                &medium,
                &backups,
                EntityKind::ContactMessage,
                &mut report,
                |v| validate::contact_message::validate(v),
            )?,
            contact_info: load_singleton(
                &medium,
                &backups,
                EntityKind::ContactInfo,
                &mut report,
                |v| validate::contact_info::validate(v),
            )?,
            settings: load_singleton(&medium, &backups, EntityKind::Settings, &mut report, |v| {
                validate::settings::validate(v)
            })?,
        };

        Ok(Self {
            medium,
            state: RefCell::new(state),
            backups,
            notifier: ChangeNotifier::new(),
            config,
            bootstrap: report,
        })
    }

    /// What the fallback chain did at open.
    pub fn bootstrap_report(&self) -> &BootstrapReport {
        &self.bootstrap
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // --- Subscriptions -----------------------------------------------------

    pub fn subscribe(
        &self,
        kind: EntityKind,
        handler: impl Fn(&ChangeEvent) + 'static,
    ) -> SubscriptionToken {
        self.notifier.subscribe(kind, handler)
    }

    pub fn subscribe_all(&self, handler: impl Fn(&ChangeEvent) + 'static) -> SubscriptionToken {
        self.notifier.subscribe_all(handler)
    }

    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.notifier.unsubscribe(token)
    }

    // --- Singletons --------------------------------------------------------

    pub fn hero(&self) -> HeroContent {
        self.state.borrow().hero.clone()
    }

    pub fn update_hero(&self, patch: HeroPatch) -> Result<HeroContent> {
        let candidate = self.state.borrow().hero.merge(&patch);
        let clean = validate::hero::validate(&candidate).map_err(StoreError::Validation)?;
        self.apply_singleton(EntityKind::Hero, clean, ChangeOp::Updated, |state, value| {
            state.hero = value
        })
    }

    pub fn about(&self) -> AboutContent {
        self.state.borrow().about.clone()
    }

    pub fn update_about(&self, patch: AboutPatch) -> Result<AboutContent> {
        let candidate = self.state.borrow().about.merge(&patch);
        let clean = validate::about::validate(&candidate, self.config.require_profile_image)
            .map_err(StoreError::Validation)?;
        self.apply_singleton(EntityKind::About, clean, ChangeOp::Updated, |state, value| {
            state.about = value
        })
    }

    pub fn contact_info(&self) -> ContactInfo {
        self.state.borrow().contact_info.clone()
    }

    pub fn update_contact_info(&self, patch: ContactInfoPatch) -> Result<ContactInfo> {
        let candidate = self.state.borrow().contact_info.merge(&patch);
        let clean = validate::contact_info::validate(&candidate).map_err(StoreError::Validation)?;
        self.apply_singleton(
            EntityKind::ContactInfo,
            clean,
            ChangeOp::Updated,
            |state, value| state.contact_info = value,
        )
    }

    pub fn settings(&self) -> SystemSettings {
        self.state.borrow().settings.clone()
    }

    pub fn update_settings(&self, patch: SettingsPatch) -> Result<SystemSettings> {
        let candidate = self.state.borrow().settings.merge(&patch);
        let clean = validate::settings::validate(&candidate).map_err(StoreError::Validation)?;
        self.apply_singleton(
            EntityKind::Settings,
            clean,
            ChangeOp::Updated,
            |state, value| state.settings = value,
        )
    }

    // --- Services ----------------------------------------------------------

    /// All services, sorted by explicit order (ties by creation time).
    pub fn services(&self) -> Vec<Service> {
        let mut list = self.state.borrow().services.clone();
        list.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
        list
    }

    pub fn create_service(&self, input: NewService) -> Result<Service> {
        let order = match input.order {
            Some(order) => order,
            None => next_order(self.state.borrow().services.iter().map(|s| s.order)),
        };
        let clean =
            validate::service::validate(&Service::new(input, order)).map_err(StoreError::Validation)?;

        let mut services = self.state.borrow().services.clone();
        services.push(clean.clone());
        let payload = serde_json::to_value(&clean)?;
        self.apply_collection(
            EntityKind::Service,
            services,
            ChangeOp::Created,
            payload,
            |state, list| state.services = list,
        )?;
        Ok(clean)
    }

    pub fn update_service(&self, id: Uuid, patch: ServicePatch) -> Result<Service> {
        let current = self.find_service(id)?;
        let clean =
            validate::service::validate(&current.merge(&patch)).map_err(StoreError::Validation)?;
        let clean = stamped_service(clean);

        let mut services = self.state.borrow().services.clone();
        replace_by(&mut services, |s| s.id == id, clean.clone());
        let payload = serde_json::to_value(&clean)?;
        self.apply_collection(
            EntityKind::Service,
            services,
            ChangeOp::Updated,
            payload,
            |state, list| state.services = list,
        )?;
        Ok(clean)
    }

    /// Hard delete. Returns false (not an error) when the id is unknown, so
    /// deletion is idempotent.
    pub fn remove_service(&self, id: Uuid) -> Result<bool> {
        let mut services = self.state.borrow().services.clone();
        let before = services.len();
        services.retain(|s| s.id != id);
        if services.len() == before {
            return Ok(false);
        }
        self.apply_collection(
            EntityKind::Service,
            services,
            ChangeOp::Removed,
            serde_json::json!({ "id": id }),
            |state, list| state.services = list,
        )?;
        Ok(true)
    }

    /// Reassign order to match list position for every listed id. Unknown
    /// ids are skipped; unlisted items keep their order. Returns false (no
    /// persist, no event) when the permutation changes nothing.
    pub fn reorder_services(&self, ids: &[Uuid]) -> Result<bool> {
        let mut services = self.state.borrow().services.clone();
        let moved = assign_positions(
            &mut services,
            ids,
            |s| s.id,
            |s| s.order,
            |s, order| {
                s.order = order;
                s.updated_at = chrono::Utc::now();
            },
        );
        if !moved {
            return Ok(false);
        }
        self.apply_collection(
            EntityKind::Service,
            services,
            ChangeOp::Reordered,
            serde_json::to_value(ids)?,
            |state, list| state.services = list,
        )?;
        Ok(true)
    }

    /// Apply one patch to every listed id. Each id is merged and validated
    /// independently; failures don't roll back the rest. One commit, one
    /// event. Returns the count of successful applications.
    pub fn bulk_update_services(&self, ids: &[Uuid], patch: &ServicePatch) -> Result<usize> {
        let mut services = self.state.borrow().services.clone();
        let mut applied_ids = Vec::new();
        for id in ids {
            let Some(pos) = services.iter().position(|s| s.id == *id) else {
                continue;
            };
            if let Ok(clean) = validate::service::validate(&services[pos].merge(patch)) {
                services[pos] = stamped_service(clean);
                applied_ids.push(*id);
            }
        }
        if applied_ids.is_empty() {
            return Ok(0);
        }
        let applied = applied_ids.len();
        self.apply_collection(
            EntityKind::Service,
            services,
            ChangeOp::Updated,
            serde_json::to_value(&applied_ids)?,
            |state, list| state.services = list,
        )?;
        Ok(applied)
    }

    // --- Projects ----------------------------------------------------------

    pub fn projects(&self, filter: &ProjectFilter) -> Vec<Project> {
        let mut list: Vec<Project> = self
            .state
            .borrow()
            .projects
            .iter()
            .filter(|p| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|category| &p.category == category)
                    && filter.featured.is_none_or(|featured| p.featured == featured)
            })
            .cloned()
            .collect();
        list.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
        list
    }

    pub fn create_project(&self, input: NewProject) -> Result<Project> {
        let order = match input.order {
            Some(order) => order,
            None => next_order(self.state.borrow().projects.iter().map(|p| p.order)),
        };
        let clean =
            validate::project::validate(&Project::new(input, order)).map_err(StoreError::Validation)?;

        let mut projects = self.state.borrow().projects.clone();
        projects.push(clean.clone());
        let payload = serde_json::to_value(&clean)?;
        self.apply_collection(
            EntityKind::Project,
            projects,
            ChangeOp::Created,
            payload,
            |state, list| state.projects = list,
        )?;
        Ok(clean)
    }

    pub fn update_project(&self, id: Uuid, patch: ProjectPatch) -> Result<Project> {
        let current = self.find_project(id)?;
        let clean =
            validate::project::validate(&current.merge(&patch)).map_err(StoreError::Validation)?;
        let clean = stamped_project(clean);

        let mut projects = self.state.borrow().projects.clone();
        replace_by(&mut projects, |p| p.id == id, clean.clone());
        let payload = serde_json::to_value(&clean)?;
        self.apply_collection(
            EntityKind::Project,
            projects,
            ChangeOp::Updated,
            payload,
            |state, list| state.projects = list,
        )?;
        Ok(clean)
    }

    pub fn remove_project(&self, id: Uuid) -> Result<bool> {
        let mut projects = self.state.borrow().projects.clone();
        let before = projects.len();
        projects.retain(|p| p.id != id);
        if projects.len() == before {
            return Ok(false);
        }
        self.apply_collection(
            EntityKind::Project,
            projects,
            ChangeOp::Removed,
            serde_json::json!({ "id": id }),
            |state, list| state.projects = list,
        )?;
        Ok(true)
    }

    pub fn reorder_projects(&self, ids: &[Uuid]) -> Result<bool> {
        let mut projects = self.state.borrow().projects.clone();
        let moved = assign_positions(
            &mut projects,
            ids,
            |p| p.id,
            |p| p.order,
            |p, order| {
                p.order = order;
                p.updated_at = chrono::Utc::now();
            },
        );
        if !moved {
            return Ok(false);
        }
        self.apply_collection(
            EntityKind::Project,
            projects,
            ChangeOp::Reordered,
            serde_json::to_value(ids)?,
            |state, list| state.projects = list,
        )?;
        Ok(true)
    }

    pub fn bulk_update_projects(&self, ids: &[Uuid], patch: &ProjectPatch) -> Result<usize> {
        let mut projects = self.state.borrow().projects.clone();
        let mut applied_ids = Vec::new();
        for id in ids {
            let Some(pos) = projects.iter().position(|p| p.id == *id) else {
                continue;
            };
            if let Ok(clean) = validate::project::validate(&projects[pos].merge(patch)) {
                projects[pos] = stamped_project(clean);
                applied_ids.push(*id);
            }
        }
        if applied_ids.is_empty() {
            return Ok(0);
        }
        let applied = applied_ids.len();
        self.apply_collection(
            EntityKind::Project,
            projects,
            ChangeOp::Updated,
            serde_json::to_value(&applied_ids)?,
            |state, list| state.projects = list,
        )?;
        Ok(applied)
    }

    // --- Blog posts --------------------------------------------------------

    /// Posts matching the filter, newest first.
    pub fn posts(&self, filter: &PostFilter) -> Vec<BlogPost> {
        let mut list: Vec<BlogPost> = self
            .state
            .borrow()
            .posts
            .iter()
            .filter(|p| {
                filter.status.is_none_or(|status| p.status == status)
                    && filter
                        .tag
                        .as_ref()
                        .is_none_or(|tag| p.tags.iter().any(|t| t == tag))
            })
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    pub fn create_post(&self, input: NewPost) -> Result<BlogPost> {
        let clean =
            validate::blog_post::validate(&BlogPost::new(input)).map_err(StoreError::Validation)?;

        let mut posts = self.state.borrow().posts.clone();
        posts.push(clean.clone());
        let payload = serde_json::to_value(&clean)?;
        self.apply_collection(
            EntityKind::BlogPost,
            posts,
            ChangeOp::Created,
            payload,
            |state, list| state.posts = list,
        )?;
        Ok(clean)
    }

    pub fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<BlogPost> {
        let current = self.find_post(id)?;
        let clean =
            validate::blog_post::validate(&current.merge(&patch)).map_err(StoreError::Validation)?;
        let clean = stamped_post(clean);

        let mut posts = self.state.borrow().posts.clone();
        replace_by(&mut posts, |p| p.id == id, clean.clone());
        let payload = serde_json::to_value(&clean)?;
        self.apply_collection(
            EntityKind::BlogPost,
            posts,
            ChangeOp::Updated,
            payload,
            |state, list| state.posts = list,
        )?;
        Ok(clean)
    }

    pub fn remove_post(&self, id: Uuid) -> Result<bool> {
        let mut posts = self.state.borrow().posts.clone();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            return Ok(false);
        }
        self.apply_collection(
            EntityKind::BlogPost,
            posts,
            ChangeOp::Removed,
            serde_json::json!({ "id": id }),
            |state, list| state.posts = list,
        )?;
        Ok(true)
    }

    /// Move a post to published and stamp the publish date. Re-publishing an
    /// already published post succeeds and refreshes the date.
    pub fn publish_post(&self, id: Uuid) -> Result<BlogPost> {
        let mut candidate = self.find_post(id)?;
        candidate.status = PostStatus::Published;
        candidate.publish_date = Some(chrono::Utc::now());
        self.transition_post(candidate)
    }

    /// Move a post back to draft and clear the publish date.
    pub fn unpublish_post(&self, id: Uuid) -> Result<BlogPost> {
        let mut candidate = self.find_post(id)?;
        candidate.status = PostStatus::Draft;
        candidate.publish_date = None;
        self.transition_post(candidate)
    }

    fn transition_post(&self, candidate: BlogPost) -> Result<BlogPost> {
        // Stored state is always valid, so this runs through the same gate
        // as every other mutation instead of a second commit path.
        let clean = validate::blog_post::validate(&candidate).map_err(StoreError::Validation)?;
        let clean = stamped_post(clean);

        let mut posts = self.state.borrow().posts.clone();
        replace_by(&mut posts, |p| p.id == clean.id, clean.clone());
        let payload = serde_json::to_value(&clean)?;
        self.apply_collection(
            EntityKind::BlogPost,
            posts,
            ChangeOp::Updated,
            payload,
            |state, list| state.posts = list,
        )?;
        Ok(clean)
    }

    pub fn bulk_update_posts(&self, ids: &[Uuid], patch: &PostPatch) -> Result<usize> {
        let mut posts = self.state.borrow().posts.clone();
        let mut applied_ids = Vec::new();
        for id in ids {
            let Some(pos) = posts.iter().position(|p| p.id == *id) else {
                continue;
            };
            if let Ok(clean) = validate::blog_post::validate(&posts[pos].merge(patch)) {
                posts[pos] = stamped_post(clean);
                applied_ids.push(*id);
            }
        }
        if applied_ids.is_empty() {
            return Ok(0);
        }
        let applied = applied_ids.len();
        self.apply_collection(
            EntityKind::BlogPost,
            posts,
            ChangeOp::Updated,
            serde_json::to_value(&applied_ids)?,
            |state, list| state.posts = list,
        )?;
        Ok(applied)
    }

    // --- Contact messages --------------------------------------------------

    /// Messages matching the filter, newest first.
    pub fn messages(&self, filter: &MessageFilter) -> Vec<ContactMessage> {
        let mut list: Vec<ContactMessage> = self
            .state
            .borrow()
            .messages
            .iter()
            .filter(|m| !filter.unread_only || !m.read)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        list
    }

    pub fn unread_messages(&self) -> usize {
        self.state.borrow().messages.iter().filter(|m| !m.read).count()
    }

    pub fn create_message(&self, input: NewMessage) -> Result<ContactMessage> {
        let clean = validate::contact_message::validate(&ContactMessage::new(input))
            .map_err(StoreError::Validation)?;

        let mut messages = self.state.borrow().messages.clone();
        messages.push(clean.clone());
        let payload = serde_json::to_value(&clean)?;
        self.apply_collection(
            EntityKind::ContactMessage,
            messages,
            ChangeOp::Created,
            payload,
            |state, list| state.messages = list,
        )?;
        Ok(clean)
    }

    /// The only mutable part of a message is its read flag; the patch type
    /// can't express anything else.
    pub fn update_message(&self, id: Uuid, patch: MessagePatch) -> Result<ContactMessage> {
        let current = self.find_message(id)?;
        let clean = validate::contact_message::validate(&current.merge(&patch))
            .map_err(StoreError::Validation)?;

        let mut messages = self.state.borrow().messages.clone();
        replace_by(&mut messages, |m| m.id == id, clean.clone());
        let payload = serde_json::to_value(&clean)?;
        self.apply_collection(
            EntityKind::ContactMessage,
            messages,
            ChangeOp::Updated,
            payload,
            |state, list| state.messages = list,
        )?;
        Ok(clean)
    }

    pub fn remove_message(&self, id: Uuid) -> Result<bool> {
        let mut messages = self.state.borrow().messages.clone();
        let before = messages.len();
        messages.retain(|m| m.id != id);
        if messages.len() == before {
            return Ok(false);
        }
        self.apply_collection(
            EntityKind::ContactMessage,
            messages,
            ChangeOp::Removed,
            serde_json::json!({ "id": id }),
            |state, list| state.messages = list,
        )?;
        Ok(true)
    }

    pub fn bulk_update_messages(&self, ids: &[Uuid], patch: &MessagePatch) -> Result<usize> {
        let mut messages = self.state.borrow().messages.clone();
        let mut applied_ids = Vec::new();
        for id in ids {
            let Some(pos) = messages.iter().position(|m| m.id == *id) else {
                continue;
            };
            if let Ok(clean) = validate::contact_message::validate(&messages[pos].merge(patch)) {
                messages[pos] = clean;
                applied_ids.push(*id);
            }
        }
        if applied_ids.is_empty() {
            return Ok(0);
        }
        let applied = applied_ids.len();
        self.apply_collection(
            EntityKind::ContactMessage,
            messages,
            ChangeOp::Updated,
            serde_json::to_value(&applied_ids)?,
            |state, list| state.messages = list,
        )?;
        Ok(applied)
    }

    // --- Backups -----------------------------------------------------------

    /// Retained snapshots for one entity kind, newest first.
    pub fn backups(&self, kind: EntityKind) -> Result<Vec<BackupEntry>> {
        self.backups.list(&self.medium, kind.key())
    }

    /// Replace an entity's current value with a named snapshot, through the
    /// normal validate/commit/notify pipeline (so the pre-restore value is
    /// itself snapshotted first).
    pub fn restore_backup(&self, kind: EntityKind, backup_key: &str) -> Result<()> {
        let blob = self.backups.restore(&self.medium, kind.key(), backup_key)?;
        match kind {
            EntityKind::Hero => {
                let clean = parse_validated(kind, &blob, |v| validate::hero::validate(v))?;
                self.apply_singleton(kind, clean, ChangeOp::Restored, |state, value| {
                    state.hero = value
                })?;
            }
            EntityKind::About => {
                let clean = parse_validated(kind, &blob, |v| validate::about::validate(v, false))?;
                self.apply_singleton(kind, clean, ChangeOp::Restored, |state, value| {
                    state.about = value
                })?;
            }
            EntityKind::ContactInfo => {
                let clean = parse_validated(kind, &blob, |v| validate::contact_info::validate(v))?;
                self.apply_singleton(kind, clean, ChangeOp::Restored, |state, value| {
                    state.contact_info = value
                })?;
            }
            EntityKind::Settings => {
                let clean = parse_validated(kind, &blob, |v| validate::settings::validate(v))?;
                self.apply_singleton(kind, clean, ChangeOp::Restored, |state, value| {
                    state.settings = value
                })?;
            }
            EntityKind::Service => {
                let list =
                    parse_validated_list(kind, &blob, |v| validate::service::validate(v))?;
                let payload = serde_json::to_value(&list)?;
                self.apply_collection(kind, list, ChangeOp::Restored, payload, |state, value| {
                    state.services = value
                })?;
            }
            EntityKind::Project => {
                let list =
                    parse_validated_list(kind, &blob, |v| validate::project::validate(v))?;
                let payload = serde_json::to_value(&list)?;
                self.apply_collection(kind, list, ChangeOp::Restored, payload, |state, value| {
                    state.projects = value
                })?;
            }
            EntityKind::BlogPost => {
                let list =
                    parse_validated_list(kind, &blob, |v| validate::blog_post::validate(v))?;
                let payload = serde_json::to_value(&list)?;
                self.apply_collection(kind, list, ChangeOp::Restored, payload, |state, value| {
                    state.posts = value
                })?;
            }
            EntityKind::ContactMessage => {
                let list =
                    parse_validated_list(kind, &blob, |v| validate::contact_message::validate(v))?;
                let payload = serde_json::to_value(&list)?;
                self.apply_collection(kind, list, ChangeOp::Restored, payload, |state, value| {
                    state.messages = value
                })?;
            }
        }
        Ok(())
    }

    // --- Integrity ---------------------------------------------------------

    /// Compare the persisted blob against the in-memory copy and re-validate
    /// it. Medium failures are reported as issues, not errors, so a health
    /// panel can render them.
    pub fn check_integrity(&self, kind: EntityKind) -> IntegrityReport {
        let mut issues = Vec::new();
        match kind {
            EntityKind::Hero => {
                let memory = self.hero();
                self.integrity_singleton(kind, &memory, &mut issues, |v| {
                    validate::hero::validate(v)
                });
            }
            EntityKind::About => {
                let memory = self.about();
                self.integrity_singleton(kind, &memory, &mut issues, |v| {
                    validate::about::validate(v, false)
                });
            }
            EntityKind::ContactInfo => {
                let memory = self.contact_info();
                self.integrity_singleton(kind, &memory, &mut issues, |v| {
                    validate::contact_info::validate(v)
                });
            }
            EntityKind::Settings => {
                let memory = self.settings();
                self.integrity_singleton(kind, &memory, &mut issues, |v| {
                    validate::settings::validate(v)
                });
            }
            EntityKind::Service => {
                let memory = self.state.borrow().services.clone();
                self.integrity_collection(kind, &memory, &mut issues, |v| {
                    validate::service::validate(v)
                });
            }
            EntityKind::Project => {
                let memory = self.state.borrow().projects.clone();
                self.integrity_collection(kind, &memory, &mut issues, |v| {
                    validate::project::validate(v)
                });
            }
            EntityKind::BlogPost => {
                let memory = self.state.borrow().posts.clone();
                self.integrity_collection(kind, &memory, &mut issues, |v| {
                    validate::blog_post::validate(v)
                });
            }
            EntityKind::ContactMessage => {
                let memory = self.state.borrow().messages.clone();
                self.integrity_collection(kind, &memory, &mut issues, |v| {
                    validate::contact_message::validate(v)
                });
            }
        }
        IntegrityReport { kind, issues }
    }

    /// Integrity reports for every entity kind.
    pub fn check_all(&self) -> Vec<IntegrityReport> {
        EntityKind::ALL
            .into_iter()
            .map(|kind| self.check_integrity(kind))
            .collect()
    }

    // --- External writes ---------------------------------------------------

    /// Inbound edge for medium-change signals from another instance sharing
    /// the medium. Re-reads the changed key, replaces the in-memory copy
    /// (last write wins) and republishes through the normal channel.
    ///
    /// Backup-namespace and unknown keys are ignored (returns false). A
    /// corrupt or invalid external blob is a [`StoreError::Corruption`] and
    /// changes nothing.
    pub fn sync_external(&self, key: &str) -> Result<bool> {
        if backup::is_backup_key(key) {
            return Ok(false);
        }
        let Some(kind) = EntityKind::from_key(key) else {
            return Ok(false);
        };

        match kind {
            EntityKind::Hero => {
                let clean =
                    self.read_external_singleton(kind, |v| validate::hero::validate(v))?;
                self.swap_and_publish(kind, serde_json::to_value(&clean)?, |state| {
                    state.hero = clean
                });
            }
            EntityKind::About => {
                let clean =
                    self.read_external_singleton(kind, |v| validate::about::validate(v, false))?;
                self.swap_and_publish(kind, serde_json::to_value(&clean)?, |state| {
                    state.about = clean
                });
            }
            EntityKind::ContactInfo => {
                let clean =
                    self.read_external_singleton(kind, |v| validate::contact_info::validate(v))?;
                self.swap_and_publish(kind, serde_json::to_value(&clean)?, |state| {
                    state.contact_info = clean
                });
            }
            EntityKind::Settings => {
                let clean =
                    self.read_external_singleton(kind, |v| validate::settings::validate(v))?;
                self.swap_and_publish(kind, serde_json::to_value(&clean)?, |state| {
                    state.settings = clean
                });
            }
            EntityKind::Service => {
                let list =
                    self.read_external_collection(kind, |v| validate::service::validate(v))?;
                self.swap_and_publish(kind, serde_json::to_value(&list)?, |state| {
                    state.services = list
                });
            }
            EntityKind::Project => {
                let list =
                    self.read_external_collection(kind, |v| validate::project::validate(v))?;
                self.swap_and_publish(kind, serde_json::to_value(&list)?, |state| {
                    state.projects = list
                });
            }
            EntityKind::BlogPost => {
                let list =
                    self.read_external_collection(kind, |v| validate::blog_post::validate(v))?;
                self.swap_and_publish(kind, serde_json::to_value(&list)?, |state| {
                    state.posts = list
                });
            }
            EntityKind::ContactMessage => {
                let list = self
                    .read_external_collection(kind, |v| validate::contact_message::validate(v))?;
                self.swap_and_publish(kind, serde_json::to_value(&list)?, |state| {
                    state.messages = list
                });
            }
        }
        Ok(true)
    }

    // --- Import (whole-kind replacement) -----------------------------------

    pub(crate) fn import_hero(&self, value: HeroContent) -> Result<HeroContent> {
        let clean = validate::hero::validate(&value).map_err(StoreError::Validation)?;
        self.apply_singleton(EntityKind::Hero, clean, ChangeOp::Imported, |state, v| {
            state.hero = v
        })
    }

    pub(crate) fn import_about(&self, value: AboutContent) -> Result<AboutContent> {
        let clean = validate::about::validate(&value, self.config.require_profile_image)
            .map_err(StoreError::Validation)?;
        self.apply_singleton(EntityKind::About, clean, ChangeOp::Imported, |state, v| {
            state.about = v
        })
    }

    pub(crate) fn import_contact_info(&self, value: ContactInfo) -> Result<ContactInfo> {
        let clean = validate::contact_info::validate(&value).map_err(StoreError::Validation)?;
        self.apply_singleton(
            EntityKind::ContactInfo,
            clean,
            ChangeOp::Imported,
            |state, v| state.contact_info = v,
        )
    }

    pub(crate) fn import_settings(&self, value: SystemSettings) -> Result<SystemSettings> {
        let clean = validate::settings::validate(&value).map_err(StoreError::Validation)?;
        self.apply_singleton(EntityKind::Settings, clean, ChangeOp::Imported, |state, v| {
            state.settings = v
        })
    }

    pub(crate) fn import_services(
        &self,
        items: Vec<Service>,
        notes: &mut Vec<String>,
    ) -> Result<usize> {
        let accepted = sift_items(EntityKind::Service, items, notes, |v| {
            validate::service::validate(v)
        });
        let applied = accepted.len();
        self.replace_collection(EntityKind::Service, accepted, |state, list| {
            state.services = list
        })?;
        Ok(applied)
    }

    pub(crate) fn import_projects(
        &self,
        items: Vec<Project>,
        notes: &mut Vec<String>,
    ) -> Result<usize> {
        let accepted = sift_items(EntityKind::Project, items, notes, |v| {
            validate::project::validate(v)
        });
        let applied = accepted.len();
        self.replace_collection(EntityKind::Project, accepted, |state, list| {
            state.projects = list
        })?;
        Ok(applied)
    }

    pub(crate) fn import_posts(
        &self,
        items: Vec<BlogPost>,
        notes: &mut Vec<String>,
    ) -> Result<usize> {
        let accepted = sift_items(EntityKind::BlogPost, items, notes, |v| {
            validate::blog_post::validate(v)
        });
        let applied = accepted.len();
        self.replace_collection(EntityKind::BlogPost, accepted, |state, list| {
            state.posts = list
        })?;
        Ok(applied)
    }

    pub(crate) fn import_messages(
        &self,
        items: Vec<ContactMessage>,
        notes: &mut Vec<String>,
    ) -> Result<usize> {
        let accepted = sift_items(EntityKind::ContactMessage, items, notes, |v| {
            validate::contact_message::validate(v)
        });
        let applied = accepted.len();
        self.replace_collection(EntityKind::ContactMessage, accepted, |state, list| {
            state.messages = list
        })?;
        Ok(applied)
    }

    // --- Plumbing ----------------------------------------------------------

    fn find_service(&self, id: Uuid) -> Result<Service> {
        self.state
            .borrow()
            .services
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Service,
                id,
            })
    }

    fn find_project(&self, id: Uuid) -> Result<Project> {
        self.state
            .borrow()
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Project,
                id,
            })
    }

    fn find_post(&self, id: Uuid) -> Result<BlogPost> {
        self.state
            .borrow()
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(StoreError::NotFound {
                kind: EntityKind::BlogPost,
                id,
            })
    }

    fn find_message(&self, id: Uuid) -> Result<ContactMessage> {
        self.state
            .borrow()
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(StoreError::NotFound {
                kind: EntityKind::ContactMessage,
                id,
            })
    }

    /// Persist a validated singleton, swap it into memory and notify.
    fn apply_singleton<T: Serialize + Clone>(
        &self,
        kind: EntityKind,
        clean: T,
        op: ChangeOp,
        set: impl FnOnce(&mut StoreState, T),
    ) -> Result<T> {
        let payload = serde_json::to_value(&clean)?;
        self.commit_blob(kind, &clean)?;
        {
            let mut state = self.state.borrow_mut();
            set(&mut state, clean.clone());
        }
        self.publish(kind, op, payload);
        Ok(clean)
    }

    /// Persist a whole collection, swap it into memory and notify.
    fn apply_collection<T: Serialize>(
        &self,
        kind: EntityKind,
        list: Vec<T>,
        op: ChangeOp,
        payload: Value,
        set: impl FnOnce(&mut StoreState, Vec<T>),
    ) -> Result<()> {
        self.commit_blob(kind, &list)?;
        {
            let mut state = self.state.borrow_mut();
            set(&mut state, list);
        }
        self.publish(kind, op, payload);
        Ok(())
    }

    fn replace_collection<T: Serialize>(
        &self,
        kind: EntityKind,
        list: Vec<T>,
        set: impl FnOnce(&mut StoreState, Vec<T>),
    ) -> Result<()> {
        let payload = serde_json::to_value(&list)?;
        self.apply_collection(kind, list, ChangeOp::Imported, payload, set)
    }

    /// snapshot(pre-write blob) -> set. The snapshot is best-effort: a
    /// failure is logged and the primary write proceeds.
    fn commit_blob<T: Serialize + ?Sized>(&self, kind: EntityKind, value: &T) -> Result<()> {
        let key = kind.key();
        let blob = serde_json::to_vec(value)?;
        if let Err(e) = self.backups.snapshot(&self.medium, key) {
            log::warn!("backup snapshot for '{}' failed: {}", key, e);
        }
        self.medium.set(key, &blob)?;
        Ok(())
    }

    // Callers must not hold a state borrow here; handlers re-read the store.
    fn publish(&self, kind: EntityKind, op: ChangeOp, payload: Value) {
        self.notifier.publish(&ChangeEvent::new(kind, op, payload));
    }

    fn swap_and_publish(&self, kind: EntityKind, payload: Value, set: impl FnOnce(&mut StoreState)) {
        {
            let mut state = self.state.borrow_mut();
            set(&mut state);
        }
        self.publish(kind, ChangeOp::External, payload);
    }

    fn read_external_singleton<T>(
        &self,
        kind: EntityKind,
        validate: impl Fn(&T) -> std::result::Result<T, FieldErrors>,
    ) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.medium.get(kind.key())? {
            // The other instance cleared the key; fall back to the default.
            None => Ok(T::default()),
            Some(bytes) => parse_validated(kind, &bytes, validate),
        }
    }

    fn read_external_collection<T>(
        &self,
        kind: EntityKind,
        validate: impl Fn(&T) -> std::result::Result<T, FieldErrors>,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        match self.medium.get(kind.key())? {
            None => Ok(Vec::new()),
            Some(bytes) => parse_validated_list(kind, &bytes, validate),
        }
    }

    fn integrity_singleton<T>(
        &self,
        kind: EntityKind,
        memory: &T,
        issues: &mut Vec<String>,
        validate: impl Fn(&T) -> std::result::Result<T, FieldErrors>,
    ) where
        T: DeserializeOwned + PartialEq + Default,
    {
        match self.medium.get(kind.key()) {
            Err(e) => issues.push(format!("medium read failed: {}", e)),
            Ok(None) => {
                if *memory != T::default() {
                    issues.push(format!(
                        "nothing persisted under '{}' but the store holds content",
                        kind.key()
                    ));
                }
            }
            Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
                Err(e) => issues.push(format!("persisted blob does not parse: {}", e)),
                Ok(value) => match validate(&value) {
                    Err(errors) => {
                        issues.push(format!("persisted blob fails validation: {}", errors))
                    }
                    Ok(clean) => {
                        if clean != *memory {
                            issues.push(
                                "persisted blob differs from the in-memory copy".to_string(),
                            );
                        }
                    }
                },
            },
        }
    }

    fn integrity_collection<T>(
        &self,
        kind: EntityKind,
        memory: &[T],
        issues: &mut Vec<String>,
        validate: impl Fn(&T) -> std::result::Result<T, FieldErrors>,
    ) where
        T: DeserializeOwned + PartialEq,
    {
        match self.medium.get(kind.key()) {
            Err(e) => issues.push(format!("medium read failed: {}", e)),
            Ok(None) => {
                if !memory.is_empty() {
                    issues.push(format!(
                        "nothing persisted under '{}' but the store holds {} entries",
                        kind.key(),
                        memory.len()
                    ));
                }
            }
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<T>>(&bytes) {
                Err(e) => issues.push(format!("persisted blob does not parse: {}", e)),
                Ok(values) => {
                    let mut clean_values = Vec::with_capacity(values.len());
                    let mut bad = false;
                    for (i, value) in values.iter().enumerate() {
                        match validate(value) {
                            Ok(clean) => clean_values.push(clean),
                            Err(errors) => {
                                issues.push(format!(
                                    "persisted entry {} fails validation: {}",
                                    i, errors
                                ));
                                bad = true;
                            }
                        }
                    }
                    if !bad && clean_values != memory {
                        issues
                            .push("persisted blob differs from the in-memory copy".to_string());
                    }
                }
            },
        }
    }
}

// =============================================================================
// Free helpers
// =============================================================================

fn next_order(orders: impl Iterator<Item = i64>) -> i64 {
    orders.max().map_or(0, |max| max + 1)
}

fn replace_by<T>(list: &mut [T], matches: impl Fn(&T) -> bool, value: T) {
    if let Some(slot) = list.iter_mut().find(|item| matches(item)) {
        *slot = value;
    }
}

/// Set order = position for every listed id. Unknown ids are skipped.
/// Returns whether any item actually moved.
fn assign_positions<T>(
    list: &mut [T],
    ids: &[Uuid],
    id_of: impl Fn(&T) -> Uuid,
    order_of: impl Fn(&T) -> i64,
    set_order: impl Fn(&mut T, i64),
) -> bool {
    let mut changed = false;
    for (position, id) in ids.iter().enumerate() {
        let position = position as i64;
        if let Some(item) = list.iter_mut().find(|item| id_of(item) == *id) {
            if order_of(item) != position {
                set_order(item, position);
                changed = true;
            }
        }
    }
    changed
}

fn stamped_service(mut value: Service) -> Service {
    value.updated_at = chrono::Utc::now();
    value
}

fn stamped_project(mut value: Project) -> Project {
    value.updated_at = chrono::Utc::now();
    value
}

fn stamped_post(mut value: BlogPost) -> BlogPost {
    value.updated_at = chrono::Utc::now();
    value
}

fn parse_validated<T: DeserializeOwned>(
    kind: EntityKind,
    bytes: &[u8],
    validate: impl Fn(&T) -> std::result::Result<T, FieldErrors>,
) -> Result<T> {
    let value: T = serde_json::from_slice(bytes).map_err(|e| StoreError::Corruption {
        key: kind.key().to_string(),
        reason: e.to_string(),
    })?;
    validate(&value).map_err(|errors| StoreError::Corruption {
        key: kind.key().to_string(),
        reason: errors.to_string(),
    })
}

fn parse_validated_list<T: DeserializeOwned>(
    kind: EntityKind,
    bytes: &[u8],
    validate: impl Fn(&T) -> std::result::Result<T, FieldErrors>,
) -> Result<Vec<T>> {
    let values: Vec<T> = serde_json::from_slice(bytes).map_err(|e| StoreError::Corruption {
        key: kind.key().to_string(),
        reason: e.to_string(),
    })?;
    let mut clean = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        clean.push(validate(value).map_err(|errors| StoreError::Corruption {
            key: kind.key().to_string(),
            reason: format!("entry {}: {}", i, errors),
        })?);
    }
    Ok(clean)
}

/// Per-item validation for an import document. Invalid and duplicate-id
/// items are dropped with a note; the rest are applied.
fn sift_items<T>(
    kind: EntityKind,
    items: Vec<T>,
    notes: &mut Vec<String>,
    validate: impl Fn(&T) -> std::result::Result<T, FieldErrors>,
) -> Vec<T>
where
    T: HasId,
{
    let mut seen = std::collections::HashSet::new();
    let mut accepted = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        if !seen.insert(item.id()) {
            notes.push(format!("{} entry {}: duplicate id {}", kind, i, item.id()));
            continue;
        }
        match validate(&item) {
            Ok(clean) => accepted.push(clean),
            Err(errors) => notes.push(format!("{} entry {}: {}", kind, i, errors)),
        }
    }
    accepted
}

pub(crate) trait HasId {
    fn id(&self) -> Uuid;
}

impl HasId for Service {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl HasId for Project {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl HasId for BlogPost {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl HasId for ContactMessage {
    fn id(&self) -> Uuid {
        self.id
    }
}

// =============================================================================
// Bootstrap loaders
// =============================================================================

fn load_singleton<M, T>(
    medium: &M,
    backups: &BackupManager,
    kind: EntityKind,
    report: &mut BootstrapReport,
    validate: impl Fn(&T) -> std::result::Result<T, FieldErrors>,
) -> Result<T>
where
    M: StorageMedium,
    T: DeserializeOwned + Serialize + Default,
{
    let key = kind.key();
    match medium.get(key)? {
        None => {
            // Fresh medium: the default exists in memory only until the
            // first write.
            report.record(kind, BootstrapSource::Default);
            return Ok(T::default());
        }
        Some(bytes) => match parse_validated(kind, &bytes, &validate) {
            Ok(value) => {
                report.record(kind, BootstrapSource::Current);
                return Ok(value);
            }
            Err(e) => report.note(format!("{}: persisted blob unusable ({})", key, e)),
        },
    }

    for entry in backups.list(medium, key)? {
        match parse_validated(kind, &entry.value, &validate) {
            Ok(value) => {
                report.record(kind, BootstrapSource::Backup);
                report.note(format!("{}: recovered from backup {}", key, entry.key));
                write_back(medium, key, &value);
                return Ok(value);
            }
            Err(e) => report.note(format!("{}: backup {} unusable ({})", key, entry.key, e)),
        }
    }

    report.record(kind, BootstrapSource::Default);
    report.note(format!("{}: no usable backup, using the built-in default", key));
    let value = T::default();
    write_back(medium, key, &value);
    Ok(value)
}

fn load_collection<M, T>(
    medium: &M,
    backups: &BackupManager,
    kind: EntityKind,
    report: &mut BootstrapReport,
    validate: impl Fn(&T) -> std::result::Result<T, FieldErrors>,
) -> Result<Vec<T>>
where
    M: StorageMedium,
    T: DeserializeOwned + Serialize,
{
    let key = kind.key();
    match medium.get(key)? {
        None => {
            report.record(kind, BootstrapSource::Default);
            return Ok(Vec::new());
        }
        Some(bytes) => match parse_validated_list(kind, &bytes, &validate) {
            Ok(values) => {
                report.record(kind, BootstrapSource::Current);
                return Ok(values);
            }
            Err(e) => report.note(format!("{}: persisted blob unusable ({})", key, e)),
        },
    }

    for entry in backups.list(medium, key)? {
        match parse_validated_list(kind, &entry.value, &validate) {
            Ok(values) => {
                report.record(kind, BootstrapSource::Backup);
                report.note(format!("{}: recovered from backup {}", key, entry.key));
                write_back(medium, key, &values);
                return Ok(values);
            }
            Err(e) => report.note(format!("{}: backup {} unusable ({})", key, entry.key, e)),
        }
    }

    report.record(kind, BootstrapSource::Default);
    report.note(format!("{}: no usable backup, starting empty", key));
    let empty: Vec<T> = Vec::new();
    write_back(medium, key, &empty);
    Ok(empty)
}

// Repair the primary key after a recovery so the next open doesn't hit the
// same corrupt blob. Best-effort.
fn write_back<M: StorageMedium, T: Serialize>(medium: &M, key: &str, value: &T) {
    let blob = match serde_json::to_vec(value) {
        Ok(blob) => blob,
        Err(e) => {
            log::warn!("could not serialize repair blob for '{}': {}", key, e);
            return;
        }
    };
    if let Err(e) = medium.set(key, &blob) {
        log::warn!("could not repair '{}' after recovery: {}", key, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AboutPatch, LocalizedText};
    use crate::store::MemMedium;
    use std::rc::Rc;

    fn open_store() -> ContentStore<MemMedium> {
        ContentStore::open(MemMedium::new(), StoreConfig::default()).unwrap()
    }

    fn open_shared() -> (MemMedium, ContentStore<MemMedium>) {
        let medium = MemMedium::new();
        let store = ContentStore::open(medium.clone(), StoreConfig::default()).unwrap();
        (medium, store)
    }

    fn greeting_patch(vi: &str, en: &str) -> HeroPatch {
        HeroPatch {
            greeting: Some(LocalizedText::new(vi, en)),
            ..Default::default()
        }
    }

    fn sample_service() -> NewService {
        NewService {
            title: LocalizedText::new("Thiết kế giao diện", "Interface design"),
            description: LocalizedText::new(
                "Giao diện hiện đại cho web và mobile",
                "Modern interfaces for web and mobile",
            ),
            icon: "palette".to_string(),
            color: "#F59E0B".to_string(),
            bg_color: "#FFFBEB".to_string(),
            order: None,
        }
    }

    fn sample_project() -> NewProject {
        NewProject {
            title: LocalizedText::new("Trang thương mại", "Storefront"),
            description: LocalizedText::new("Một trang bán hàng nhỏ", "A small storefront"),
            image: "/img/storefront.png".to_string(),
            images: Vec::new(),
            link: None,
            technologies: vec!["rust".to_string(), "svelte".to_string()],
            category: "web".to_string(),
            featured: false,
            order: None,
        }
    }

    fn sample_post() -> NewPost {
        NewPost {
            title: LocalizedText::new("Học Rust", "Learning Rust"),
            content: LocalizedText::new("Ghi chép trên đường học Rust.", "Notes on learning Rust."),
            excerpt: LocalizedText::new("Ghi chép", "Notes"),
            thumbnail: "/img/rust.png".to_string(),
            tags: vec!["rust".to_string()],
        }
    }

    fn sample_message() -> NewMessage {
        NewMessage {
            name: "Hà".to_string(),
            email: "ha@example.com".to_string(),
            message: "Tôi muốn đặt một website.".to_string(),
        }
    }

    fn event_log(store: &ContentStore<MemMedium>) -> Rc<RefCell<Vec<(EntityKind, ChangeOp)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        store.subscribe_all(move |event| sink.borrow_mut().push((event.kind, event.op)));
        log
    }

    // --- Bootstrap ---------------------------------------------------------

    #[test]
    fn test_fresh_medium_opens_with_defaults() {
        let (medium, store) = open_shared();
        assert_eq!(store.hero(), HeroContent::default());
        assert!(store.services().is_empty());
        assert!(store.bootstrap_report().clean());
        assert_eq!(
            store.bootstrap_report().source(EntityKind::Hero),
            BootstrapSource::Default
        );
        // Defaults live in memory only until the first write.
        assert!(medium.get("heroContent").unwrap().is_none());
    }

    #[test]
    fn test_reopen_loads_persisted_state() {
        let (medium, store) = open_shared();
        store.update_hero(greeting_patch("Chào", "Hello")).unwrap();
        store.create_service(sample_service()).unwrap();
        drop(store);

        let reopened = ContentStore::open(medium, StoreConfig::default()).unwrap();
        assert_eq!(reopened.hero().greeting.vi, "Chào");
        assert_eq!(reopened.services().len(), 1);
        assert_eq!(
            reopened.bootstrap_report().source(EntityKind::Hero),
            BootstrapSource::Current
        );
    }

    #[test]
    fn test_corrupt_blob_falls_back_to_newest_backup() {
        let (medium, store) = open_shared();
        store.update_hero(greeting_patch("Một", "One")).unwrap();
        store.update_hero(greeting_patch("Hai", "Two")).unwrap();
        drop(store);
        medium.plant("heroContent", b"{ this is not json");

        let recovered = ContentStore::open(medium.clone(), StoreConfig::default()).unwrap();
        // The only backup snapshots the first write.
        assert_eq!(recovered.hero().greeting.vi, "Một");
        assert_eq!(
            recovered.bootstrap_report().source(EntityKind::Hero),
            BootstrapSource::Backup
        );
        assert!(!recovered.bootstrap_report().clean());

        // The recovery repaired the primary key.
        let repaired = medium.get("heroContent").unwrap().unwrap();
        let hero: HeroContent = serde_json::from_slice(&repaired).unwrap();
        assert_eq!(hero.greeting.vi, "Một");
    }

    #[test]
    fn test_corrupt_blob_without_backups_falls_back_to_default() {
        let medium = MemMedium::new();
        medium.plant("heroContent", b"\xff\xfe garbage");

        let store = ContentStore::open(medium, StoreConfig::default()).unwrap();
        assert_eq!(store.hero(), HeroContent::default());
        assert_eq!(
            store.bootstrap_report().source(EntityKind::Hero),
            BootstrapSource::Default
        );
        assert!(!store.bootstrap_report().notes.is_empty());
    }

    #[test]
    fn test_parseable_but_invalid_blob_counts_as_corruption() {
        let medium = MemMedium::new();
        let blob = serde_json::json!({
            "greeting": { "vi": "", "en": "" },
            "name": { "vi": "", "en": "" },
            "title": { "vi": "", "en": "" },
            "subtitle": { "vi": "", "en": "" },
            "ctaText": { "vi": "", "en": "" },
            "ctaLink": ""
        });
        medium.plant("heroContent", blob.to_string().as_bytes());

        let store = ContentStore::open(medium, StoreConfig::default()).unwrap();
        assert_eq!(store.hero(), HeroContent::default());
        assert!(!store.bootstrap_report().clean());
    }

    // --- Singleton pipeline ------------------------------------------------

    #[test]
    fn test_update_hero_persists_and_notifies() {
        let (medium, store) = open_shared();
        let events = event_log(&store);

        let updated = store.update_hero(greeting_patch("Chào bạn", "Hi there")).unwrap();
        assert_eq!(updated.greeting.en, "Hi there");
        assert_eq!(store.hero(), updated);

        let blob = medium.get("heroContent").unwrap().unwrap();
        let persisted: HeroContent = serde_json::from_slice(&blob).unwrap();
        assert_eq!(persisted, updated);

        assert_eq!(
            events.borrow().as_slice(),
            &[(EntityKind::Hero, ChangeOp::Updated)]
        );
    }

    #[test]
    fn test_validation_failure_changes_nothing() {
        let (medium, store) = open_shared();
        let events = event_log(&store);
        let before = store.hero();

        let err = store.update_hero(greeting_patch("", "")).unwrap_err();
        let StoreError::Validation(errors) = err else {
            panic!("expected a validation error");
        };
        assert!(errors.get("greeting.vi").is_some());

        assert_eq!(store.hero(), before);
        assert!(medium.get("heroContent").unwrap().is_none());
        assert!(store.backups(EntityKind::Hero).unwrap().is_empty());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_update_strips_markup_before_commit() {
        let store = open_store();
        let updated = store
            .update_hero(greeting_patch("Xin <b>chào</b>", "  Hello  "))
            .unwrap();
        assert_eq!(updated.greeting.vi, "Xin chào");
        assert_eq!(updated.greeting.en, "Hello");
    }

    #[test]
    fn test_about_image_policy_applies_to_writes_only() {
        let medium = MemMedium::new();
        let config = StoreConfig {
            require_profile_image: true,
            ..Default::default()
        };
        let store = ContentStore::open(medium, config).unwrap();
        // The built-in default has no image; it still loads.
        assert!(store.bootstrap_report().clean());

        let err = store
            .update_about(AboutPatch {
                description: Some(LocalizedText::new("Mô tả", "Description")),
                ..Default::default()
            })
            .unwrap_err();
        let StoreError::Validation(errors) = err else {
            panic!("expected a validation error");
        };
        assert!(errors.get("profileImage").is_some());

        let updated = store
            .update_about(AboutPatch {
                profile_image: Some("/img/me.png".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.profile_image, "/img/me.png");
    }

    #[test]
    fn test_failed_persist_preserves_memory_and_blob() {
        let (medium, store) = open_shared();
        store.update_hero(greeting_patch("Trước", "Before")).unwrap();
        let events = event_log(&store);

        medium.set_simulate_quota_error(true);
        let err = store
            .update_hero(greeting_patch("Sau", "After"))
            .unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { .. }));
        medium.set_simulate_quota_error(false);

        assert_eq!(store.hero().greeting.vi, "Trước");
        let blob = medium.get("heroContent").unwrap().unwrap();
        let persisted: HeroContent = serde_json::from_slice(&blob).unwrap();
        assert_eq!(persisted.greeting.vi, "Trước");
        assert!(events.borrow().is_empty());
    }

    // --- Backups -----------------------------------------------------------

    #[test]
    fn test_first_write_leaves_no_backup() {
        let store = open_store();
        store.update_hero(greeting_patch("Đầu", "First")).unwrap();
        assert!(store.backups(EntityKind::Hero).unwrap().is_empty());
    }

    #[test]
    fn test_backup_snapshots_the_pre_write_value() {
        let store = open_store();
        store.update_hero(greeting_patch("Một", "One")).unwrap();
        store.update_hero(greeting_patch("Hai", "Two")).unwrap();

        let backups = store.backups(EntityKind::Hero).unwrap();
        assert_eq!(backups.len(), 1);
        let snapshot: HeroContent = serde_json::from_slice(&backups[0].value).unwrap();
        assert_eq!(snapshot.greeting.vi, "Một");
    }

    #[test]
    fn test_backup_retention_is_bounded() {
        let medium = MemMedium::new();
        let config = StoreConfig {
            backup_keep: 3,
            ..Default::default()
        };
        let store = ContentStore::open(medium, config).unwrap();

        for i in 0..8 {
            store
                .update_hero(greeting_patch(&format!("Số {}", i), &format!("No {}", i)))
                .unwrap();
        }

        let backups = store.backups(EntityKind::Hero).unwrap();
        assert_eq!(backups.len(), 3);
        // Newest first: the last snapshot holds the second-to-last write.
        let newest: HeroContent = serde_json::from_slice(&backups[0].value).unwrap();
        assert_eq!(newest.greeting.en, "No 6");
    }

    #[test]
    fn test_restore_backup_reinstates_and_notifies() {
        let store = open_store();
        store.update_hero(greeting_patch("Một", "One")).unwrap();
        store.update_hero(greeting_patch("Hai", "Two")).unwrap();
        store.update_hero(greeting_patch("Ba", "Three")).unwrap();
        let events = event_log(&store);

        let backups = store.backups(EntityKind::Hero).unwrap();
        assert_eq!(backups.len(), 2);
        // The oldest retained snapshot holds the first write.
        let oldest = backups.last().unwrap();
        store.restore_backup(EntityKind::Hero, &oldest.key).unwrap();

        assert_eq!(store.hero().greeting.vi, "Một");
        assert_eq!(
            events.borrow().as_slice(),
            &[(EntityKind::Hero, ChangeOp::Restored)]
        );
    }

    #[test]
    fn test_restore_unknown_backup_is_an_error() {
        let store = open_store();
        let err = store
            .restore_backup(EntityKind::Hero, "heroContent_backup_999")
            .unwrap_err();
        assert!(matches!(err, StoreError::BackupMissing(_)));
    }

    // --- Collections -------------------------------------------------------

    #[test]
    fn test_create_service_assigns_next_order() {
        let store = open_store();
        let first = store.create_service(sample_service()).unwrap();
        let second = store.create_service(sample_service()).unwrap();
        assert_eq!(first.order, 0);
        assert_eq!(second.order, 1);

        let explicit = store
            .create_service(NewService {
                order: Some(10),
                ..sample_service()
            })
            .unwrap();
        assert_eq!(explicit.order, 10);

        let after = store.create_service(sample_service()).unwrap();
        assert_eq!(after.order, 11);
    }

    #[test]
    fn test_services_listed_in_order() {
        let store = open_store();
        let a = store.create_service(sample_service()).unwrap();
        let b = store
            .create_service(NewService {
                order: Some(5),
                ..sample_service()
            })
            .unwrap();
        let c = store.create_service(sample_service()).unwrap();

        let ids: Vec<Uuid> = store.services().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);
    }

    #[test]
    fn test_update_service_refreshes_stamp() {
        let store = open_store();
        let created = store.create_service(sample_service()).unwrap();
        let updated = store
            .update_service(
                created.id,
                ServicePatch {
                    icon: Some("wrench".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.icon, "wrench");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let store = open_store();
        let err = store
            .update_service(Uuid::new_v4(), ServicePatch::default())
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound {
                kind: EntityKind::Service,
                ..
            }
        ));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = open_store();
        let service = store.create_service(sample_service()).unwrap();
        let events = event_log(&store);

        assert!(store.remove_service(service.id).unwrap());
        assert!(!store.remove_service(service.id).unwrap());

        // Only the first removal commits and notifies.
        assert_eq!(
            events.borrow().as_slice(),
            &[(EntityKind::Service, ChangeOp::Removed)]
        );
        assert!(store.services().is_empty());
    }

    #[test]
    fn test_reorder_services_matches_given_sequence() {
        let store = open_store();
        let a = store.create_service(sample_service()).unwrap();
        let b = store.create_service(sample_service()).unwrap();
        let c = store.create_service(sample_service()).unwrap();

        assert!(store.reorder_services(&[c.id, a.id, b.id]).unwrap());
        let ids: Vec<Uuid> = store.services().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![c.id, a.id, b.id]);
    }

    #[test]
    fn test_reorder_noop_skips_commit_and_events() {
        let store = open_store();
        let a = store.create_service(sample_service()).unwrap();
        let b = store.create_service(sample_service()).unwrap();
        let events = event_log(&store);

        assert!(!store.reorder_services(&[a.id, b.id]).unwrap());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_reorder_skips_unknown_ids() {
        let store = open_store();
        let a = store.create_service(sample_service()).unwrap();
        let b = store.create_service(sample_service()).unwrap();

        assert!(store
            .reorder_services(&[b.id, Uuid::new_v4(), a.id])
            .unwrap());
        let ids: Vec<Uuid> = store.services().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[test]
    fn test_project_filters() {
        let store = open_store();
        store.create_project(sample_project()).unwrap();
        let featured = store
            .create_project(NewProject {
                featured: true,
                category: "app".to_string(),
                ..sample_project()
            })
            .unwrap();

        let all = store.projects(&ProjectFilter::default());
        assert_eq!(all.len(), 2);

        let only_featured = store.projects(&ProjectFilter {
            featured: Some(true),
            ..Default::default()
        });
        assert_eq!(only_featured.len(), 1);
        assert_eq!(only_featured[0].id, featured.id);

        let web = store.projects(&ProjectFilter {
            category: Some("web".to_string()),
            ..Default::default()
        });
        assert_eq!(web.len(), 1);
    }

    // --- Posts -------------------------------------------------------------

    #[test]
    fn test_new_posts_start_as_drafts() {
        let store = open_store();
        let post = store.create_post(sample_post()).unwrap();
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.publish_date.is_none());

        let published = store.posts(&PostFilter {
            status: Some(PostStatus::Published),
            ..Default::default()
        });
        assert!(published.is_empty());
    }

    #[test]
    fn test_publish_stamps_date_and_republish_refreshes_it() {
        let store = open_store();
        let post = store.create_post(sample_post()).unwrap();

        let published = store.publish_post(post.id).unwrap();
        assert_eq!(published.status, PostStatus::Published);
        let first_date = published.publish_date.unwrap();

        let republished = store.publish_post(post.id).unwrap();
        assert!(republished.publish_date.unwrap() >= first_date);
        assert_eq!(republished.status, PostStatus::Published);
    }

    #[test]
    fn test_unpublish_clears_the_date() {
        let store = open_store();
        let post = store.create_post(sample_post()).unwrap();
        store.publish_post(post.id).unwrap();

        let drafted = store.unpublish_post(post.id).unwrap();
        assert_eq!(drafted.status, PostStatus::Draft);
        assert!(drafted.publish_date.is_none());
    }

    #[test]
    fn test_post_tag_filter() {
        let store = open_store();
        store.create_post(sample_post()).unwrap();
        store
            .create_post(NewPost {
                tags: vec!["chuyện-nghề".to_string()],
                ..sample_post()
            })
            .unwrap();

        let tagged = store.posts(&PostFilter {
            tag: Some("rust".to_string()),
            ..Default::default()
        });
        assert_eq!(tagged.len(), 1);
    }

    // --- Messages ----------------------------------------------------------

    #[test]
    fn test_messages_arrive_unread() {
        let store = open_store();
        store.create_message(sample_message()).unwrap();
        store.create_message(sample_message()).unwrap();
        assert_eq!(store.unread_messages(), 2);

        let unread = store.messages(&MessageFilter { unread_only: true });
        assert_eq!(unread.len(), 2);
    }

    #[test]
    fn test_mark_message_read() {
        let store = open_store();
        let message = store.create_message(sample_message()).unwrap();
        store
            .update_message(message.id, MessagePatch { read: Some(true) })
            .unwrap();
        assert_eq!(store.unread_messages(), 0);
        assert!(store.messages(&MessageFilter { unread_only: true }).is_empty());
    }

    #[test]
    fn test_bulk_update_counts_only_applied() {
        let store = open_store();
        let first = store.create_message(sample_message()).unwrap();
        store.create_message(sample_message()).unwrap();
        let events = event_log(&store);

        let applied = store
            .bulk_update_messages(
                &[first.id, Uuid::new_v4()],
                &MessagePatch { read: Some(true) },
            )
            .unwrap();
        assert_eq!(applied, 1);
        assert_eq!(store.unread_messages(), 1);

        // One commit, one event, however many items.
        assert_eq!(
            events.borrow().as_slice(),
            &[(EntityKind::ContactMessage, ChangeOp::Updated)]
        );
    }

    #[test]
    fn test_bulk_update_with_no_matches_commits_nothing() {
        let store = open_store();
        store.create_service(sample_service()).unwrap();
        let events = event_log(&store);

        let applied = store
            .bulk_update_services(&[Uuid::new_v4()], &ServicePatch::default())
            .unwrap();
        assert_eq!(applied, 0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_bulk_update_skips_items_the_patch_invalidates() {
        let store = open_store();
        let service = store.create_service(sample_service()).unwrap();

        let applied = store
            .bulk_update_services(
                &[service.id],
                &ServicePatch {
                    color: Some("not-a-color".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(applied, 0);
        assert_eq!(store.services()[0].color, service.color);
    }

    // --- Subscriptions -----------------------------------------------------

    #[test]
    fn test_kind_scoped_subscription() {
        let store = open_store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(EntityKind::Service, move |event| {
            sink.borrow_mut().push(event.op)
        });

        store.create_service(sample_service()).unwrap();
        store.update_hero(greeting_patch("Chào", "Hi")).unwrap();

        assert_eq!(seen.borrow().as_slice(), &[ChangeOp::Created]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let store = open_store();
        let seen = Rc::new(RefCell::new(0u32));
        let sink = Rc::clone(&seen);
        let token = store.subscribe_all(move |_| *sink.borrow_mut() += 1);

        store.create_service(sample_service()).unwrap();
        assert!(store.unsubscribe(token));
        store.create_service(sample_service()).unwrap();

        assert_eq!(*seen.borrow(), 1);
    }

    // --- External writes ---------------------------------------------------

    #[test]
    fn test_sync_external_adopts_the_other_instances_write() {
        let (medium, ours) = open_shared();
        let theirs = ContentStore::open(medium, StoreConfig::default()).unwrap();
        let events = event_log(&ours);

        theirs.update_hero(greeting_patch("Từ tab kia", "From the other tab")).unwrap();
        assert_ne!(ours.hero(), theirs.hero());

        assert!(ours.sync_external("heroContent").unwrap());
        assert_eq!(ours.hero(), theirs.hero());
        assert_eq!(
            events.borrow().as_slice(),
            &[(EntityKind::Hero, ChangeOp::External)]
        );
    }

    #[test]
    fn test_sync_external_ignores_foreign_keys() {
        let store = open_store();
        assert!(!store.sync_external("heroContent_backup_123").unwrap());
        assert!(!store.sync_external("somethingElse").unwrap());
    }

    #[test]
    fn test_sync_external_rejects_corrupt_blob() {
        let (medium, store) = open_shared();
        store.create_service(sample_service()).unwrap();
        medium.plant("services", b"[{ truncated");

        let err = store.sync_external("services").unwrap_err();
        assert!(matches!(err, StoreError::Corruption { .. }));
        assert_eq!(store.services().len(), 1);
    }

    // --- Integrity ---------------------------------------------------------

    #[test]
    fn test_integrity_clean_store() {
        let store = open_store();
        store.update_hero(greeting_patch("Chào", "Hi")).unwrap();
        assert!(store.check_integrity(EntityKind::Hero).is_valid());
        assert!(store.check_all().iter().all(IntegrityReport::is_valid));
        assert_eq!(store.check_all().len(), EntityKind::ALL.len());
    }

    #[test]
    fn test_integrity_flags_tampered_blob() {
        let (medium, store) = open_shared();
        store.update_hero(greeting_patch("Chào", "Hi")).unwrap();
        medium.plant("heroContent", b"tampered");

        let report = store.check_integrity(EntityKind::Hero);
        assert!(!report.is_valid());
        assert!(report.issues[0].contains("does not parse"));
    }

    #[test]
    fn test_integrity_flags_divergent_blob() {
        let (medium, store) = open_shared();
        store.update_hero(greeting_patch("Chào", "Hi")).unwrap();

        let mut other = store.hero();
        other.greeting = LocalizedText::new("Khác", "Different");
        medium.plant("heroContent", &serde_json::to_vec(&other).unwrap());

        let report = store.check_integrity(EntityKind::Hero);
        assert!(!report.is_valid());
        assert!(report.issues[0].contains("differs"));
    }

    #[test]
    fn test_integrity_reports_medium_failure_as_issue() {
        let (medium, store) = open_shared();
        medium.set_simulate_unavailable(true);

        let report = store.check_integrity(EntityKind::Hero);
        assert!(!report.is_valid());
        assert!(report.issues[0].contains("medium read failed"));

        medium.set_simulate_unavailable(false);
    }
}
