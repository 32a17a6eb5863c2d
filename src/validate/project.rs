//! Project entry rules.
//!
//! - title: at most 150 characters per language, description: markdown, at
//!   most 2000
//! - image: non-empty reference; gallery entries must be non-blank
//! - link: optional, but must parse as an absolute URL when present
//! - technologies: non-blank, at most 50 characters each
//! - category: at most 50 characters; order: non-negative

use super::{
    check_order, is_absolute_url, require_localized, require_localized_markdown, require_text,
    sanitize, FieldErrors,
};
use crate::model::Project;

pub fn validate(candidate: &Project) -> Result<Project, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = require_localized(&mut errors, "title", &candidate.title, 150);
    let description =
        require_localized_markdown(&mut errors, "description", &candidate.description, 2000);

    let image = sanitize::clean_line(&candidate.image);
    if image.is_empty() {
        errors.add("image", "cannot be empty");
    }

    let mut images = Vec::with_capacity(candidate.images.len());
    for (i, entry) in candidate.images.iter().enumerate() {
        let clean = sanitize::clean_line(entry);
        if clean.is_empty() {
            errors.add(&format!("images.{}", i), "cannot be blank");
        }
        images.push(clean);
    }

    let link = match &candidate.link {
        None => None,
        Some(raw) => {
            let clean = sanitize::clean_line(raw);
            if clean.is_empty() {
                None
            } else {
                if !is_absolute_url(&clean) {
                    errors.add("link", "must be an absolute URL");
                }
                Some(clean)
            }
        }
    };

    let mut technologies = Vec::with_capacity(candidate.technologies.len());
    for (i, entry) in candidate.technologies.iter().enumerate() {
        let clean = sanitize::clean_line(entry);
        if clean.is_empty() {
            errors.add(&format!("technologies.{}", i), "cannot be blank");
        } else if clean.chars().count() > 50 {
            errors.add(
                &format!("technologies.{}", i),
                "must be at most 50 characters",
            );
        }
        technologies.push(clean);
    }

    let category = require_text(&mut errors, "category", &candidate.category, 50);
    let order = check_order(&mut errors, candidate.order);

    errors.into_result(Project {
        id: candidate.id,
        title,
        description,
        image,
        images,
        link,
        technologies,
        category,
        featured: candidate.featured,
        order,
        created_at: candidate.created_at,
        updated_at: candidate.updated_at,
    })
}
