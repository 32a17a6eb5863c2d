//! Blog post rules.
//!
//! - title: at most 200 characters per language, excerpt: at most 500
//! - content: markdown, at most 50000 characters per language
//! - thumbnail: non-empty reference
//! - tags: non-blank, at most 50 characters each
//! - publishDate must be present exactly when the post is published

use super::{require_localized, require_localized_markdown, sanitize, FieldErrors};
use crate::model::{BlogPost, PostStatus};

pub fn validate(candidate: &BlogPost) -> Result<BlogPost, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = require_localized(&mut errors, "title", &candidate.title, 200);
    let excerpt = require_localized(&mut errors, "excerpt", &candidate.excerpt, 500);
    let content = require_localized_markdown(&mut errors, "content", &candidate.content, 50000);

    let thumbnail = sanitize::clean_line(&candidate.thumbnail);
    if thumbnail.is_empty() {
        errors.add("thumbnail", "cannot be empty");
    }

    let mut tags = Vec::with_capacity(candidate.tags.len());
    for (i, tag) in candidate.tags.iter().enumerate() {
        let clean = sanitize::clean_line(tag);
        if clean.is_empty() {
            errors.add(&format!("tags.{}", i), "cannot be blank");
        } else if clean.chars().count() > 50 {
            errors.add(&format!("tags.{}", i), "must be at most 50 characters");
        }
        tags.push(clean);
    }

    match (candidate.status, candidate.publish_date) {
        (PostStatus::Published, None) => {
            errors.add("publishDate", "published posts must carry a publish date")
        }
        (PostStatus::Draft, Some(_)) => {
            errors.add("publishDate", "draft posts cannot carry a publish date")
        }
        _ => {}
    }

    errors.into_result(BlogPost {
        id: candidate.id,
        title,
        content,
        excerpt,
        thumbnail,
        status: candidate.status,
        publish_date: candidate.publish_date,
        tags,
        created_at: candidate.created_at,
        updated_at: candidate.updated_at,
    })
}
