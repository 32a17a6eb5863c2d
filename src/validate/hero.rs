//! Hero section rules.
//!
//! - greeting, name: at most 100 characters per language
//! - title: at most 150, subtitle: at most 300, ctaText: at most 50
//! - ctaLink: non-empty; an anchor (`#...`), a site path (`/...`), or an
//!   absolute URL

use super::{is_absolute_url, require_localized, sanitize, FieldErrors};
use crate::model::HeroContent;

pub fn validate(candidate: &HeroContent) -> Result<HeroContent, FieldErrors> {
    let mut errors = FieldErrors::new();

    let greeting = require_localized(&mut errors, "greeting", &candidate.greeting, 100);
    let name = require_localized(&mut errors, "name", &candidate.name, 100);
    let title = require_localized(&mut errors, "title", &candidate.title, 150);
    let subtitle = require_localized(&mut errors, "subtitle", &candidate.subtitle, 300);
    let cta_text = require_localized(&mut errors, "ctaText", &candidate.cta_text, 50);

    let cta_link = sanitize::clean_line(&candidate.cta_link);
    if cta_link.is_empty() {
        errors.add("ctaLink", "cannot be empty");
    } else if !cta_link.starts_with('#')
        && !cta_link.starts_with('/')
        && !is_absolute_url(&cta_link)
    {
        errors.add("ctaLink", "must be an anchor, a path or an absolute URL");
    }

    errors.into_result(HeroContent {
        greeting,
        name,
        title,
        subtitle,
        cta_text,
        cta_link,
    })
}
