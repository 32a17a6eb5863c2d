//! About section rules.
//!
//! - description: markdown, at most 2000 characters per language
//! - experience: markdown, at most 1000 characters per language
//! - profileImage: required only when the `require_profile_image` policy is on

use super::{require_localized_markdown, sanitize, FieldErrors};
use crate::model::AboutContent;

pub fn validate(candidate: &AboutContent, require_image: bool) -> Result<AboutContent, FieldErrors> {
    let mut errors = FieldErrors::new();

    let description =
        require_localized_markdown(&mut errors, "description", &candidate.description, 2000);
    let experience =
        require_localized_markdown(&mut errors, "experience", &candidate.experience, 1000);

    let profile_image = sanitize::clean_line(&candidate.profile_image);
    if require_image && profile_image.is_empty() {
        errors.add("profileImage", "an image reference is required");
    }

    errors.into_result(AboutContent {
        description,
        experience,
        profile_image,
    })
}
