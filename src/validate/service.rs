//! Service card rules.
//!
//! - title: at most 100 characters per language, description: at most 500
//! - icon: non-empty name, ASCII alphanumerics plus `-` and `_`
//! - color, bgColor: hex color codes
//! - order: non-negative

use super::{check_color, check_order, require_localized, sanitize, FieldErrors};
use crate::model::Service;

pub fn validate(candidate: &Service) -> Result<Service, FieldErrors> {
    let mut errors = FieldErrors::new();

    let title = require_localized(&mut errors, "title", &candidate.title, 100);
    let description = require_localized(&mut errors, "description", &candidate.description, 500);

    let icon = sanitize::clean_line(&candidate.icon);
    if icon.is_empty() {
        errors.add("icon", "cannot be empty");
    } else if !icon
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        errors.add("icon", "must be an icon name (letters, digits, - or _)");
    }

    let color = check_color(&mut errors, "color", &candidate.color);
    let bg_color = check_color(&mut errors, "bgColor", &candidate.bg_color);
    let order = check_order(&mut errors, candidate.order);

    errors.into_result(Service {
        id: candidate.id,
        title,
        description,
        icon,
        color,
        bg_color,
        order,
        created_at: candidate.created_at,
        updated_at: candidate.updated_at,
    })
}
