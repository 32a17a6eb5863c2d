//! Site settings rules.
//!
//! - colorPalette: between 4 and 16 entries, each a hex color code
//!
//! Language and theme are closed enums, so there is nothing to check beyond
//! the palette.

use super::{check_color, FieldErrors};
use crate::model::SystemSettings;

pub fn validate(candidate: &SystemSettings) -> Result<SystemSettings, FieldErrors> {
    let mut errors = FieldErrors::new();

    if !(4..=16).contains(&candidate.color_palette.len()) {
        errors.add("colorPalette", "must have between 4 and 16 colors");
    }
    let color_palette = candidate
        .color_palette
        .iter()
        .enumerate()
        .map(|(i, color)| check_color(&mut errors, &format!("colorPalette.{}", i), color))
        .collect();

    errors.into_result(SystemSettings {
        default_language: candidate.default_language,
        default_theme: candidate.default_theme,
        color_palette,
        maintenance_mode: candidate.maintenance_mode,
    })
}
