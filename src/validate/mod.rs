//! # Validation
//!
//! Pure check-and-sanitize functions, one module per entity kind. Each
//! `validate` takes a complete candidate value and returns either a sanitized
//! copy or a [`FieldErrors`] map. Nothing here touches storage, so the same
//! functions can run speculatively (live preview) and again on the write
//! path.
//!
//! All failures for a candidate are collected in one pass. Error keys are the
//! entity's camelCase field names; bilingual fields report per language as
//! `field.vi` / `field.en`.
//!
//! Sanitization (see [`sanitize`]) happens before the rules run: free text is
//! trimmed and stripped of markup, markdown bodies keep their structure but
//! lose raw HTML. Out-of-range values are never silently clamped; a bad
//! `order` or an oversized field is a hard error so explicit intent is not
//! corrupted quietly.

pub mod about;
pub mod blog_post;
pub mod contact_info;
pub mod contact_message;
pub mod hero;
pub mod project;
pub mod sanitize;
pub mod service;
pub mod settings;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use crate::model::LocalizedText;

/// Field-keyed validation failures. Ordered by field name so error output is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        // First error per field wins; later rules don't overwrite it.
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolve into the sanitized value when no rule failed.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

// =============================================================================
// Shared rules
// =============================================================================

/// Sanitize and check one required single-line text field.
pub(crate) fn require_text(
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    max: usize,
) -> String {
    let clean = sanitize::clean_line(value);
    check_length(errors, field, &clean, max);
    clean
}

/// Sanitize and check both sides of a required bilingual field.
pub(crate) fn require_localized(
    errors: &mut FieldErrors,
    field: &str,
    value: &LocalizedText,
    max: usize,
) -> LocalizedText {
    let vi = sanitize::clean_line(&value.vi);
    let en = sanitize::clean_line(&value.en);
    check_length(errors, &format!("{}.vi", field), &vi, max);
    check_length(errors, &format!("{}.en", field), &en, max);
    LocalizedText { vi, en }
}

/// Bilingual markdown body: raw HTML is stripped, structure kept.
pub(crate) fn require_localized_markdown(
    errors: &mut FieldErrors,
    field: &str,
    value: &LocalizedText,
    max: usize,
) -> LocalizedText {
    let vi = sanitize::clean_markdown(&value.vi);
    let en = sanitize::clean_markdown(&value.en);
    check_length(errors, &format!("{}.vi", field), &vi, max);
    check_length(errors, &format!("{}.en", field), &en, max);
    LocalizedText { vi, en }
}

fn check_length(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.is_empty() {
        errors.add(field, "cannot be empty");
    } else if value.chars().count() > max {
        errors.add(field, &format!("must be at most {} characters", max));
    }
}

/// Hex color code: `#RGB`, `#RRGGBB` or `#RRGGBBAA`.
pub(crate) fn check_color(errors: &mut FieldErrors, field: &str, value: &str) -> String {
    let clean = sanitize::clean_line(value);
    if !is_color_code(&clean) {
        errors.add(field, "must be a hex color code like #1e40af");
    }
    clean
}

pub(crate) fn is_color_code(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => {
            matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// Explicit ordering positions must be non-negative. Out-of-range values are
/// a hard error, not a clamp.
pub(crate) fn check_order(errors: &mut FieldErrors, value: i64) -> i64 {
    if value < 0 {
        errors.add("order", "must not be negative");
    }
    value
}

/// Structural email check: one `@`, non-empty local part, dotted domain.
pub(crate) fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

pub(crate) fn check_email(errors: &mut FieldErrors, field: &str, value: &str) -> String {
    let clean = sanitize::clean_line(value);
    if clean.is_empty() {
        errors.add(field, "cannot be empty");
    } else if clean.chars().count() > 254 || !is_valid_email(&clean) {
        errors.add(field, "must be a valid email address");
    }
    clean
}

/// Absolute URL check via the `url` crate. Relative references fail parse,
/// which is what we want for outbound links.
pub(crate) fn is_absolute_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

/// True when the URL parses and its host is `domain` or a subdomain of it.
pub(crate) fn host_matches(value: &str, domain: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => url
            .host_str()
            .is_some_and(|host| host == domain || host.ends_with(&format!(".{}", domain))),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_first_wins_and_sorted() {
        let mut errors = FieldErrors::new();
        errors.add("title.en", "cannot be empty");
        errors.add("color", "must be a hex color code like #1e40af");
        errors.add("title.en", "later message");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("title.en"), Some("cannot be empty"));
        assert_eq!(
            errors.to_string(),
            "color: must be a hex color code like #1e40af; title.en: cannot be empty"
        );
    }

    #[test]
    fn test_into_result() {
        let empty = FieldErrors::new();
        assert_eq!(empty.into_result(7), Ok(7));

        let mut errors = FieldErrors::new();
        errors.add("name", "cannot be empty");
        assert!(errors.into_result(7).is_err());
    }

    #[test]
    fn test_color_codes() {
        assert!(is_color_code("#fff"));
        assert!(is_color_code("#1e40af"));
        assert!(is_color_code("#1e40afcc"));
        assert!(!is_color_code("1e40af"));
        assert!(!is_color_code("#1e40a"));
        assert!(!is_color_code("#gggggg"));
        assert!(!is_color_code(""));
    }

    #[test]
    fn test_email_structure() {
        assert!(is_valid_email("an@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("an@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("an@"));
        assert!(!is_valid_email("an@ex ample.com"));
        assert!(!is_valid_email("an@@example.com"));
        assert!(!is_valid_email("an@.com"));
        assert!(!is_valid_email("plainaddress"));
    }

    #[test]
    fn test_host_matches() {
        assert!(host_matches("https://github.com/someone", "github.com"));
        assert!(host_matches("https://www.linkedin.com/in/x", "linkedin.com"));
        assert!(!host_matches("https://example.com/github.com", "github.com"));
        assert!(!host_matches("https://evilgithub.com/x", "github.com"));
        assert!(!host_matches("not a url", "github.com"));
    }

    #[test]
    fn test_require_localized_reports_each_side() {
        let mut errors = FieldErrors::new();
        let value = LocalizedText::new("", "Hello");
        let clean = require_localized(&mut errors, "greeting", &value, 100);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("greeting.vi"), Some("cannot be empty"));
        assert!(errors.get("greeting.en").is_none());
        assert_eq!(clean.en, "Hello");
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let mut errors = FieldErrors::new();
        // 10 Vietnamese characters, more than 10 bytes
        require_text(&mut errors, "name", "Diễm Hương x", 12);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_check_order() {
        let mut errors = FieldErrors::new();
        assert_eq!(check_order(&mut errors, 0), 0);
        assert_eq!(check_order(&mut errors, 12), 12);
        assert!(errors.is_empty());

        check_order(&mut errors, -1);
        assert_eq!(errors.get("order"), Some("must not be negative"));
    }
}
