//! Contact details rules.
//!
//! - email: structurally valid
//! - phone: optional; digits, spaces and `+ - ( )` only, at most 30 characters
//! - github / linkedin: optional, but when present must be URLs on their
//!   respective host domains

use super::{check_email, host_matches, sanitize, FieldErrors};
use crate::model::ContactInfo;

pub fn validate(candidate: &ContactInfo) -> Result<ContactInfo, FieldErrors> {
    let mut errors = FieldErrors::new();

    let email = check_email(&mut errors, "email", &candidate.email);

    let phone = sanitize::clean_line(&candidate.phone);
    if !phone.is_empty() {
        let charset_ok = phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
        if !charset_ok || phone.chars().count() > 30 {
            errors.add("phone", "must be a phone number");
        }
    }

    let github = check_profile(&mut errors, "github", &candidate.github, "github.com");
    let linkedin = check_profile(&mut errors, "linkedin", &candidate.linkedin, "linkedin.com");

    errors.into_result(ContactInfo {
        email,
        phone,
        github,
        linkedin,
    })
}

fn check_profile(
    errors: &mut FieldErrors,
    field: &str,
    value: &Option<String>,
    domain: &str,
) -> Option<String> {
    let raw = value.as_deref()?;
    let clean = sanitize::clean_line(raw);
    if clean.is_empty() {
        return None;
    }
    if !host_matches(&clean, domain) {
        errors.add(field, &format!("must be a URL on {}", domain));
    }
    Some(clean)
}
