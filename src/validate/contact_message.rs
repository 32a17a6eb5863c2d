//! Visitor message rules.
//!
//! - name: at most 100 characters
//! - email: structurally valid, at most 254 characters
//! - message: multi-line plain text, at most 5000 characters
//!
//! The timestamp and read flag have no rules; immutability of the rest is
//! enforced by the patch type, not here.

use super::{check_email, require_text, sanitize, FieldErrors};
use crate::model::ContactMessage;

pub fn validate(candidate: &ContactMessage) -> Result<ContactMessage, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = require_text(&mut errors, "name", &candidate.name, 100);
    let email = check_email(&mut errors, "email", &candidate.email);

    let message = sanitize::clean_block(&candidate.message);
    if message.is_empty() {
        errors.add("message", "cannot be empty");
    } else if message.chars().count() > 5000 {
        errors.add("message", "must be at most 5000 characters");
    }

    errors.into_result(ContactMessage {
        id: candidate.id,
        name,
        email,
        message,
        timestamp: candidate.timestamp,
        read: candidate.read,
    })
}
