use lazy_static::lazy_static;
use regex::Regex;

use super::dto::RegisterInput;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_IMAGE_BYTES: usize = 500_000;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Returns the names of the fields that failed.
pub fn validate_registration(input: &RegisterInput) -> Result<(), Vec<&'static str>> {
    let mut failed = Vec::new();
    if input.name.trim().is_empty() {
        failed.push("name");
    }
    if !is_valid_email(&input.email) {
        failed.push("email");
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        failed.push("password");
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(failed)
    }
}
