//! Input checks shared by descriptors
//!
//! Every check returns [`ApiError::Validation`] with a message fit for a toast.

use api_client::{ApiError, Result};

/// Minimum length for new passwords
pub const MIN_PASSWORD_LEN: usize = 8;

/// Length of email verification and reset codes
pub const CODE_LEN: usize = 6;

/// Reject blank values
pub fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Loose email shape check: one `@`, a dot in the domain, no whitespace
pub fn email(value: &str) -> Result<()> {
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ApiError::validation("Please enter a valid email address"));
    }
    Ok(())
}

/// Six ASCII digits
pub fn verification_code(code: &str) -> Result<()> {
    if code.len() != CODE_LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::validation("Verification code must be 6 digits"));
    }
    Ok(())
}

/// Password strong enough to be set
pub fn new_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// An id that can be placed in a URL path without escaping
pub fn path_id(field: &str, id: &str) -> Result<()> {
    require_non_empty(field, id)?;
    if id.chars().any(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace()) {
        return Err(ApiError::validation(format!("{} is not a valid id", field)));
    }
    Ok(())
}
