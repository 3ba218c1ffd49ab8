//! Validation helpers for directory records (organizations, areas,
//! departments, users, clients).

use crate::error::CoreError;
use crate::roles::{validate_role, ROLE_SUPERADMIN};

/// Maximum length of a display name.
pub const MAX_NAME_LEN: usize = 200;

/// Trim `value` and require it to be non-blank and reasonably short.
pub fn validate_name(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be blank")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Like [`validate_name`] for optional update fields.
pub fn validate_optional_name(field: &str, value: Option<&str>) -> Result<Option<String>, CoreError> {
    value.map(|v| validate_name(field, v)).transpose()
}

/// Roles an organization admin may hand out. Superadmin is platform-level.
pub fn validate_assignable_role(role: &str) -> Result<(), CoreError> {
    validate_role(role)?;
    if role == ROLE_SUPERADMIN {
        return Err(CoreError::Forbidden(
            "The superadmin role cannot be assigned within an organization".into(),
        ));
    }
    Ok(())
}

/// Normalize an email address for storage and uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
