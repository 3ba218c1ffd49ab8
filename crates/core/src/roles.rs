//! Well-known role name constants.
//!
//! These must match the `chk_users_role` check constraint in
//! `20260301000002_create_users_and_clients.sql`.

use crate::error::CoreError;

pub const ROLE_SUPERADMIN: &str = "superadmin";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_INSPECTOR: &str = "inspector";
pub const ROLE_USER: &str = "user";

/// All valid role values.
pub const VALID_ROLES: &[&str] = &[ROLE_SUPERADMIN, ROLE_ADMIN, ROLE_INSPECTOR, ROLE_USER];

/// Validate that a role string is one of the accepted values.
pub fn validate_role(role: &str) -> Result<(), CoreError> {
    if VALID_ROLES.contains(&role) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid role '{role}'. Must be one of: {}",
            VALID_ROLES.join(", ")
        )))
    }
}

/// Organization administrators and platform superadmins.
pub fn is_admin(role: &str) -> bool {
    role == ROLE_ADMIN || role == ROLE_SUPERADMIN
}

/// Roles allowed to run inspections.
pub fn can_inspect(role: &str) -> bool {
    role == ROLE_INSPECTOR || is_admin(role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_roles_accepted() {
        for role in VALID_ROLES {
            assert!(validate_role(role).is_ok());
        }
    }

    #[test]
    fn unknown_role_rejected() {
        let err = validate_role("owner").unwrap_err();
        assert!(err.to_string().contains("Invalid role"));
    }

    #[test]
    fn admin_roles_can_inspect() {
        assert!(can_inspect(ROLE_INSPECTOR));
        assert!(can_inspect(ROLE_ADMIN));
        assert!(can_inspect(ROLE_SUPERADMIN));
        assert!(!can_inspect(ROLE_USER));
    }
}
