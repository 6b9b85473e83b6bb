use thiserror::Error;

use crate::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: requires role {0}")]
    Forbidden(Role),
}

/// Allow the request only when the caller holds exactly `required`.
pub fn require_role(actual: Role, required: Role) -> Result<(), AuthzError> {
    if actual == required {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employees_cannot_pass_admin_guard() {
        assert!(require_role(Role::Admin, Role::Admin).is_ok());
        assert_eq!(
            require_role(Role::Employee, Role::Admin),
            Err(AuthzError::Forbidden(Role::Admin))
        );
    }
}
