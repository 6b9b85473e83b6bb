use itrax_auth::{Role, User};
use itrax_core::{OrgId, RecordId};

/// Organization context for a request.
///
/// Immutable; present on every authenticated route and the only source of the
/// org scope handlers query with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct OrgContext {
    org_id: OrgId,
}

impl OrgContext {
    pub fn new(org_id: OrgId) -> Self {
        Self { org_id }
    }

    pub fn org_id(&self) -> OrgId {
        self.org_id
    }
}

/// The authenticated user, freshly loaded from the store for this request.
#[derive(Debug, Clone, PartialEq)]
pub struct PrincipalContext {
    user: User,
}

impl PrincipalContext {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> RecordId {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn user(&self) -> &User {
        &self.user
    }
}
