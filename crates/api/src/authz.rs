//! API-side role guard.
//!
//! Enforced in handlers before any store access, keeping domain crates
//! HTTP-agnostic.

use itrax_auth::{Role, require_role};

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

/// Only `ADMIN` may continue; anyone else gets 403.
pub fn require_admin(principal: &PrincipalContext) -> Result<(), ApiError> {
    require_role(principal.role(), Role::Admin)?;
    Ok(())
}
