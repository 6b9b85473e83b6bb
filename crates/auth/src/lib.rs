//! `itrax-auth` — authentication and authorization boundary.
//!
//! Token issuing/verification, password hashing, user accounts and the role
//! guard. Decoupled from HTTP and storage: the API layer wires these together.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{AuthzError, require_role};
pub use claims::{TokenClaims, TokenKind, TokenValidationError, validate_claims};
pub use password::{PasswordError, hash_password, verify_password};
pub use roles::Role;
pub use token::{AuthError, TokenService};
pub use user::{NewUser, PublicUser, User, UserStatus, normalize_email, signup_role};
