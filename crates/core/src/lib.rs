//! `itrax-core` — shared domain building blocks.
//!
//! Identifiers, the domain error model, pagination and the `Record` contract
//! every persisted entity implements. No storage or HTTP concerns live here.

pub mod error;
pub mod id;
pub mod page;
pub mod record;
pub mod time;
pub mod validation;

pub use error::DomainError;
pub use id::{OrgId, RecordId};
pub use page::{Page, PageRequest};
pub use record::Record;
pub use validation::FieldErrors;
