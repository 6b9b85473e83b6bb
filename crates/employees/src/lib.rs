//! Admin-managed employee accounts.
//!
//! Employees are ordinary [`itrax_auth::User`] records with the `EMPLOYEE`
//! role; this crate owns the admin-side input rules, listing rows and export.

pub mod employee;

pub use employee::{EXPORT_FIELDS, EmployeeInput, EmployeeRow, ValidEmployee, temp_password};
