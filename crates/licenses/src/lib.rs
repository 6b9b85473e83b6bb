//! Software licenses and their renewal status.

pub mod license;

pub use license::{EXPIRING_SOON_DAYS, License, LicenseInput, LicenseStatus, current_page, derive_status};
