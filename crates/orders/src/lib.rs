//! Procurement order tracking.
//!
//! Orders move through six delivery stages; every stage change is appended to
//! the order's tracking history so the current status is always the stage of
//! the latest history entry. Pure domain logic: no IO, no HTTP, no storage.

pub mod order;
pub mod status;

pub use order::{EXPORT_FIELDS, Order, OrderCreator, OrderInput, ValidOrder, generate_order_id};
pub use status::{OrderStatus, TrackingEntry, parse_status_change};
