//! Consumable inventory (cables, toner, spare parts).
//!
//! Deterministic domain logic only (no IO, no HTTP, no storage).

pub mod item;

pub use item::{InventoryInput, InventoryItem, InventoryItemView};
