//! Hardware assets and the reference data they point at (categories,
//! locations).

pub mod asset;
pub mod category;
pub mod location;

pub use asset::{Asset, AssetInput, AssetStatus, EXPORT_FIELDS, ValidAsset};
pub use category::{Category, CategoryInput, DEFAULT_ICON_KEY};
pub use location::{Location, LocationInput, LocationStatus, LocationType};
