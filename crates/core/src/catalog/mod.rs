//! Auto-parts catalog helpers.
//!
//! # Modules
//!
//! - `types` - Listing, category, condition, status
//! - `part` - Compatibility, pricing and stock helpers

pub mod part;
pub mod types;

pub use part::{
    final_price, is_compatible_with_vehicle, is_in_stock, is_low_stock, profit_margin,
    release_reserved_stock, reserve_stock, update_stock,
};
pub use types::{AutoPart, PartCategory, PartCondition, PartStatus};
