//! Auto-part catalog types.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Part category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum PartCategory {
    EngineParts,
    Brakes,
    Suspension,
    Electrical,
    Filters,
    OilsFluids,
    BodyParts,
    Transmission,
    Cooling,
    Exhaust,
    Interior,
    Exterior,
    Tools,
    Accessories,
}

/// Physical condition of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartCondition {
    /// Factory new.
    #[default]
    New,
    /// Second hand.
    Used,
    /// Restored to working order.
    Refurbished,
    /// Disassembled and rebuilt.
    Rebuilt,
}

/// Listing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartStatus {
    /// Listed for sale.
    #[default]
    Active,
    /// Hidden by the seller.
    Inactive,
    /// Nothing available to sell.
    OutOfStock,
    /// No longer sold.
    Discontinued,
}

impl PartStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::OutOfStock => "out_of_stock",
            Self::Discontinued => "discontinued",
        }
    }
}

impl fmt::Display for PartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A catalog listing.
///
/// `available_quantity` is `stock_quantity - reserved_quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoPart {
    /// Seller SKU, unique.
    pub sku: String,
    /// Manufacturer part number.
    pub part_number: String,
    /// Display name.
    pub name: String,
    /// Brand.
    pub brand: String,
    /// Category.
    pub category: PartCategory,
    /// Condition.
    pub condition: PartCondition,
    /// Listing status.
    pub status: PartStatus,
    /// Makes the part fits; empty means any.
    #[serde(default)]
    pub compatible_makes: Vec<String>,
    /// Models the part fits; empty means any.
    #[serde(default)]
    pub compatible_models: Vec<String>,
    /// Model years the part fits; empty means any.
    #[serde(default)]
    pub compatible_years: Vec<i32>,
    /// What the seller paid.
    pub cost_price: Decimal,
    /// List price.
    pub selling_price: Decimal,
    /// Discount off the list price, in percent.
    #[serde(default)]
    pub discount_percentage: Decimal,
    /// Units on hand.
    pub stock_quantity: u32,
    /// Units held for pending orders.
    pub reserved_quantity: u32,
    /// Units that can be sold now.
    pub available_quantity: u32,
    /// Threshold for restocking.
    pub minimum_stock: u32,
    /// Units sold to date.
    pub total_sold: u64,
}
