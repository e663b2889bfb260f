//! Pricing, compatibility and stock helpers for catalog listings.

use rust_decimal::Decimal;

use apex_shared::types::round_currency;

use crate::catalog::types::{AutoPart, PartStatus};

/// Returns true if the part fits the vehicle. An empty compatibility list
/// places no restriction on that attribute.
#[must_use]
pub fn is_compatible_with_vehicle(part: &AutoPart, make: &str, model: &str, year: i32) -> bool {
    let fits = |list: &[String], value: &str| list.is_empty() || list.iter().any(|v| v == value);
    fits(&part.compatible_makes, make)
        && fits(&part.compatible_models, model)
        && (part.compatible_years.is_empty() || part.compatible_years.contains(&year))
}

/// Returns true if at least one unit can be sold.
#[must_use]
pub fn is_in_stock(part: &AutoPart) -> bool {
    part.available_quantity > 0
}

/// Returns true if the available units are at or below the restock
/// threshold.
#[must_use]
pub fn is_low_stock(part: &AutoPart) -> bool {
    part.available_quantity <= part.minimum_stock
}

/// Markup over cost in percent, rounded to 2 places. Zero when the cost is
/// zero.
#[must_use]
pub fn profit_margin(part: &AutoPart) -> Decimal {
    if part.cost_price.is_zero() {
        return Decimal::ZERO;
    }
    ((part.selling_price - part.cost_price) / part.cost_price * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Selling price after the listing discount.
#[must_use]
pub fn final_price(part: &AutoPart) -> Decimal {
    if part.discount_percentage > Decimal::ZERO {
        round_currency(
            part.selling_price * (Decimal::ONE - part.discount_percentage / Decimal::ONE_HUNDRED),
        )
    } else {
        part.selling_price
    }
}

/// Records a sale. Stock never goes below zero; a listing with nothing
/// left to sell becomes `OutOfStock`.
pub fn update_stock(part: &mut AutoPart, sold: u32) {
    part.stock_quantity = part.stock_quantity.saturating_sub(sold);
    part.available_quantity = part.stock_quantity.saturating_sub(part.reserved_quantity);
    part.total_sold += u64::from(sold);
    if part.available_quantity == 0 {
        part.status = PartStatus::OutOfStock;
    }
}

/// Holds units for a pending order. Returns false, leaving the part
/// untouched, when not enough units are available.
pub fn reserve_stock(part: &mut AutoPart, quantity: u32) -> bool {
    if part.available_quantity < quantity {
        return false;
    }
    part.reserved_quantity += quantity;
    part.available_quantity -= quantity;
    true
}

/// Returns reserved units to the available pool, at most what is reserved.
pub fn release_reserved_stock(part: &mut AutoPart, quantity: u32) {
    let released = quantity.min(part.reserved_quantity);
    part.reserved_quantity -= released;
    part.available_quantity += released;
}
