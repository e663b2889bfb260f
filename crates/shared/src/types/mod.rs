//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;
pub mod reference;

pub use id::*;
pub use money::{
    AmountError, Currency, Money, ensure_currency_amount, ensure_currency_scale, parse_amount,
    round_currency,
};
pub use pagination::{PageRequest, PageResponse};
pub use reference::{ReferenceKind, new_reference};
