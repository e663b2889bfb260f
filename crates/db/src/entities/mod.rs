//! `SeaORM` entity definitions.
//!
//! One module per table; PostgreSQL enum types live in
//! `sea_orm_active_enums`.

pub mod credit_lines;
pub mod invoices;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod wallets;
