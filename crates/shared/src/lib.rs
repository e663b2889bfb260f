//! Shared types, errors, and configuration for Apex.
//!
//! This crate provides common types used across all other crates:
//! - Money types with decimal precision and currency rounding
//! - Typed numeric IDs and human-facing references
//! - Pagination types for list queries
//! - Application-wide error types
//! - Configuration management
//! - Tracing subscriber initialisation

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

pub use config::{AppConfig, LedgerConfig, RefundFeePolicy};
pub use error::{AppError, AppResult};
