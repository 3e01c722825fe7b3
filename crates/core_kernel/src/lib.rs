//! Core Kernel - Foundational types for the club back-office platform
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise fixed-point decimal arithmetic
//! - Strongly-typed identifiers for domain entities
//! - Common error types

pub mod money;
pub mod identifiers;
pub mod error;

pub use money::{Money, Currency, Rate, MoneyError};
pub use identifiers::{
    InvoiceId, LineItemId, PaymentId, RefundId, DepositId,
    GuestId, EmployeeId, ReservationId, CatalogItemId,
};
pub use error::CoreError;
