//! Billing Domain - Invoice Ledger for the Club Back-Office
//!
//! This crate implements the billing ledger for the club platform: the
//! invoice aggregate with its owned line items, the append-only payment and
//! refund records, and guest deposits that are later applied to invoices.
//!
//! # Ledger Invariants
//!
//! For every invoice at rest:
//! - `total = subtotal + service_charge + tax - discount`
//! - `amount_paid = Σ(completed payments) - Σ(processed refunds)`
//! - `balance_due = total - amount_paid`, and never negative
//!
//! All derived fields are recomputed in one place ([`Invoice::recalculate`]);
//! a negative raw balance is surfaced as [`BillingError::Inconsistency`]
//! rather than silently corrected, since it indicates a bug elsewhere in
//! the system.
//!
//! # Append-Only Records
//!
//! Payments and refunds are never rewritten once final: a refund is a
//! separate positive-amount record, not a sign flip on a payment. The only
//! post-completion mutations are refund workflow status fields and the
//! refund linkage (`Payment::refunded_amount`).

pub mod invoice;
pub mod line_item;
pub mod payment;
pub mod refund;
pub mod deposit;
pub mod config;
pub mod error;

pub use invoice::{Invoice, InvoiceStatus};
pub use line_item::{LineItem, LineItemKind};
pub use payment::{Payment, PaymentMethod, PaymentType, PaymentStatus};
pub use refund::{Refund, RefundStatus};
pub use deposit::{Deposit, DepositStatus};
pub use config::BillingConfig;
pub use error::BillingError;
