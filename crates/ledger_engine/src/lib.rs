//! Ledger Engine - the single mutation path for the billing ledger
//!
//! Every external mutation of an invoice (recording a payment, processing
//! a refund, applying a deposit, structural edits) goes through
//! [`LedgerEngine`], which serializes work per invoice with a row lock,
//! re-validates against fresh reads inside the lock, recomputes all
//! derived fields, and persists the result atomically. No handler
//! computes totals on its own.
//!
//! # Locking
//!
//! One async mutex per invoice row, held from the first fresh read to the
//! final persist. Deposit application takes the deposit lock first, then
//! the invoice lock; no code path acquires them in the reverse order.
//!
//! # Failure atomicity
//!
//! Mutations are staged on owned clones and written to the store only
//! after validation and recalculation succeed, so a rejected payment or
//! refund leaves no partial state behind.

pub mod store;
pub mod engine;
pub mod payments;
pub mod refunds;
pub mod deposits;

pub use engine::{
    CreateInvoice, InvoiceSnapshot, LedgerEngine, NewLineItem, ReconciliationReport,
};
pub use payments::SubmitPayment;
pub use refunds::RequestRefund;
pub use deposits::{ApplyDeposit, CreateDeposit};
pub use store::LedgerStore;
