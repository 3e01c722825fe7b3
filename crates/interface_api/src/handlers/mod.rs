//! Request handlers

pub mod health;
pub mod invoices;
pub mod payments;
pub mod refunds;
pub mod deposits;
