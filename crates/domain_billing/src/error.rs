//! Billing domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::MoneyError;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Malformed or out-of-range input, rejected before any lock is taken
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation invalid for the current status of the entity
    #[error("Invalid {entity} status transition: {from} -> {to}")]
    InvalidStatusTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// Operation conflicts with the current state of the ledger
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Payment amount exceeds the outstanding balance
    #[error("Payment of {attempted} exceeds balance due of {balance_due}")]
    Overpayment {
        attempted: Decimal,
        balance_due: Decimal,
    },

    /// Refund amount exceeds what was actually collected
    #[error("Refund of {attempted} exceeds refundable amount of {refundable}")]
    ExcessRefund {
        attempted: Decimal,
        refundable: Decimal,
    },

    /// Deposit can no longer be applied
    #[error("Deposit expired on {0}")]
    DepositExpired(chrono::NaiveDate),

    /// Derived fields disagree with the ledger; the write is aborted
    #[error("Ledger inconsistency: {0}")]
    Inconsistency(String),

    /// Stale optimistic version; the caller should re-read and retry
    #[error("Concurrent modification: expected version {expected}, found {found}")]
    ConcurrencyConflict { expected: i64, found: i64 },

    /// Invoice not found
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Payment not found
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Refund not found
    #[error("Refund not found: {0}")]
    RefundNotFound(String),

    /// Deposit not found
    #[error("Deposit not found: {0}")]
    DepositNotFound(String),

    /// Money arithmetic error (currency mismatch etc.)
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    pub fn state_conflict(message: impl Into<String>) -> Self {
        BillingError::StateConflict(message.into())
    }

    pub fn inconsistency(message: impl Into<String>) -> Self {
        BillingError::Inconsistency(message.into())
    }

    /// Returns true if the caller may retry the operation after a re-read
    pub fn is_retryable(&self) -> bool {
        matches!(self, BillingError::ConcurrencyConflict { .. })
    }
}
