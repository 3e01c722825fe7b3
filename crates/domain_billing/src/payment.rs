//! Payment records
//!
//! A payment is a positive-amount, append-only record of money received
//! against one invoice. Refunds are separate records, never a sign flip
//! here; once completed the only mutable field is the refund linkage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{DepositId, EmployeeId, InvoiceId, Money, PaymentId};

use crate::error::BillingError;

/// How the money was received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash at the desk
    Cash,
    /// Credit or debit card
    Card,
    /// Bank transfer
    BankTransfer,
    /// Gift certificate redemption
    GiftCertificate,
    /// Charge to the guest's member account
    MemberAccount,
}

/// What produced this payment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
    /// Ordinary payment submitted against the invoice
    Regular,
    /// Funds moved from a guest deposit on file
    DepositApplication,
    /// Back-office manual adjustment
    Manual,
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Recorded but not yet settled
    Pending,
    /// Settled; counts towards the invoice's amount paid
    Completed,
    /// Did not settle
    Failed,
}

/// A record of money received against an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Invoice being paid
    pub invoice_id: InvoiceId,
    /// Payment amount, always positive
    pub amount: Money,
    /// How the money was received
    pub method: PaymentMethod,
    /// What produced this record
    pub kind: PaymentType,
    /// Status
    pub status: PaymentStatus,
    /// Client-supplied deduplication token, unique when present
    pub idempotency_key: Option<String>,
    /// Deposit that funded this payment, for audit lookup only
    pub deposit_id: Option<DepositId>,
    /// Cumulative amount returned through processed refunds targeting
    /// this payment
    pub refunded_amount: Money,
    /// Operator who recorded the payment
    pub processed_by: EmployeeId,
    /// Payment date
    pub payment_date: DateTime<Utc>,
    /// When status changed to completed
    pub completed_at: Option<DateTime<Utc>>,
    /// Notes
    pub notes: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a new pending payment
    ///
    /// # Errors
    ///
    /// Returns a validation error if the amount is not strictly positive.
    pub fn new(
        invoice_id: InvoiceId,
        amount: Money,
        method: PaymentMethod,
        kind: PaymentType,
        processed_by: EmployeeId,
    ) -> Result<Self, BillingError> {
        if !amount.is_positive() {
            return Err(BillingError::validation("Payment amount must be positive"));
        }

        let now = Utc::now();
        Ok(Self {
            id: PaymentId::new_v7(),
            invoice_id,
            amount,
            method,
            kind,
            status: PaymentStatus::Pending,
            idempotency_key: None,
            deposit_id: None,
            refunded_amount: Money::zero(amount.currency()),
            processed_by,
            payment_date: now,
            completed_at: None,
            notes: None,
            created_at: now,
        })
    }

    /// Attaches the client-supplied idempotency key
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Records which deposit funded this payment
    pub fn with_deposit(mut self, deposit_id: DepositId) -> Self {
        self.deposit_id = Some(deposit_id);
        self
    }

    /// Marks the payment as completed
    pub fn complete(&mut self) {
        self.status = PaymentStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Marks the payment as failed
    pub fn fail(&mut self, reason: &str) {
        self.status = PaymentStatus::Failed;
        self.notes = Some(reason.to_string());
    }

    /// Returns true once the payment counts towards the invoice balance
    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }

    /// Amount still refundable against this specific payment
    pub fn refundable_amount(&self) -> Money {
        self.amount - self.refunded_amount
    }

    /// Links a processed refund back to this payment
    ///
    /// # Errors
    ///
    /// Returns `ExcessRefund` if the cumulative refunded amount would
    /// exceed the payment amount.
    pub fn record_refund(&mut self, amount: Money) -> Result<(), BillingError> {
        let new_total = self.refunded_amount.checked_add(&amount)?;
        if new_total > self.amount {
            return Err(BillingError::ExcessRefund {
                attempted: amount.amount(),
                refundable: self.refundable_amount().amount(),
            });
        }
        self.refunded_amount = new_total;
        Ok(())
    }
}
