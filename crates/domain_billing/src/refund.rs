//! Refund records and their approval workflow
//!
//! A refund is a positive-amount record of money returned against an
//! invoice, optionally tied to one specific payment. Refunds move through
//! a one-way workflow and affect invoice balances only once processed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{EmployeeId, InvoiceId, Money, PaymentId, RefundId};

use crate::error::BillingError;
use crate::payment::PaymentMethod;

/// Refund workflow status
///
/// Transitions are one-way; nothing ever returns to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundStatus {
    /// Requested, awaiting a decision
    Pending,
    /// Approved, awaiting processing
    Approved,
    /// Money returned; the only status that affects balances
    Processed,
    /// Declined
    Rejected,
    /// Withdrawn before processing
    Cancelled,
}

impl RefundStatus {
    /// Returns true for dead-end states
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            RefundStatus::Processed | RefundStatus::Rejected | RefundStatus::Cancelled
        )
    }
}

/// A record of money returned against an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    /// Unique identifier
    pub id: RefundId,
    /// Invoice the money is returned against
    pub invoice_id: InvoiceId,
    /// Specific payment being partially refunded, or None for a refund
    /// against the invoice's aggregate paid amount
    pub payment_id: Option<PaymentId>,
    /// Refund amount, always positive
    pub amount: Money,
    /// Why the money is being returned
    pub reason: String,
    /// How the money goes back out
    pub method: PaymentMethod,
    /// Workflow status
    pub status: RefundStatus,
    /// Operator who requested the refund
    pub requested_by: EmployeeId,
    /// Operator who approved it
    pub approved_by: Option<EmployeeId>,
    /// Operator who processed it
    pub processed_by: Option<EmployeeId>,
    /// When the refund was requested
    pub requested_at: DateTime<Utc>,
    /// When it was approved
    pub approved_at: Option<DateTime<Utc>>,
    /// When it was processed
    pub processed_at: Option<DateTime<Utc>>,
}

impl Refund {
    /// Creates a new pending refund request
    ///
    /// # Errors
    ///
    /// Returns a validation error if the amount is not strictly positive
    /// or the reason is empty.
    pub fn new(
        invoice_id: InvoiceId,
        amount: Money,
        reason: impl Into<String>,
        method: PaymentMethod,
        requested_by: EmployeeId,
    ) -> Result<Self, BillingError> {
        if !amount.is_positive() {
            return Err(BillingError::validation("Refund amount must be positive"));
        }
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(BillingError::validation("Refund reason must not be empty"));
        }

        Ok(Self {
            id: RefundId::new_v7(),
            invoice_id,
            payment_id: None,
            amount,
            reason,
            method,
            status: RefundStatus::Pending,
            requested_by,
            approved_by: None,
            processed_by: None,
            requested_at: Utc::now(),
            approved_at: None,
            processed_at: None,
        })
    }

    /// Targets this refund at one specific payment
    pub fn with_target_payment(mut self, payment_id: PaymentId) -> Self {
        self.payment_id = Some(payment_id);
        self
    }

    /// Approves a pending refund
    pub fn approve(&mut self, approver: EmployeeId) -> Result<(), BillingError> {
        self.transition_to(RefundStatus::Approved)?;
        self.approved_by = Some(approver);
        self.approved_at = Some(Utc::now());
        Ok(())
    }

    /// Processes the refund; valid from pending or approved
    ///
    /// Processing is the only transition that affects invoice balances.
    pub fn process(&mut self, processor: EmployeeId) -> Result<(), BillingError> {
        self.transition_to(RefundStatus::Processed)?;
        self.processed_by = Some(processor);
        self.processed_at = Some(Utc::now());
        Ok(())
    }

    /// Rejects a pending refund
    pub fn reject(&mut self, approver: EmployeeId) -> Result<(), BillingError> {
        self.transition_to(RefundStatus::Rejected)?;
        self.approved_by = Some(approver);
        Ok(())
    }

    /// Withdraws a refund that has not yet been processed
    pub fn cancel(&mut self) -> Result<(), BillingError> {
        self.transition_to(RefundStatus::Cancelled)
    }

    /// Returns true once the refund counts against the invoice balance
    pub fn is_processed(&self) -> bool {
        self.status == RefundStatus::Processed
    }

    fn transition_to(&mut self, target: RefundStatus) -> Result<(), BillingError> {
        if !self.can_transition_to(target) {
            return Err(BillingError::InvalidStatusTransition {
                entity: "refund",
                from: format!("{:?}", self.status),
                to: format!("{:?}", target),
            });
        }
        self.status = target;
        Ok(())
    }

    /// Checks if a transition is valid
    fn can_transition_to(&self, target: RefundStatus) -> bool {
        use RefundStatus::*;
        matches!(
            (self.status, target),
            (Pending, Approved)
                | (Pending, Processed)
                | (Approved, Processed)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Approved, Cancelled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn refund() -> Refund {
        Refund::new(
            InvoiceId::new_v7(),
            Money::new(dec!(30.00), Currency::USD),
            "cancellation",
            PaymentMethod::Card,
            EmployeeId::new_v7(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_refund_is_pending() {
        let r = refund();
        assert_eq!(r.status, RefundStatus::Pending);
        assert!(r.approved_by.is_none());
        assert!(r.processed_at.is_none());
    }

    #[test]
    fn test_empty_reason_rejected() {
        let result = Refund::new(
            InvoiceId::new_v7(),
            Money::new(dec!(30.00), Currency::USD),
            "   ",
            PaymentMethod::Card,
            EmployeeId::new_v7(),
        );
        assert!(matches!(result, Err(BillingError::Validation(_))));
    }

    #[test]
    fn test_approve_then_process() {
        let mut r = refund();
        let approver = EmployeeId::new_v7();
        let processor = EmployeeId::new_v7();

        r.approve(approver).unwrap();
        assert_eq!(r.status, RefundStatus::Approved);
        assert_eq!(r.approved_by, Some(approver));

        r.process(processor).unwrap();
        assert!(r.is_processed());
        assert_eq!(r.processed_by, Some(processor));
        assert!(r.processed_at.is_some());
    }

    #[test]
    fn test_process_directly_from_pending() {
        let mut r = refund();
        assert!(r.process(EmployeeId::new_v7()).is_ok());
    }

    #[test]
    fn test_no_transition_out_of_processed() {
        let mut r = refund();
        r.process(EmployeeId::new_v7()).unwrap();

        assert!(r.approve(EmployeeId::new_v7()).is_err());
        assert!(r.cancel().is_err());
        assert!(r.reject(EmployeeId::new_v7()).is_err());
    }

    #[test]
    fn test_rejected_is_dead_end() {
        let mut r = refund();
        r.reject(EmployeeId::new_v7()).unwrap();

        assert!(r.process(EmployeeId::new_v7()).is_err());
        assert!(r.approve(EmployeeId::new_v7()).is_err());
    }

    #[test]
    fn test_cancel_from_approved() {
        let mut r = refund();
        r.approve(EmployeeId::new_v7()).unwrap();
        assert!(r.cancel().is_ok());
        assert_eq!(r.status, RefundStatus::Cancelled);
    }

    #[test]
    fn test_approve_only_from_pending() {
        let mut r = refund();
        r.approve(EmployeeId::new_v7()).unwrap();
        // second approval is invalid
        assert!(matches!(
            r.approve(EmployeeId::new_v7()),
            Err(BillingError::InvalidStatusTransition { .. })
        ));
    }
}
