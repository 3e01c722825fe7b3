//! Refund workflow operations
//!
//! Refunds are requested, then approved or rejected, then processed.
//! Only processing touches invoice balances, and it re-validates the
//! refundable bound under the invoice row lock so the check is race-free.

use serde::{Deserialize, Serialize};
use tracing::info;

use core_kernel::{EmployeeId, InvoiceId, Money, PaymentId, RefundId};
use domain_billing::{BillingError, Payment, PaymentMethod, Refund};

use crate::engine::LedgerEngine;

/// Request to return money against an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRefund {
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub reason: String,
    pub method: PaymentMethod,
    /// Specific payment to refund against, or None for the invoice's
    /// aggregate paid amount
    pub payment_id: Option<PaymentId>,
    pub requested_by: EmployeeId,
}

impl LedgerEngine {
    /// Creates a pending refund request
    ///
    /// The refundable bound is validated here against the persisted
    /// ledger and again, under the row lock, when the refund is
    /// processed.
    ///
    /// # Errors
    ///
    /// * [`BillingError::Validation`] for non-positive amounts, an empty
    ///   reason, or a target payment on a different invoice
    /// * [`BillingError::ExcessRefund`] when the amount exceeds what was
    ///   collected (in aggregate or on the targeted payment)
    pub async fn request_refund(&self, request: RequestRefund) -> Result<Refund, BillingError> {
        let mut refund = Refund::new(
            request.invoice_id,
            request.amount,
            request.reason,
            request.method,
            request.requested_by,
        )?;
        if let Some(payment_id) = request.payment_id {
            refund = refund.with_target_payment(payment_id);
        }

        let invoice = self.store().get_invoice(request.invoice_id).await?;
        let refunds = self.store().refunds_for_invoice(request.invoice_id).await;
        check_refundable(&invoice.amount_paid, &refunds, &refund)?;

        if let Some(payment_id) = refund.payment_id {
            let payment = self.store().get_payment(payment_id).await?;
            check_target_payment(&payment, &refund)?;
        }

        self.store().insert_refund(refund.clone()).await;
        info!(
            invoice = %invoice.invoice_number,
            refund = %refund.id,
            amount = %refund.amount,
            "Refund requested"
        );
        Ok(refund)
    }

    /// Approves a pending refund
    pub async fn approve_refund(
        &self,
        refund_id: RefundId,
        approver: EmployeeId,
    ) -> Result<Refund, BillingError> {
        self.transition_refund(refund_id, |refund| refund.approve(approver))
            .await
    }

    /// Rejects a pending refund
    pub async fn reject_refund(
        &self,
        refund_id: RefundId,
        approver: EmployeeId,
    ) -> Result<Refund, BillingError> {
        self.transition_refund(refund_id, |refund| refund.reject(approver))
            .await
    }

    /// Withdraws a refund that has not been processed yet
    pub async fn cancel_refund(&self, refund_id: RefundId) -> Result<Refund, BillingError> {
        self.transition_refund(refund_id, |refund| refund.cancel())
            .await
    }

    /// Processes a refund; the only transition that affects balances
    ///
    /// Under the invoice row lock the cumulative processed refunds
    /// (excluding this one) plus this amount are re-checked against the
    /// fresh amount paid, the targeted payment's linkage is updated, and
    /// the invoice is re-derived. When every collected cent has been
    /// returned the invoice is marked refunded.
    pub async fn process_refund(
        &self,
        refund_id: RefundId,
        processor: EmployeeId,
    ) -> Result<Refund, BillingError> {
        let located = self.store().get_refund(refund_id).await?;

        let lock = self.store().invoice_lock(located.invoice_id).await;
        let _guard = lock.lock().await;

        let mut refund = self.store().get_refund(refund_id).await?;
        let mut invoice = self.store().get_invoice(refund.invoice_id).await?;
        let payments = self.store().payments_for_invoice(refund.invoice_id).await;
        let refunds = self.store().refunds_for_invoice(refund.invoice_id).await;

        check_refundable(&invoice.amount_paid, &refunds, &refund)?;
        refund.process(processor)?;

        // Stage the linkage update alongside the processed refund
        let mut staged_payments = payments;
        let mut updated_payment: Option<Payment> = None;
        if let Some(payment_id) = refund.payment_id {
            let payment = staged_payments
                .iter_mut()
                .find(|p| p.id == payment_id)
                .ok_or_else(|| BillingError::PaymentNotFound(payment_id.to_string()))?;
            payment.record_refund(refund.amount)?;
            updated_payment = Some(payment.clone());
        }

        let mut staged_refunds = refunds;
        match staged_refunds.iter_mut().find(|r| r.id == refund.id) {
            Some(row) => *row = refund.clone(),
            None => staged_refunds.push(refund.clone()),
        }

        self.recalc_staged(&mut invoice, &staged_payments, &staged_refunds)?;

        if invoice.amount_paid.is_zero() && staged_payments.iter().any(|p| p.is_completed()) {
            invoice.mark_refunded()?;
        }

        self.store().update_refund(refund.clone()).await;
        if let Some(payment) = updated_payment {
            self.store().update_payment(payment).await;
        }
        self.store().save_invoice(invoice.clone()).await;

        info!(
            invoice = %invoice.invoice_number,
            refund = %refund.id,
            amount = %refund.amount,
            balance_due = %invoice.balance_due,
            "Refund processed"
        );
        Ok(refund)
    }

    /// Runs a workflow transition under the invoice row lock
    async fn transition_refund<F>(
        &self,
        refund_id: RefundId,
        transition: F,
    ) -> Result<Refund, BillingError>
    where
        F: FnOnce(&mut Refund) -> Result<(), BillingError>,
    {
        let located = self.store().get_refund(refund_id).await?;

        let lock = self.store().invoice_lock(located.invoice_id).await;
        let _guard = lock.lock().await;

        let mut refund = self.store().get_refund(refund_id).await?;
        transition(&mut refund)?;
        self.store().update_refund(refund.clone()).await;

        info!(
            refund = %refund.id,
            status = ?refund.status,
            "Refund transitioned"
        );
        Ok(refund)
    }
}

/// Checks that processed refunds (excluding this one) plus this amount
/// stay within the invoice's amount paid
fn check_refundable(
    amount_paid: &Money,
    refunds: &[Refund],
    candidate: &Refund,
) -> Result<(), BillingError> {
    let mut processed = Money::zero(amount_paid.currency());
    for refund in refunds
        .iter()
        .filter(|r| r.id != candidate.id && r.is_processed())
    {
        processed = processed.checked_add(&refund.amount)?;
    }
    let refundable = amount_paid.checked_sub(&processed)?;
    if candidate.amount > refundable {
        return Err(BillingError::ExcessRefund {
            attempted: candidate.amount.amount(),
            refundable: refundable.amount(),
        });
    }
    Ok(())
}

/// Checks a refund targeted at one specific payment
fn check_target_payment(payment: &Payment, refund: &Refund) -> Result<(), BillingError> {
    if payment.invoice_id != refund.invoice_id {
        return Err(BillingError::validation(format!(
            "Payment {} belongs to invoice {}, not the refunded invoice",
            payment.id, payment.invoice_id
        )));
    }
    if !payment.is_completed() {
        return Err(BillingError::state_conflict(format!(
            "Payment {} is not completed and cannot be refunded",
            payment.id
        )));
    }
    if refund.amount > payment.refundable_amount() {
        return Err(BillingError::ExcessRefund {
            attempted: refund.amount.amount(),
            refundable: payment.refundable_amount().amount(),
        });
    }
    Ok(())
}
