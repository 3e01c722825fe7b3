//! Payment submission
//!
//! Validates a payment request, enforces idempotency, serializes against
//! the invoice row lock, and re-derives the invoice before the lock is
//! released. Two concurrent submissions against the same invoice are
//! strictly serialized; the second re-validates against the freshly
//! recalculated balance, so a race cannot produce an overpayment.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use core_kernel::{EmployeeId, InvoiceId, Money};
use domain_billing::{BillingError, Payment, PaymentMethod, PaymentType};

use crate::engine::LedgerEngine;

/// Request to record money received against an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitPayment {
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub kind: PaymentType,
    pub idempotency_key: Option<String>,
    pub processed_by: EmployeeId,
}

impl LedgerEngine {
    /// Records a payment against an invoice
    ///
    /// Resubmitting with an idempotency key that already matched a stored
    /// payment returns that payment unchanged; there is no second charge
    /// and no error.
    ///
    /// # Errors
    ///
    /// * [`BillingError::Validation`] for non-positive amounts, currency
    ///   mismatches, or a key already used on another invoice
    /// * [`BillingError::StateConflict`] when the invoice cannot accept
    ///   payment, or the guest holds an applicable deposit and must route
    ///   a regular payment through deposit application
    /// * [`BillingError::Overpayment`] when the amount exceeds the fresh
    ///   balance due
    pub async fn submit_payment(&self, request: SubmitPayment) -> Result<Payment, BillingError> {
        if !request.amount.is_positive() {
            return Err(BillingError::validation("Payment amount must be positive"));
        }
        if request.amount.currency() != self.config().currency {
            return Err(BillingError::validation(format!(
                "Payment currency {} differs from ledger currency {}",
                request.amount.currency(),
                self.config().currency
            )));
        }
        if request.kind == PaymentType::DepositApplication {
            return Err(BillingError::validation(
                "Deposit funds are applied through the deposit path, not payment submission",
            ));
        }

        // Idempotent replay is resolved before any lock is taken
        if let Some(key) = request.idempotency_key.as_deref() {
            if let Some(existing) = self.store().find_payment_by_idempotency_key(key).await {
                return self.resolve_idempotent_replay(existing, request.invoice_id);
            }
        }

        // Cheap status check before contending for the row lock
        let invoice = self.store().get_invoice(request.invoice_id).await?;
        if !invoice.accepts_payment() {
            return Err(BillingError::state_conflict(format!(
                "Invoice {} cannot accept payment in status {:?}",
                invoice.invoice_number, invoice.status
            )));
        }

        // Funds already on file must flow through deposit application so
        // they are not counted twice
        if request.kind == PaymentType::Regular
            && self
                .store()
                .has_applicable_deposit(invoice.guest_id, Utc::now().date_naive())
                .await
        {
            return Err(BillingError::state_conflict(format!(
                "Guest {} holds an un-applied deposit; apply it before submitting a regular payment",
                invoice.guest_id
            )));
        }

        let lock = self.store().invoice_lock(request.invoice_id).await;
        let _guard = lock.lock().await;

        // Fresh reads now that the row is ours
        let mut invoice = self.store().get_invoice(request.invoice_id).await?;
        if !invoice.accepts_payment() {
            return Err(BillingError::state_conflict(format!(
                "Invoice {} cannot accept payment in status {:?}",
                invoice.invoice_number, invoice.status
            )));
        }
        if let Some(key) = request.idempotency_key.as_deref() {
            if let Some(existing) = self.store().find_payment_by_idempotency_key(key).await {
                return self.resolve_idempotent_replay(existing, request.invoice_id);
            }
        }
        if request.amount > invoice.balance_due {
            return Err(BillingError::Overpayment {
                attempted: request.amount.amount(),
                balance_due: invoice.balance_due.amount(),
            });
        }

        let mut payment = Payment::new(
            request.invoice_id,
            request.amount,
            request.method,
            request.kind,
            request.processed_by,
        )?;
        if let Some(key) = request.idempotency_key {
            payment = payment.with_idempotency_key(key);
        }
        payment.complete();

        // Stage the new payment and derive the invoice before writing
        // anything; a failure here leaves the store untouched
        let mut payments = self.store().payments_for_invoice(request.invoice_id).await;
        payments.push(payment.clone());
        let refunds = self.store().refunds_for_invoice(request.invoice_id).await;
        self.recalc_staged(&mut invoice, &payments, &refunds)?;

        if let Some(existing) = self.store().try_insert_payment(payment.clone()).await? {
            return self.resolve_idempotent_replay(existing, request.invoice_id);
        }
        self.store().save_invoice(invoice.clone()).await;

        info!(
            invoice = %invoice.invoice_number,
            payment = %payment.id,
            amount = %payment.amount,
            balance_due = %invoice.balance_due,
            "Payment recorded"
        );
        Ok(payment)
    }

    /// Maps an idempotency-key hit to a replayed payment or a key misuse
    fn resolve_idempotent_replay(
        &self,
        existing: Payment,
        invoice_id: InvoiceId,
    ) -> Result<Payment, BillingError> {
        if existing.invoice_id == invoice_id {
            info!(
                payment = %existing.id,
                invoice = %invoice_id,
                "Idempotent payment resubmission; returning existing record"
            );
            Ok(existing)
        } else {
            Err(BillingError::validation(format!(
                "Idempotency key already used for invoice {}",
                existing.invoice_id
            )))
        }
    }
}

/// Convenience constructor used by handlers and tests
impl SubmitPayment {
    pub fn new(
        invoice_id: InvoiceId,
        amount: Money,
        method: PaymentMethod,
        processed_by: EmployeeId,
    ) -> Self {
        Self {
            invoice_id,
            amount,
            method,
            kind: PaymentType::Regular,
            idempotency_key: None,
            processed_by,
        }
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn manual(mut self) -> Self {
        self.kind = PaymentType::Manual;
        self
    }
}
