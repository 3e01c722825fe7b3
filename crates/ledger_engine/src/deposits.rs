//! Deposit operations
//!
//! Deposits are collected per guest before any invoice exists and later
//! applied to invoices. Application takes the deposit lock first and the
//! invoice lock second; every code path that holds both acquires them in
//! that order.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use core_kernel::{DepositId, EmployeeId, GuestId, InvoiceId, Money, ReservationId};
use domain_billing::{BillingError, Deposit, Payment, PaymentMethod, PaymentType};

use crate::engine::LedgerEngine;

/// Request to open a deposit for a guest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeposit {
    pub guest_id: GuestId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub reservation_id: Option<ReservationId>,
    pub expires_at: Option<NaiveDate>,
}

/// Request to move deposit funds onto an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyDeposit {
    pub deposit_id: DepositId,
    pub invoice_id: InvoiceId,
    /// Amount to apply; defaults to the remaining deposit capped at the
    /// invoice's balance due
    pub amount: Option<Money>,
    pub processed_by: EmployeeId,
}

impl LedgerEngine {
    /// Opens a pending deposit for a guest
    pub async fn create_deposit(&self, request: CreateDeposit) -> Result<Deposit, BillingError> {
        if request.amount.currency() != self.config().currency {
            return Err(BillingError::validation(format!(
                "Deposit currency {} differs from ledger currency {}",
                request.amount.currency(),
                self.config().currency
            )));
        }

        let mut deposit = Deposit::new(request.guest_id, request.amount, request.method)?;
        if let Some(reservation_id) = request.reservation_id {
            deposit = deposit.with_reservation(reservation_id);
        }
        if let Some(expires_at) = request.expires_at {
            deposit = deposit.with_expiry(expires_at);
        }

        self.store().insert_deposit(deposit.clone()).await;
        info!(
            deposit = %deposit.id,
            guest = %deposit.guest_id,
            amount = %deposit.amount,
            "Deposit opened"
        );
        Ok(deposit)
    }

    /// Records receipt of the deposit money
    pub async fn collect_deposit(
        &self,
        deposit_id: DepositId,
        collected_by: EmployeeId,
    ) -> Result<Deposit, BillingError> {
        let lock = self.store().deposit_lock(deposit_id).await;
        let _guard = lock.lock().await;

        let mut deposit = self.store().get_deposit(deposit_id).await?;
        deposit.collect(collected_by)?;
        self.store().update_deposit(deposit.clone()).await;

        info!(deposit = %deposit.id, amount = %deposit.amount, "Deposit collected");
        Ok(deposit)
    }

    /// Applies deposit funds to an invoice as a payment
    ///
    /// One lock scope covers both rows (deposit first, invoice second):
    /// the payment of type `DepositApplication` is created, the deposit's
    /// applied amount advances, and the invoice is re-derived, all or
    /// nothing.
    ///
    /// # Errors
    ///
    /// * [`BillingError::StateConflict`] when the deposit cannot fund a
    ///   payment, belongs to another guest, or the invoice is not payable
    /// * [`BillingError::DepositExpired`] past the expiry date
    /// * [`BillingError::Overpayment`] for an explicit amount above the
    ///   fresh balance due
    pub async fn apply_deposit(&self, request: ApplyDeposit) -> Result<Payment, BillingError> {
        let deposit_lock = self.store().deposit_lock(request.deposit_id).await;
        let _deposit_guard = deposit_lock.lock().await;
        let invoice_lock = self.store().invoice_lock(request.invoice_id).await;
        let _invoice_guard = invoice_lock.lock().await;

        let mut deposit = self.store().get_deposit(request.deposit_id).await?;
        let mut invoice = self.store().get_invoice(request.invoice_id).await?;

        if deposit.guest_id != invoice.guest_id {
            return Err(BillingError::state_conflict(format!(
                "Deposit {} belongs to a different guest than invoice {}",
                deposit.id, invoice.invoice_number
            )));
        }
        let today = Utc::now().date_naive();
        if let Some(expires_at) = deposit.expires_at {
            if today > expires_at {
                return Err(BillingError::DepositExpired(expires_at));
            }
        }
        if !deposit.can_apply() {
            return Err(BillingError::state_conflict(format!(
                "Deposit {} cannot be applied from status {:?}",
                deposit.id, deposit.status
            )));
        }
        if !invoice.accepts_payment() {
            return Err(BillingError::state_conflict(format!(
                "Invoice {} cannot accept payment in status {:?}",
                invoice.invoice_number, invoice.status
            )));
        }

        let remaining = deposit.remaining_amount();
        let amount = match request.amount {
            Some(explicit) => explicit,
            None => {
                if remaining <= invoice.balance_due {
                    remaining
                } else {
                    invoice.balance_due
                }
            }
        };
        if !amount.is_positive() {
            return Err(BillingError::state_conflict(format!(
                "Invoice {} has no outstanding balance to apply the deposit to",
                invoice.invoice_number
            )));
        }
        if amount > invoice.balance_due {
            return Err(BillingError::Overpayment {
                attempted: amount.amount(),
                balance_due: invoice.balance_due.amount(),
            });
        }

        deposit.apply(amount)?;

        let mut payment = Payment::new(
            request.invoice_id,
            amount,
            deposit.method,
            PaymentType::DepositApplication,
            request.processed_by,
        )?
        .with_deposit(deposit.id);
        payment.complete();

        let mut staged_payments = self.store().payments_for_invoice(request.invoice_id).await;
        staged_payments.push(payment.clone());
        let refunds = self.store().refunds_for_invoice(request.invoice_id).await;
        self.recalc_staged(&mut invoice, &staged_payments, &refunds)?;

        self.store().update_deposit(deposit.clone()).await;
        self.store().try_insert_payment(payment.clone()).await?;
        self.store().save_invoice(invoice.clone()).await;

        info!(
            deposit = %deposit.id,
            invoice = %invoice.invoice_number,
            amount = %amount,
            remaining = %deposit.remaining_amount(),
            "Deposit applied"
        );
        Ok(payment)
    }

    /// Returns the un-applied remainder of a deposit to the guest
    pub async fn refund_deposit(&self, deposit_id: DepositId) -> Result<Deposit, BillingError> {
        let lock = self.store().deposit_lock(deposit_id).await;
        let _guard = lock.lock().await;

        let mut deposit = self.store().get_deposit(deposit_id).await?;
        deposit.mark_refunded()?;
        self.store().update_deposit(deposit.clone()).await;

        info!(
            deposit = %deposit.id,
            returned = %deposit.remaining_amount(),
            "Deposit refunded to guest"
        );
        Ok(deposit)
    }

    /// Deposits held for a guest, for the read surface
    pub async fn deposits_for_guest(&self, guest_id: GuestId) -> Vec<Deposit> {
        self.store().deposits_for_guest(guest_id).await
    }

    /// Housekeeping sweep marking lapsed deposits as expired
    ///
    /// Each candidate is re-checked under its own lock; returns how many
    /// deposits were expired.
    pub async fn expire_deposits(&self, today: NaiveDate) -> Result<usize, BillingError> {
        let mut expired = 0usize;
        for deposit_id in self.store().deposit_ids().await {
            let lock = self.store().deposit_lock(deposit_id).await;
            let _guard = lock.lock().await;

            let mut deposit = match self.store().get_deposit(deposit_id).await {
                Ok(deposit) => deposit,
                Err(_) => continue,
            };
            if deposit.is_expired(today) && deposit.expire().is_ok() {
                self.store().update_deposit(deposit.clone()).await;
                info!(deposit = %deposit.id, "Deposit expired");
                expired += 1;
            }
        }
        Ok(expired)
    }
}
