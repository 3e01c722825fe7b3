//! In-process record store for the billing ledger
//!
//! The store is the system of record behind the engine: separate maps per
//! entity, an idempotency-key index, a never-reused invoice-number
//! sequence, and a registry of per-row async locks. Map access never
//! spans an await point; the long-held locks are the per-invoice and
//! per-deposit row mutexes handed out to the engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, RwLock};

use core_kernel::{DepositId, GuestId, InvoiceId, PaymentId, RefundId};
use domain_billing::{BillingError, Deposit, Invoice, Payment, Refund};

/// Record store with per-row serialization primitives
#[derive(Debug, Default)]
pub struct LedgerStore {
    invoices: RwLock<HashMap<InvoiceId, Invoice>>,
    payments: RwLock<HashMap<PaymentId, Payment>>,
    refunds: RwLock<HashMap<RefundId, Refund>>,
    deposits: RwLock<HashMap<DepositId, Deposit>>,
    idempotency_index: RwLock<HashMap<String, PaymentId>>,
    invoice_locks: Mutex<HashMap<InvoiceId, Arc<Mutex<()>>>>,
    deposit_locks: Mutex<HashMap<DepositId, Arc<Mutex<()>>>>,
    invoice_sequence: AtomicU64,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next invoice number; numbers are never reused
    pub fn next_invoice_number(&self) -> String {
        let seq = self.invoice_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("INV-{:08}", seq)
    }

    /// Returns the row lock for an invoice, creating it on first use
    pub async fn invoice_lock(&self, id: InvoiceId) -> Arc<Mutex<()>> {
        let mut registry = self.invoice_locks.lock().await;
        registry.entry(id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Returns the row lock for a deposit, creating it on first use
    pub async fn deposit_lock(&self, id: DepositId) -> Arc<Mutex<()>> {
        let mut registry = self.deposit_locks.lock().await;
        registry.entry(id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    // ------------------------------------------------------------------
    // Invoices
    // ------------------------------------------------------------------

    pub async fn insert_invoice(&self, invoice: Invoice) {
        self.invoices.write().await.insert(invoice.id, invoice);
    }

    pub async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, BillingError> {
        self.invoices
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| BillingError::InvoiceNotFound(id.to_string()))
    }

    pub async fn save_invoice(&self, invoice: Invoice) {
        self.invoices.write().await.insert(invoice.id, invoice);
    }

    // ------------------------------------------------------------------
    // Payments
    // ------------------------------------------------------------------

    /// Inserts a payment, enforcing idempotency-key uniqueness
    ///
    /// Returns the already-stored payment when the key is taken, leaving
    /// the store unchanged; the caller decides whether that is an
    /// idempotent replay or a key collision.
    pub async fn try_insert_payment(
        &self,
        payment: Payment,
    ) -> Result<Option<Payment>, BillingError> {
        if let Some(key) = payment.idempotency_key.clone() {
            let mut index = self.idempotency_index.write().await;
            let mut payments = self.payments.write().await;
            if let Some(existing_id) = index.get(&key) {
                let existing = payments.get(existing_id).cloned().ok_or_else(|| {
                    BillingError::inconsistency(format!(
                        "Idempotency index references missing payment {existing_id}"
                    ))
                })?;
                return Ok(Some(existing));
            }
            index.insert(key, payment.id);
            payments.insert(payment.id, payment);
            Ok(None)
        } else {
            self.payments.write().await.insert(payment.id, payment);
            Ok(None)
        }
    }

    pub async fn get_payment(&self, id: PaymentId) -> Result<Payment, BillingError> {
        self.payments
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| BillingError::PaymentNotFound(id.to_string()))
    }

    pub async fn update_payment(&self, payment: Payment) {
        self.payments.write().await.insert(payment.id, payment);
    }

    pub async fn find_payment_by_idempotency_key(&self, key: &str) -> Option<Payment> {
        let index = self.idempotency_index.read().await;
        let id = index.get(key)?;
        self.payments.read().await.get(id).cloned()
    }

    /// All payments recorded against an invoice, oldest first
    pub async fn payments_for_invoice(&self, invoice_id: InvoiceId) -> Vec<Payment> {
        let mut rows: Vec<Payment> = self
            .payments
            .read()
            .await
            .values()
            .filter(|p| p.invoice_id == invoice_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.created_at);
        rows
    }

    // ------------------------------------------------------------------
    // Refunds
    // ------------------------------------------------------------------

    pub async fn insert_refund(&self, refund: Refund) {
        self.refunds.write().await.insert(refund.id, refund);
    }

    pub async fn get_refund(&self, id: RefundId) -> Result<Refund, BillingError> {
        self.refunds
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| BillingError::RefundNotFound(id.to_string()))
    }

    pub async fn update_refund(&self, refund: Refund) {
        self.refunds.write().await.insert(refund.id, refund);
    }

    /// All refunds recorded against an invoice, oldest first
    pub async fn refunds_for_invoice(&self, invoice_id: InvoiceId) -> Vec<Refund> {
        let mut rows: Vec<Refund> = self
            .refunds
            .read()
            .await
            .values()
            .filter(|r| r.invoice_id == invoice_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.requested_at);
        rows
    }

    // ------------------------------------------------------------------
    // Deposits
    // ------------------------------------------------------------------

    pub async fn insert_deposit(&self, deposit: Deposit) {
        self.deposits.write().await.insert(deposit.id, deposit);
    }

    pub async fn get_deposit(&self, id: DepositId) -> Result<Deposit, BillingError> {
        self.deposits
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| BillingError::DepositNotFound(id.to_string()))
    }

    pub async fn update_deposit(&self, deposit: Deposit) {
        self.deposits.write().await.insert(deposit.id, deposit);
    }

    /// All deposits held for a guest, oldest first
    pub async fn deposits_for_guest(&self, guest_id: GuestId) -> Vec<Deposit> {
        let mut rows: Vec<Deposit> = self
            .deposits
            .read()
            .await
            .values()
            .filter(|d| d.guest_id == guest_id)
            .cloned()
            .collect();
        rows.sort_by_key(|d| d.created_at);
        rows
    }

    /// Identifiers of every stored deposit, for housekeeping sweeps
    pub async fn deposit_ids(&self) -> Vec<DepositId> {
        self.deposits.read().await.keys().copied().collect()
    }

    /// Returns true if the guest holds a deposit that could fund a payment
    pub async fn has_applicable_deposit(&self, guest_id: GuestId, today: NaiveDate) -> bool {
        self.deposits
            .read()
            .await
            .values()
            .any(|d| d.guest_id == guest_id && d.can_apply() && !d.is_expired(today))
    }
}
