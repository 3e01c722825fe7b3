//! The recalculation engine and invoice-level operations
//!
//! `recalculate` is the single function that recomputes an invoice's
//! derived fields from its items, completed payments, and processed
//! refunds, under that invoice's row lock. All mutating operations end by
//! running it before their lock is released.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use core_kernel::{CatalogItemId, GuestId, InvoiceId, Money, Rate, ReservationId};
use domain_billing::{
    BillingConfig, BillingError, Invoice, LineItem, LineItemKind, Payment, Refund,
};

use crate::store::LedgerStore;

/// A line supplied by the booking subsystem at invoice creation
///
/// The unit price is captured here and copied onto the invoice; later
/// catalog price changes never alter an issued invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLineItem {
    pub catalog_item_id: Option<CatalogItemId>,
    pub kind: LineItemKind,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub tax_rate: Rate,
}

/// Request to create an invoice for a billable event
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub guest_id: GuestId,
    pub reservation_id: Option<ReservationId>,
    pub due_date: NaiveDate,
    pub lines: Vec<NewLineItem>,
}

/// Full read model of one invoice
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceSnapshot {
    pub invoice: Invoice,
    pub payments: Vec<Payment>,
    pub refunds: Vec<Refund>,
}

/// Result of a non-mutating reconciliation pass over one invoice
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub stored_amount_paid: Decimal,
    pub ledger_amount_paid: Decimal,
    pub stored_balance_due: Decimal,
    pub expected_balance_due: Decimal,
    pub consistent: bool,
}

/// The single mutation entry point for the billing ledger
#[derive(Clone)]
pub struct LedgerEngine {
    store: Arc<LedgerStore>,
    config: BillingConfig,
}

impl LedgerEngine {
    pub fn new(store: Arc<LedgerStore>, config: BillingConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<LedgerStore> {
        &self.store
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    /// Creates and issues an invoice for a completed billable event
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed lines (zero quantity,
    /// negative price, currency mismatch).
    pub async fn create_invoice(&self, request: CreateInvoice) -> Result<Invoice, BillingError> {
        let mut invoice = Invoice::new(
            self.store.next_invoice_number(),
            request.guest_id,
            request.due_date,
            self.config.currency,
        );
        if let Some(reservation_id) = request.reservation_id {
            invoice = invoice.with_reservation(reservation_id);
        }

        for line in request.lines {
            let mut item = LineItem::new(
                line.kind,
                line.description,
                line.quantity,
                line.unit_price,
                line.tax_rate,
            )?;
            if let Some(catalog_item_id) = line.catalog_item_id {
                item = item.with_catalog_item(catalog_item_id);
            }
            invoice.add_item(item)?;
        }

        invoice.issue()?;
        invoice.recalculate(&[], &[], &self.config, Utc::now().date_naive())?;
        invoice.version += 1;
        self.store.insert_invoice(invoice.clone()).await;

        info!(
            invoice = %invoice.invoice_number,
            guest = %invoice.guest_id,
            total = %invoice.total,
            "Invoice created"
        );
        Ok(invoice)
    }

    /// Reads the full invoice snapshot without taking the row lock
    ///
    /// Readers rely on the persisted derived fields rather than
    /// recomputing totals ad hoc.
    pub async fn get_invoice(&self, id: InvoiceId) -> Result<InvoiceSnapshot, BillingError> {
        let invoice = self.store.get_invoice(id).await?;
        let payments = self.store.payments_for_invoice(id).await;
        let refunds = self.store.refunds_for_invoice(id).await;
        Ok(InvoiceSnapshot {
            invoice,
            payments,
            refunds,
        })
    }

    /// Recomputes all derived fields of an invoice under its row lock
    pub async fn recalculate(&self, id: InvoiceId) -> Result<Invoice, BillingError> {
        let lock = self.store.invoice_lock(id).await;
        let _guard = lock.lock().await;

        let mut invoice = self.store.get_invoice(id).await?;
        self.recalculate_locked(&mut invoice).await?;
        self.store.save_invoice(invoice.clone()).await;
        Ok(invoice)
    }

    /// Adds a line item to an invoice and re-derives its totals
    pub async fn add_line_item(
        &self,
        id: InvoiceId,
        line: NewLineItem,
    ) -> Result<Invoice, BillingError> {
        let lock = self.store.invoice_lock(id).await;
        let _guard = lock.lock().await;

        let mut invoice = self.store.get_invoice(id).await?;
        let mut item = LineItem::new(
            line.kind,
            line.description,
            line.quantity,
            line.unit_price,
            line.tax_rate,
        )?;
        if let Some(catalog_item_id) = line.catalog_item_id {
            item = item.with_catalog_item(catalog_item_id);
        }
        invoice.add_item(item)?;

        self.recalculate_locked(&mut invoice).await?;
        self.store.save_invoice(invoice.clone()).await;
        Ok(invoice)
    }

    /// Applies an invoice-level discount
    ///
    /// The caller supplies the version it last observed; a stale version
    /// is rejected so a concurrent operator's change is never silently
    /// overwritten.
    pub async fn apply_discount(
        &self,
        id: InvoiceId,
        discount: Money,
        expected_version: i64,
    ) -> Result<Invoice, BillingError> {
        let lock = self.store.invoice_lock(id).await;
        let _guard = lock.lock().await;

        let mut invoice = self.store.get_invoice(id).await?;
        check_version(&invoice, expected_version)?;
        invoice.apply_discount(discount)?;

        self.recalculate_locked(&mut invoice).await?;
        self.store.save_invoice(invoice.clone()).await;

        info!(
            invoice = %invoice.invoice_number,
            discount = %discount,
            "Discount applied"
        );
        Ok(invoice)
    }

    /// Cancels an invoice that has nothing collected against it
    pub async fn cancel_invoice(
        &self,
        id: InvoiceId,
        expected_version: i64,
    ) -> Result<Invoice, BillingError> {
        let lock = self.store.invoice_lock(id).await;
        let _guard = lock.lock().await;

        let mut invoice = self.store.get_invoice(id).await?;
        check_version(&invoice, expected_version)?;
        invoice.cancel()?;

        self.recalculate_locked(&mut invoice).await?;
        self.store.save_invoice(invoice.clone()).await;

        info!(invoice = %invoice.invoice_number, "Invoice cancelled");
        Ok(invoice)
    }

    /// Re-derives the sums for one invoice and reports drift, mutating
    /// nothing
    pub async fn audit_invoice(
        &self,
        id: InvoiceId,
    ) -> Result<ReconciliationReport, BillingError> {
        let invoice = self.store.get_invoice(id).await?;
        let payments = self.store.payments_for_invoice(id).await;
        let refunds = self.store.refunds_for_invoice(id).await;

        let mut paid = Money::zero(invoice.currency);
        for payment in payments.iter().filter(|p| p.is_completed()) {
            paid = paid.checked_add(&payment.amount)?;
        }
        for refund in refunds.iter().filter(|r| r.is_processed()) {
            paid = paid.checked_sub(&refund.amount)?;
        }
        let expected_balance = invoice.total.checked_sub(&paid)?;

        let consistent = paid == invoice.amount_paid && expected_balance == invoice.balance_due;
        if !consistent {
            warn!(
                invoice = %invoice.invoice_number,
                stored_paid = %invoice.amount_paid,
                ledger_paid = %paid,
                "Reconciliation drift detected"
            );
        }

        Ok(ReconciliationReport {
            invoice_id: invoice.id,
            invoice_number: invoice.invoice_number.clone(),
            stored_amount_paid: invoice.amount_paid.amount(),
            ledger_amount_paid: paid.amount(),
            stored_balance_due: invoice.balance_due.amount(),
            expected_balance_due: expected_balance.amount(),
            consistent,
        })
    }

    /// Re-derives an invoice against an explicit ledger view and bumps
    /// the version; the caller must hold the invoice row lock
    ///
    /// Mutators stage not-yet-persisted payments and refunds into the
    /// slices so validation and derivation complete before anything is
    /// written to the store.
    pub(crate) fn recalc_staged(
        &self,
        invoice: &mut Invoice,
        payments: &[Payment],
        refunds: &[Refund],
    ) -> Result<(), BillingError> {
        invoice.recalculate(payments, refunds, &self.config, Utc::now().date_naive())?;
        invoice.version += 1;
        Ok(())
    }

    /// Recomputes derived fields from fresh ledger reads and bumps the
    /// version; the caller must hold the invoice row lock and persist
    /// the result
    pub(crate) async fn recalculate_locked(
        &self,
        invoice: &mut Invoice,
    ) -> Result<(), BillingError> {
        let payments = self.store.payments_for_invoice(invoice.id).await;
        let refunds = self.store.refunds_for_invoice(invoice.id).await;
        self.recalc_staged(invoice, &payments, &refunds)
    }
}

/// Rejects a stale client-observed version
pub(crate) fn check_version(invoice: &Invoice, expected: i64) -> Result<(), BillingError> {
    if invoice.version != expected {
        return Err(BillingError::ConcurrencyConflict {
            expected,
            found: invoice.version,
        });
    }
    Ok(())
}
