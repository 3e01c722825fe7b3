//! Invoice aggregate
//!
//! The invoice is the aggregate root of the billing ledger: it owns its
//! line items and derives subtotal, service charge, tax, discount, total,
//! amount paid and balance due from the items plus the completed payments
//! and processed refunds recorded against it. All derivation happens in
//! [`Invoice::recalculate`]; no other code path computes totals.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, GuestId, InvoiceId, Money, ReservationId};

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::line_item::LineItem;
use crate::payment::Payment;
use crate::refund::Refund;

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// Invoice is being drafted
    Draft,
    /// Issued, nothing collected yet
    Issued,
    /// Partial payment received
    Partial,
    /// Fully paid
    Paid,
    /// Issued and past its due date
    Overdue,
    /// Cancelled/voided
    Cancelled,
    /// Everything collected has been returned
    Refunded,
}

impl InvoiceStatus {
    /// Returns true for states the derivation step never leaves
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Paid | InvoiceStatus::Cancelled | InvoiceStatus::Refunded
        )
    }

    /// Returns true for states derivation must not overwrite
    pub fn is_pinned(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Draft | InvoiceStatus::Cancelled | InvoiceStatus::Refunded
        )
    }
}

/// The billing aggregate for one billable event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Invoice number (human-readable, never reused)
    pub invoice_number: String,
    /// Guest being billed
    pub guest_id: GuestId,
    /// Reservation that produced the billable event, if any
    pub reservation_id: Option<ReservationId>,
    /// Invoice date
    pub invoice_date: NaiveDate,
    /// Due date
    pub due_date: NaiveDate,
    /// Currency
    pub currency: Currency,
    /// Line items, owned by this invoice
    pub items: Vec<LineItem>,
    /// Derived: Σ(unit price × quantity)
    pub subtotal: Money,
    /// Derived: subtotal × service-charge rate
    pub service_charge: Money,
    /// Derived: per-line tax + VAT on (subtotal + service charge)
    pub tax: Money,
    /// Invoice-level discount
    pub discount: Money,
    /// Derived: subtotal + service charge + tax − discount
    pub total: Money,
    /// Derived: Σ(completed payments) − Σ(processed refunds)
    pub amount_paid: Money,
    /// Derived: total − amount paid
    pub balance_due: Money,
    /// Status
    pub status: InvoiceStatus,
    /// Optimistic version counter, bumped on every persisted mutation
    pub version: i64,
    /// Notes
    pub notes: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates a new draft invoice
    ///
    /// # Arguments
    ///
    /// * `invoice_number` - Sequence-issued number, never reused
    /// * `guest_id` - Guest being billed
    /// * `due_date` - Payment due date
    /// * `currency` - Invoice currency
    pub fn new(
        invoice_number: impl Into<String>,
        guest_id: GuestId,
        due_date: NaiveDate,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();
        let zero = Money::zero(currency);

        Self {
            id: InvoiceId::new_v7(),
            invoice_number: invoice_number.into(),
            guest_id,
            reservation_id: None,
            invoice_date: now.date_naive(),
            due_date,
            currency,
            items: Vec::new(),
            subtotal: zero,
            service_charge: zero,
            tax: zero,
            discount: zero,
            total: zero,
            amount_paid: zero,
            balance_due: zero,
            status: InvoiceStatus::Draft,
            version: 0,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Links the invoice to the reservation that produced it
    pub fn with_reservation(mut self, reservation_id: ReservationId) -> Self {
        self.reservation_id = Some(reservation_id);
        self
    }

    /// Adds a line item
    ///
    /// # Errors
    ///
    /// Returns a state conflict for terminal invoices and a validation
    /// error if the item currency differs from the invoice currency.
    pub fn add_item(&mut self, item: LineItem) -> Result<(), BillingError> {
        if self.status.is_terminal() {
            return Err(BillingError::state_conflict(format!(
                "Cannot add items to invoice {} in status {:?}",
                self.invoice_number, self.status
            )));
        }
        if item.unit_price.currency() != self.currency {
            return Err(BillingError::validation(format!(
                "Line item currency {} differs from invoice currency {}",
                item.unit_price.currency(),
                self.currency
            )));
        }
        self.items.push(item);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Issues a draft invoice
    pub fn issue(&mut self) -> Result<(), BillingError> {
        if self.status != InvoiceStatus::Draft {
            return Err(BillingError::InvalidStatusTransition {
                entity: "invoice",
                from: format!("{:?}", self.status),
                to: format!("{:?}", InvoiceStatus::Issued),
            });
        }
        self.status = InvoiceStatus::Issued;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Cancels the invoice
    ///
    /// Only an invoice with nothing collected can be cancelled; money on
    /// file must be refunded first.
    pub fn cancel(&mut self) -> Result<(), BillingError> {
        if self.status.is_terminal() {
            return Err(BillingError::InvalidStatusTransition {
                entity: "invoice",
                from: format!("{:?}", self.status),
                to: format!("{:?}", InvoiceStatus::Cancelled),
            });
        }
        if !self.amount_paid.is_zero() {
            return Err(BillingError::state_conflict(format!(
                "Invoice {} has {} collected; refund before cancelling",
                self.invoice_number, self.amount_paid
            )));
        }
        self.status = InvoiceStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Marks the invoice refunded after every collected cent was returned
    ///
    /// This is an explicit transition driven by refund processing, never
    /// by the derivation step.
    pub fn mark_refunded(&mut self) -> Result<(), BillingError> {
        if matches!(self.status, InvoiceStatus::Draft | InvoiceStatus::Cancelled) {
            return Err(BillingError::InvalidStatusTransition {
                entity: "invoice",
                from: format!("{:?}", self.status),
                to: format!("{:?}", InvoiceStatus::Refunded),
            });
        }
        if !self.amount_paid.is_zero() {
            return Err(BillingError::state_conflict(format!(
                "Invoice {} still has {} collected",
                self.invoice_number, self.amount_paid
            )));
        }
        self.status = InvoiceStatus::Refunded;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Sets the invoice-level discount
    ///
    /// # Errors
    ///
    /// Rejects negative discounts, discounts larger than the pre-discount
    /// total, and discounts that would push the total below what has
    /// already been collected.
    pub fn apply_discount(&mut self, discount: Money) -> Result<(), BillingError> {
        if self.status.is_terminal() {
            return Err(BillingError::state_conflict(format!(
                "Cannot discount invoice {} in status {:?}",
                self.invoice_number, self.status
            )));
        }
        if discount.is_negative() {
            return Err(BillingError::validation("Discount must not be negative"));
        }
        let pre_discount = self
            .subtotal
            .checked_add(&self.service_charge)?
            .checked_add(&self.tax)?;
        if discount > pre_discount {
            return Err(BillingError::validation(format!(
                "Discount {} exceeds invoice charges {}",
                discount, pre_discount
            )));
        }
        let new_total = pre_discount.checked_sub(&discount)?;
        if new_total < self.amount_paid {
            return Err(BillingError::state_conflict(format!(
                "Discount would reduce total below the {} already collected",
                self.amount_paid
            )));
        }
        self.discount = discount;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Returns true if the invoice can accept a payment
    pub fn accepts_payment(&self) -> bool {
        matches!(
            self.status,
            InvoiceStatus::Issued | InvoiceStatus::Partial | InvoiceStatus::Overdue
        )
    }

    /// Recomputes every derived field from items, payments and refunds
    ///
    /// Only completed payments and processed refunds participate. The
    /// caller provides the configuration snapshot and the current date
    /// (for overdue detection) so the derivation itself is pure.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::Inconsistency`] if the ledger sums produce
    /// a negative net paid amount or a negative balance; the aggregate is
    /// left untouched in that case and nothing may be persisted.
    pub fn recalculate(
        &mut self,
        payments: &[Payment],
        refunds: &[Refund],
        config: &BillingConfig,
        today: NaiveDate,
    ) -> Result<(), BillingError> {
        let zero = Money::zero(self.currency);

        let mut subtotal = zero;
        let mut line_tax = zero;
        for item in &self.items {
            subtotal = subtotal.checked_add(&item.subtotal())?;
            line_tax = line_tax.checked_add(&item.tax())?;
        }

        let service_charge = config.service_charge_rate.apply(&subtotal);
        let vat_base = subtotal.checked_add(&service_charge)?;
        let tax = line_tax.checked_add(&config.vat_rate.apply(&vat_base))?;

        let total = subtotal
            .checked_add(&service_charge)?
            .checked_add(&tax)?
            .checked_sub(&self.discount)?;

        let mut paid = zero;
        for payment in payments.iter().filter(|p| p.invoice_id == self.id) {
            if payment.is_completed() {
                paid = paid.checked_add(&payment.amount)?;
            }
        }

        let mut refunded = zero;
        for refund in refunds.iter().filter(|r| r.invoice_id == self.id) {
            if refund.is_processed() {
                refunded = refunded.checked_add(&refund.amount)?;
            }
        }

        let amount_paid = paid.checked_sub(&refunded)?;
        if amount_paid.is_negative() {
            tracing::warn!(
                invoice = %self.invoice_number,
                refunded = %refunded,
                paid = %paid,
                "Ledger inconsistency: refunds exceed payments"
            );
            return Err(BillingError::inconsistency(format!(
                "Invoice {}: processed refunds {} exceed completed payments {}",
                self.invoice_number, refunded, paid
            )));
        }

        let balance_due = total.checked_sub(&amount_paid)?;
        if balance_due.is_negative() {
            tracing::warn!(
                invoice = %self.invoice_number,
                amount_paid = %amount_paid,
                total = %total,
                "Ledger inconsistency: raw balance is negative"
            );
            return Err(BillingError::inconsistency(format!(
                "Invoice {}: amount paid {} exceeds total {}",
                self.invoice_number, amount_paid, total
            )));
        }

        self.subtotal = subtotal;
        self.service_charge = service_charge;
        self.tax = tax;
        self.total = total;
        self.amount_paid = amount_paid;
        self.balance_due = balance_due;
        self.status = self.derive_status(today);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Status derivation for the recalculated balance
    fn derive_status(&self, today: NaiveDate) -> InvoiceStatus {
        if self.status.is_pinned() {
            return self.status;
        }
        if self.balance_due.is_zero() && self.total.is_positive() {
            InvoiceStatus::Paid
        } else if self.balance_due == self.total {
            if today > self.due_date {
                InvoiceStatus::Overdue
            } else {
                InvoiceStatus::Issued
            }
        } else {
            InvoiceStatus::Partial
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_item::LineItemKind;
    use crate::payment::{PaymentMethod, PaymentType};
    use core_kernel::{EmployeeId, Rate};
    use rust_decimal_macros::dec;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    fn invoice_with_item(amount: rust_decimal::Decimal) -> Invoice {
        let mut invoice = Invoice::new(
            "INV-00000001",
            GuestId::new_v7(),
            Utc::now().date_naive(),
            Currency::USD,
        );
        invoice
            .add_item(
                LineItem::new(LineItemKind::Service, "Massage", 1, usd(amount), Rate::zero())
                    .unwrap(),
            )
            .unwrap();
        invoice.issue().unwrap();
        invoice
    }

    fn completed_payment(invoice: &Invoice, amount: rust_decimal::Decimal) -> Payment {
        let mut p = Payment::new(
            invoice.id,
            usd(amount),
            PaymentMethod::Card,
            PaymentType::Regular,
            EmployeeId::new_v7(),
        )
        .unwrap();
        p.complete();
        p
    }

    #[test]
    fn test_recalculate_totals_without_rates() {
        let mut invoice = invoice_with_item(dec!(100.00));
        let config = BillingConfig::default();

        invoice
            .recalculate(&[], &[], &config, Utc::now().date_naive())
            .unwrap();

        assert_eq!(invoice.subtotal.amount(), dec!(100.00));
        assert!(invoice.service_charge.is_zero());
        assert!(invoice.tax.is_zero());
        assert_eq!(invoice.total.amount(), dec!(100.00));
        assert_eq!(invoice.balance_due.amount(), dec!(100.00));
        assert_eq!(invoice.status, InvoiceStatus::Issued);
    }

    #[test]
    fn test_recalculate_applies_service_charge_and_vat() {
        let mut invoice = invoice_with_item(dec!(100.00));
        let config = BillingConfig::new(
            Currency::USD,
            Rate::from_percentage(dec!(5.0)),
            Rate::from_percentage(dec!(10.0)),
        );

        invoice
            .recalculate(&[], &[], &config, Utc::now().date_naive())
            .unwrap();

        assert_eq!(invoice.service_charge.amount(), dec!(10.00));
        // VAT 5% of (100 + 10) = 5.50
        assert_eq!(invoice.tax.amount(), dec!(5.50));
        assert_eq!(invoice.total.amount(), dec!(115.50));
    }

    #[test]
    fn test_payment_moves_status_to_partial_then_paid() {
        let mut invoice = invoice_with_item(dec!(100.00));
        let config = BillingConfig::default();
        let today = Utc::now().date_naive();

        let p1 = completed_payment(&invoice, dec!(60.00));
        invoice.recalculate(&[p1.clone()], &[], &config, today).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Partial);
        assert_eq!(invoice.balance_due.amount(), dec!(40.00));

        let p2 = completed_payment(&invoice, dec!(40.00));
        invoice
            .recalculate(&[p1, p2], &[], &config, today)
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert!(invoice.balance_due.is_zero());
    }

    #[test]
    fn test_pending_payments_do_not_count() {
        let mut invoice = invoice_with_item(dec!(100.00));
        let config = BillingConfig::default();

        let pending = Payment::new(
            invoice.id,
            usd(dec!(60.00)),
            PaymentMethod::Cash,
            PaymentType::Regular,
            EmployeeId::new_v7(),
        )
        .unwrap();

        invoice
            .recalculate(&[pending], &[], &config, Utc::now().date_naive())
            .unwrap();
        assert!(invoice.amount_paid.is_zero());
        assert_eq!(invoice.status, InvoiceStatus::Issued);
    }

    #[test]
    fn test_overpaid_ledger_is_an_inconsistency() {
        let mut invoice = invoice_with_item(dec!(100.00));
        let config = BillingConfig::default();

        let p = completed_payment(&invoice, dec!(150.00));
        let result = invoice.recalculate(&[p], &[], &config, Utc::now().date_naive());
        assert!(matches!(result, Err(BillingError::Inconsistency(_))));
        // nothing was overwritten
        assert!(invoice.amount_paid.is_zero());
    }

    #[test]
    fn test_unissued_draft_keeps_status() {
        let mut invoice = Invoice::new(
            "INV-00000002",
            GuestId::new_v7(),
            Utc::now().date_naive(),
            Currency::USD,
        );
        invoice
            .add_item(
                LineItem::new(LineItemKind::Product, "Robe", 1, usd(dec!(40.00)), Rate::zero())
                    .unwrap(),
            )
            .unwrap();

        invoice
            .recalculate(&[], &[], &BillingConfig::default(), Utc::now().date_naive())
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.total.amount(), dec!(40.00));
    }

    #[test]
    fn test_overdue_when_past_due_date() {
        let mut invoice = invoice_with_item(dec!(100.00));
        invoice.due_date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();

        invoice
            .recalculate(
                &[],
                &[],
                &BillingConfig::default(),
                NaiveDate::from_ymd_opt(2025, 2, 15).unwrap(),
            )
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Overdue);
    }

    #[test]
    fn test_zero_total_invoice_is_not_paid() {
        let mut invoice = Invoice::new(
            "INV-00000003",
            GuestId::new_v7(),
            Utc::now().date_naive(),
            Currency::USD,
        );
        invoice.issue().unwrap();
        invoice
            .recalculate(&[], &[], &BillingConfig::default(), Utc::now().date_naive())
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Issued);
    }

    #[test]
    fn test_cancel_with_collected_money_rejected() {
        let mut invoice = invoice_with_item(dec!(100.00));
        let p = completed_payment(&invoice, dec!(50.00));
        invoice
            .recalculate(&[p], &[], &BillingConfig::default(), Utc::now().date_naive())
            .unwrap();

        assert!(matches!(
            invoice.cancel(),
            Err(BillingError::StateConflict(_))
        ));
    }

    #[test]
    fn test_cancelled_status_is_pinned() {
        let mut invoice = invoice_with_item(dec!(100.00));
        invoice.cancel().unwrap();

        invoice
            .recalculate(&[], &[], &BillingConfig::default(), Utc::now().date_naive())
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Cancelled);
    }

    #[test]
    fn test_discount_validation() {
        let mut invoice = invoice_with_item(dec!(100.00));
        invoice
            .recalculate(&[], &[], &BillingConfig::default(), Utc::now().date_naive())
            .unwrap();

        assert!(invoice.apply_discount(usd(dec!(150.00))).is_err());
        assert!(invoice.apply_discount(usd(dec!(-5.00))).is_err());

        invoice.apply_discount(usd(dec!(25.00))).unwrap();
        invoice
            .recalculate(&[], &[], &BillingConfig::default(), Utc::now().date_naive())
            .unwrap();
        assert_eq!(invoice.total.amount(), dec!(75.00));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::line_item::LineItemKind;
    use crate::payment::{PaymentMethod, PaymentType};
    use core_kernel::{EmployeeId, Rate};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    proptest! {
        #[test]
        fn recalculated_invoice_satisfies_ledger_invariants(
            unit_minor in 1i64..500_000i64,
            quantity in 1u32..20u32,
            tax_bp in 0u32..2_500u32,
            vat_bp in 0u32..2_500u32,
            service_bp in 0u32..2_000u32,
        ) {
            let mut invoice = Invoice::new(
                "INV-77777777",
                GuestId::new_v7(),
                Utc::now().date_naive(),
                Currency::USD,
            );
            invoice.add_item(LineItem::new(
                LineItemKind::Service,
                "Session",
                quantity,
                Money::from_minor(unit_minor, Currency::USD),
                Rate::new(Decimal::new(tax_bp as i64, 4)),
            ).unwrap()).unwrap();
            invoice.issue().unwrap();

            let config = BillingConfig::new(
                Currency::USD,
                Rate::new(Decimal::new(vat_bp as i64, 4)),
                Rate::new(Decimal::new(service_bp as i64, 4)),
            );

            invoice.recalculate(&[], &[], &config, Utc::now().date_naive()).unwrap();

            let recombined = invoice.subtotal
                .checked_add(&invoice.service_charge).unwrap()
                .checked_add(&invoice.tax).unwrap()
                .checked_sub(&invoice.discount).unwrap();
            prop_assert_eq!(invoice.total, recombined);
            prop_assert_eq!(invoice.balance_due, invoice.total - invoice.amount_paid);
            prop_assert!(!invoice.balance_due.is_negative());
        }

        #[test]
        fn payments_never_drive_balance_negative(
            total_minor in 10_000i64..1_000_000i64,
            first_minor in 1i64..9_999i64,
        ) {
            let mut invoice = Invoice::new(
                "INV-88888888",
                GuestId::new_v7(),
                Utc::now().date_naive(),
                Currency::USD,
            );
            invoice.add_item(LineItem::new(
                LineItemKind::Service,
                "Package",
                1,
                Money::from_minor(total_minor, Currency::USD),
                Rate::zero(),
            ).unwrap()).unwrap();
            invoice.issue().unwrap();

            let mut payment = Payment::new(
                invoice.id,
                Money::from_minor(first_minor, Currency::USD),
                PaymentMethod::Card,
                PaymentType::Regular,
                EmployeeId::new_v7(),
            ).unwrap();
            payment.complete();

            invoice.recalculate(
                &[payment],
                &[],
                &BillingConfig::default(),
                Utc::now().date_naive(),
            ).unwrap();

            prop_assert!(!invoice.balance_due.is_negative());
            prop_assert_eq!(
                invoice.balance_due,
                invoice.total - invoice.amount_paid
            );
        }
    }
}
