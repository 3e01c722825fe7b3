//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible
//! defaults. These builders allow tests to specify only the relevant
//! fields while using defaults for everything else.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, GuestId, Money, Rate, ReservationId};
use domain_billing::{Deposit, Invoice, LineItem, LineItemKind, PaymentMethod};

use crate::fixtures::{IdFixtures, StringFixtures};

/// Builder for test invoices
///
/// Produces an issued invoice with one service line unless configured
/// otherwise; callers still run recalculation through the engine or the
/// aggregate before asserting derived fields.
pub struct TestInvoiceBuilder {
    guest_id: GuestId,
    reservation_id: Option<ReservationId>,
    due_date: NaiveDate,
    currency: Currency,
    lines: Vec<LineItem>,
    issued: bool,
}

impl Default for TestInvoiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestInvoiceBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            guest_id: IdFixtures::guest_id(),
            reservation_id: None,
            due_date: Utc::now().date_naive() + Duration::days(14),
            currency: Currency::USD,
            lines: Vec::new(),
            issued: true,
        }
    }

    /// Sets the guest
    pub fn with_guest(mut self, guest_id: GuestId) -> Self {
        self.guest_id = guest_id;
        self
    }

    /// Links a reservation
    pub fn with_reservation(mut self, reservation_id: ReservationId) -> Self {
        self.reservation_id = Some(reservation_id);
        self
    }

    /// Sets the due date
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = due_date;
        self
    }

    /// Adds a zero-tax service line at the given price
    pub fn with_service_line(mut self, unit_price: Decimal) -> Self {
        let item = LineItem::new(
            LineItemKind::Service,
            StringFixtures::service_description(),
            1,
            Money::new(unit_price, self.currency),
            Rate::zero(),
        )
        .expect("builder line must be valid");
        self.lines.push(item);
        self
    }

    /// Adds an arbitrary line item
    pub fn with_line(mut self, line: LineItem) -> Self {
        self.lines.push(line);
        self
    }

    /// Leaves the invoice in draft
    pub fn draft(mut self) -> Self {
        self.issued = false;
        self
    }

    /// Builds the invoice
    pub fn build(self) -> Invoice {
        let mut invoice = Invoice::new(
            "INV-TEST-0001",
            self.guest_id,
            self.due_date,
            self.currency,
        );
        if let Some(reservation_id) = self.reservation_id {
            invoice = invoice.with_reservation(reservation_id);
        }
        for line in self.lines {
            invoice.add_item(line).expect("builder line must match currency");
        }
        if self.issued {
            invoice.issue().expect("fresh invoice must be issuable");
        }
        invoice
    }
}

/// Builder for test deposits
pub struct TestDepositBuilder {
    guest_id: GuestId,
    amount: Money,
    method: PaymentMethod,
    reservation_id: Option<ReservationId>,
    expires_at: Option<NaiveDate>,
    collected: bool,
}

impl Default for TestDepositBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDepositBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        Self {
            guest_id: IdFixtures::guest_id(),
            amount: Money::new(dec!(200.00), Currency::USD),
            method: PaymentMethod::Card,
            reservation_id: None,
            expires_at: None,
            collected: true,
        }
    }

    /// Sets the guest
    pub fn with_guest(mut self, guest_id: GuestId) -> Self {
        self.guest_id = guest_id;
        self
    }

    /// Sets the amount
    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    /// Sets the expiry date
    pub fn with_expiry(mut self, expires_at: NaiveDate) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Leaves the deposit pending collection
    pub fn pending(mut self) -> Self {
        self.collected = false;
        self
    }

    /// Builds the deposit
    pub fn build(self) -> Deposit {
        let mut deposit = Deposit::new(self.guest_id, self.amount, self.method)
            .expect("builder amount must be positive");
        if let Some(reservation_id) = self.reservation_id {
            deposit = deposit.with_reservation(reservation_id);
        }
        if let Some(expires_at) = self.expires_at {
            deposit = deposit.with_expiry(expires_at);
        }
        if self.collected {
            deposit
                .collect(IdFixtures::employee_id())
                .expect("pending deposit must be collectable");
        }
        deposit
    }
}
