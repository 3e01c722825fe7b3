//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for common entities across the billing
//! ledger. These fixtures are designed to be consistent and predictable
//! for unit tests.

use rust_decimal_macros::dec;

use core_kernel::{
    Currency, DepositId, EmployeeId, GuestId, InvoiceId, Money, PaymentId, Rate, ReservationId,
};
use domain_billing::BillingConfig;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Creates a standard USD amount for testing
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }

    /// Typical single-treatment price
    pub fn usd_treatment() -> Money {
        Money::new(dec!(85.00), Currency::USD)
    }

    /// Typical reservation deposit
    pub fn usd_deposit() -> Money {
        Money::new(dec!(200.00), Currency::USD)
    }

    /// Creates a zero amount
    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// Creates a EUR amount for currency mismatch tests
    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::EUR)
    }
}

/// Fixture for rate test data
pub struct RateFixtures;

impl RateFixtures {
    /// Standard VAT rate (5%)
    pub fn vat() -> Rate {
        Rate::from_percentage(dec!(5.0))
    }

    /// Standard service-charge rate (10%)
    pub fn service_charge() -> Rate {
        Rate::from_percentage(dec!(10.0))
    }

    /// Retail line tax (7%)
    pub fn retail_tax() -> Rate {
        Rate::from_percentage(dec!(7.0))
    }
}

/// Fixture for billing configuration
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// Configuration with no rates, for arithmetic-focused tests
    pub fn flat_usd() -> BillingConfig {
        BillingConfig::default()
    }

    /// Configuration with VAT and service charge enabled
    pub fn resort_usd() -> BillingConfig {
        BillingConfig::new(Currency::USD, RateFixtures::vat(), RateFixtures::service_charge())
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    pub fn invoice_id() -> InvoiceId {
        InvoiceId::new_v7()
    }

    pub fn payment_id() -> PaymentId {
        PaymentId::new_v7()
    }

    pub fn deposit_id() -> DepositId {
        DepositId::new_v7()
    }

    pub fn guest_id() -> GuestId {
        GuestId::new_v7()
    }

    pub fn employee_id() -> EmployeeId {
        EmployeeId::new_v7()
    }

    pub fn reservation_id() -> ReservationId {
        ReservationId::new_v7()
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    /// A service description as it appears on invoices
    pub fn service_description() -> &'static str {
        "60-minute deep tissue massage"
    }

    /// A product description as it appears on invoices
    pub fn product_description() -> &'static str {
        "Lavender bath oil 250ml"
    }

    /// A refund reason accepted by validation
    pub fn refund_reason() -> &'static str {
        "guest cancelled within the grace period"
    }
}
