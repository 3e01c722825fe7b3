//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{Currency, Money, Rate};
use domain_billing::{LineItem, LineItemKind, PaymentMethod};

/// Strategy for generating valid Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::JPY),
        Just(Currency::AED),
        Just(Currency::THB),
        Just(Currency::SGD),
        Just(Currency::HKD),
    ]
}

/// Strategy for generating valid positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy for generating valid USD Money values with positive amounts
pub fn positive_usd_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|amount| Money::from_minor(amount, Currency::USD))
}

/// Strategy for generating rates between 0% and 25%
pub fn rate_strategy() -> impl Strategy<Value = Rate> {
    (0u32..2_500u32).prop_map(|basis_points| Rate::new(Decimal::new(basis_points as i64, 4)))
}

/// Strategy for generating payment methods
pub fn payment_method_strategy() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![
        Just(PaymentMethod::Cash),
        Just(PaymentMethod::Card),
        Just(PaymentMethod::BankTransfer),
        Just(PaymentMethod::GiftCertificate),
        Just(PaymentMethod::MemberAccount),
    ]
}

/// Strategy for generating valid USD line items
pub fn line_item_strategy() -> impl Strategy<Value = LineItem> {
    (
        1u32..10u32,
        1i64..500_000i64,
        rate_strategy(),
        prop_oneof![Just(LineItemKind::Service), Just(LineItemKind::Product)],
    )
        .prop_map(|(quantity, unit_minor, tax_rate, kind)| {
            LineItem::new(
                kind,
                "generated line",
                quantity,
                Money::from_minor(unit_minor, Currency::USD),
                tax_rate,
            )
            .expect("generated line items are valid")
        })
}
