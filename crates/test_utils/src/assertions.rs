//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_billing::Invoice;

/// Asserts that two Money values are equal on the fixed-point grid
///
/// # Panics
///
/// Panics if the currencies or the amounts differ
pub fn assert_money_eq(actual: &Money, expected: &Money) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );
    assert_eq!(
        actual.amount(),
        expected.amount(),
        "Money amounts differ: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts that a Money value is positive
pub fn assert_money_positive(money: &Money) {
    assert!(
        money.is_positive(),
        "Expected positive money, got {}",
        money
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(money.is_zero(), "Expected zero money, got {}", money);
}

/// Asserts the ledger invariants that must hold for any invoice at rest
///
/// - `total = subtotal + service_charge + tax - discount`
/// - `balance_due = total - amount_paid`
/// - `balance_due` is never negative
///
/// # Panics
///
/// Panics with the offending field values if any invariant is broken
pub fn assert_invoice_consistent(invoice: &Invoice) {
    let recombined = invoice
        .subtotal
        .checked_add(&invoice.service_charge)
        .and_then(|sum| sum.checked_add(&invoice.tax))
        .and_then(|sum| sum.checked_sub(&invoice.discount))
        .expect("invoice fields must share one currency");
    assert_eq!(
        invoice.total, recombined,
        "Invoice {}: total {} disagrees with components {}",
        invoice.invoice_number, invoice.total, recombined
    );

    let expected_balance = invoice
        .total
        .checked_sub(&invoice.amount_paid)
        .expect("invoice fields must share one currency");
    assert_eq!(
        invoice.balance_due, expected_balance,
        "Invoice {}: balance_due {} disagrees with total - amount_paid = {}",
        invoice.invoice_number, invoice.balance_due, expected_balance
    );

    assert!(
        !invoice.balance_due.is_negative(),
        "Invoice {}: negative balance_due {}",
        invoice.invoice_number,
        invoice.balance_due
    );
}
