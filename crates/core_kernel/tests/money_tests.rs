//! Comprehensive unit tests for the Money module
//!
//! Tests cover money creation, arithmetic operations, rounding policy,
//! currency handling, and edge cases.

use core_kernel::{Money, Currency, MoneyError, Rate};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_creates_money_with_correct_amount() {
        let m = Money::new(dec!(100.50), Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));
        assert_eq!(m.currency(), Currency::USD);
    }

    #[test]
    fn test_new_rounds_to_currency_scale() {
        let m = Money::new(dec!(100.123456789), Currency::USD);
        assert_eq!(m.amount(), dec!(100.12));
    }

    #[test]
    fn test_new_uses_bankers_rounding_at_midpoint() {
        // half to even: .125 -> .12, .135 -> .14
        assert_eq!(Money::new(dec!(0.125), Currency::USD).amount(), dec!(0.12));
        assert_eq!(Money::new(dec!(0.135), Currency::USD).amount(), dec!(0.14));
    }

    #[test]
    fn test_from_minor_converts_cents_correctly() {
        let m = Money::from_minor(10050, Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_from_minor_handles_jpy_no_decimals() {
        let m = Money::from_minor(10000, Currency::JPY);
        assert_eq!(m.amount(), dec!(10000));
    }

    #[test]
    fn test_zero_creates_zero_amount() {
        let m = Money::zero(Currency::EUR);
        assert!(m.is_zero());
        assert_eq!(m.currency(), Currency::EUR);
    }

    #[test]
    fn test_negative_amount_creation() {
        let m = Money::new(dec!(-100.00), Currency::USD);
        assert!(m.is_negative());
        assert_eq!(m.amount(), dec!(-100.00));
    }
}

mod predicates {
    use super::*;

    #[test]
    fn test_is_zero_true_for_zero_amount() {
        let m = Money::zero(Currency::USD);
        assert!(m.is_zero());
    }

    #[test]
    fn test_is_zero_false_for_positive_amount() {
        let m = Money::new(dec!(0.01), Currency::USD);
        assert!(!m.is_zero());
    }

    #[test]
    fn test_is_positive_true_for_positive_amount() {
        let m = Money::new(dec!(100.00), Currency::USD);
        assert!(m.is_positive());
    }

    #[test]
    fn test_is_positive_false_for_zero() {
        let m = Money::zero(Currency::USD);
        assert!(!m.is_positive());
    }

    #[test]
    fn test_is_negative_true_for_negative_amount() {
        let m = Money::new(dec!(-100.00), Currency::USD);
        assert!(m.is_negative());
    }

    #[test]
    fn test_is_negative_false_for_zero() {
        let m = Money::zero(Currency::USD);
        assert!(!m.is_negative());
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_addition_of_same_currency() {
        let a = Money::new(dec!(100.25), Currency::USD);
        let b = Money::new(dec!(50.75), Currency::USD);
        assert_eq!((a + b).amount(), dec!(151.00));
    }

    #[test]
    fn test_subtraction_of_same_currency() {
        let a = Money::new(dec!(100.00), Currency::USD);
        let b = Money::new(dec!(33.33), Currency::USD);
        assert_eq!((a - b).amount(), dec!(66.67));
    }

    #[test]
    fn test_subtraction_can_go_negative() {
        let a = Money::new(dec!(10.00), Currency::USD);
        let b = Money::new(dec!(25.00), Currency::USD);
        let diff = a - b;
        assert!(diff.is_negative());
        assert_eq!(diff.amount(), dec!(-15.00));
    }

    #[test]
    fn test_checked_add_rejects_currency_mismatch() {
        let usd = Money::new(dec!(100.00), Currency::USD);
        let thb = Money::new(dec!(100.00), Currency::THB);
        assert!(matches!(
            usd.checked_add(&thb),
            Err(MoneyError::CurrencyMismatch(_, _))
        ));
    }

    #[test]
    fn test_checked_sub_rejects_currency_mismatch() {
        let usd = Money::new(dec!(100.00), Currency::USD);
        let eur = Money::new(dec!(100.00), Currency::EUR);
        assert!(matches!(
            usd.checked_sub(&eur),
            Err(MoneyError::CurrencyMismatch(_, _))
        ));
    }

    #[test]
    fn test_negation() {
        let m = Money::new(dec!(42.00), Currency::USD);
        assert_eq!((-m).amount(), dec!(-42.00));
    }

    #[test]
    fn test_abs() {
        let m = Money::new(dec!(-42.00), Currency::USD);
        assert_eq!(m.abs().amount(), dec!(42.00));
    }

    #[test]
    fn test_multiply_by_quantity() {
        let unit = Money::new(dec!(19.99), Currency::USD);
        assert_eq!(unit.multiply(dec!(3)).amount(), dec!(59.97));
    }

    #[test]
    fn test_multiply_rounds_half_to_even() {
        // 10.01 × 0.5 = 5.005 -> 5.00 under banker's rounding
        let m = Money::new(dec!(10.01), Currency::USD);
        assert_eq!(m.multiply(dec!(0.5)).amount(), dec!(5.00));
    }
}

mod comparison {
    use super::*;

    #[test]
    fn test_ordering_within_same_currency() {
        let small = Money::new(dec!(1.00), Currency::USD);
        let large = Money::new(dec!(2.00), Currency::USD);
        assert!(small < large);
        assert!(large >= small);
    }

    #[test]
    fn test_cross_currency_comparison_is_none() {
        let usd = Money::new(dec!(1.00), Currency::USD);
        let gbp = Money::new(dec!(1.00), Currency::GBP);
        assert_eq!(usd.partial_cmp(&gbp), None);
    }

    #[test]
    fn test_equality_on_fixed_point_representation() {
        // Both round to 1.00 on the two-decimal grid
        let a = Money::new(dec!(1.001), Currency::USD);
        let b = Money::new(dec!(0.999), Currency::USD);
        assert_eq!(a, b);
    }
}

mod rates {
    use super::*;

    #[test]
    fn test_rate_from_percentage() {
        let rate = Rate::from_percentage(dec!(7.0));
        assert_eq!(rate.as_decimal(), dec!(0.07));
        assert_eq!(rate.as_percentage(), dec!(7.00));
    }

    #[test]
    fn test_rate_apply() {
        let vat = Rate::from_percentage(dec!(5.0));
        let base = Money::new(dec!(200.00), Currency::USD);
        assert_eq!(vat.apply(&base).amount(), dec!(10.00));
    }

    #[test]
    fn test_zero_rate() {
        let rate = Rate::zero();
        assert!(rate.is_zero());
        let base = Money::new(dec!(123.45), Currency::USD);
        assert!(rate.apply(&base).is_zero());
    }

    #[test]
    fn test_rate_apply_rounds_to_scale() {
        // 7% of 33.33 = 2.3331 -> 2.33
        let rate = Rate::from_percentage(dec!(7.0));
        let base = Money::new(dec!(33.33), Currency::USD);
        assert_eq!(rate.apply(&base).amount(), dec!(2.33));
    }
}

mod display {
    use super::*;

    #[test]
    fn test_display_includes_symbol_and_scale() {
        let m = Money::new(dec!(1234.5), Currency::USD);
        assert_eq!(m.to_string(), "$ 1234.50");
    }

    #[test]
    fn test_display_jpy_has_no_decimals() {
        let m = Money::new(dec!(5000), Currency::JPY);
        assert_eq!(m.to_string(), "¥ 5000");
    }
}
