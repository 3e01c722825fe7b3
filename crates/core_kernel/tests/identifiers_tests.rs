//! Tests for strongly-typed identifiers

use core_kernel::{
    InvoiceId, PaymentId, RefundId, DepositId, GuestId, EmployeeId,
};
use uuid::Uuid;

#[test]
fn test_prefixes_are_distinct() {
    assert_eq!(InvoiceId::prefix(), "INV");
    assert_eq!(PaymentId::prefix(), "PAY");
    assert_eq!(RefundId::prefix(), "RFD");
    assert_eq!(DepositId::prefix(), "DEP");
    assert_eq!(GuestId::prefix(), "GST");
    assert_eq!(EmployeeId::prefix(), "EMP");
}

#[test]
fn test_display_roundtrips_through_from_str() {
    let id = PaymentId::new_v7();
    let parsed: PaymentId = id.to_string().parse().unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn test_parse_accepts_bare_uuid() {
    let uuid = Uuid::new_v4();
    let parsed: InvoiceId = uuid.to_string().parse().unwrap();
    assert_eq!(parsed.as_uuid(), &uuid);
}

#[test]
fn test_parse_rejects_garbage() {
    assert!("not-a-uuid".parse::<RefundId>().is_err());
}

#[test]
fn test_v7_ids_carry_non_decreasing_timestamps() {
    let a = DepositId::new_v7();
    let b = DepositId::new_v7();
    // the first 48 bits of a v7 UUID are the unix timestamp in millis
    let ts = |id: &DepositId| {
        let bytes = id.as_uuid().as_bytes();
        u64::from_be_bytes([0, 0, bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]])
    };
    assert!(ts(&a) <= ts(&b));
}

#[test]
fn test_serde_is_transparent() {
    let id = GuestId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{}\"", id.as_uuid()));
}
