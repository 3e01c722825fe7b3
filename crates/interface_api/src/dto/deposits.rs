//! Deposit DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain_billing::{Deposit, DepositStatus, PaymentMethod};

#[derive(Debug, Deserialize)]
pub struct CreateDepositRequest {
    pub guest_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reservation_id: Option<Uuid>,
    pub expires_at: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyDepositRequest {
    pub deposit_id: Uuid,
    /// Amount to apply; omitted means the remaining deposit capped at
    /// the invoice's balance due
    pub amount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct DepositView {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub reservation_id: Option<Uuid>,
    pub amount: Decimal,
    pub amount_applied: Decimal,
    pub remaining_amount: Decimal,
    pub status: DepositStatus,
    pub method: PaymentMethod,
    pub expires_at: Option<NaiveDate>,
    pub collected_at: Option<DateTime<Utc>>,
}

impl From<&Deposit> for DepositView {
    fn from(deposit: &Deposit) -> Self {
        Self {
            id: *deposit.id.as_uuid(),
            guest_id: *deposit.guest_id.as_uuid(),
            reservation_id: deposit.reservation_id.map(|id| *id.as_uuid()),
            amount: deposit.amount.amount(),
            amount_applied: deposit.amount_applied.amount(),
            remaining_amount: deposit.remaining_amount().amount(),
            status: deposit.status,
            method: deposit.method,
            expires_at: deposit.expires_at,
            collected_at: deposit.collected_at,
        }
    }
}

impl From<Deposit> for DepositView {
    fn from(deposit: Deposit) -> Self {
        Self::from(&deposit)
    }
}
