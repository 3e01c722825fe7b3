//! Payment DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_billing::{InvoiceStatus, Payment, PaymentMethod, PaymentStatus, PaymentType};

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitPaymentRequest {
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Marks a back-office manual adjustment
    #[serde(default)]
    pub manual: bool,
    #[validate(length(min = 1, max = 128))]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentView {
    pub id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub kind: PaymentType,
    pub status: PaymentStatus,
    pub refunded_amount: Decimal,
    pub deposit_id: Option<Uuid>,
    pub processed_by: Uuid,
    pub payment_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Payment> for PaymentView {
    fn from(payment: &Payment) -> Self {
        Self {
            id: *payment.id.as_uuid(),
            amount: payment.amount.amount(),
            method: payment.method,
            kind: payment.kind,
            status: payment.status,
            refunded_amount: payment.refunded_amount.amount(),
            deposit_id: payment.deposit_id.map(|id| *id.as_uuid()),
            processed_by: *payment.processed_by.as_uuid(),
            payment_date: payment.payment_date,
            completed_at: payment.completed_at,
        }
    }
}

/// Returned from payment submission: the payment plus the updated balance
#[derive(Debug, Serialize)]
pub struct SubmitPaymentResponse {
    pub payment: PaymentView,
    pub invoice_status: InvoiceStatus,
    pub balance_due: Decimal,
}
