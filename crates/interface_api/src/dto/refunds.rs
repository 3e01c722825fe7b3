//! Refund DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_billing::{PaymentMethod, Refund, RefundStatus};

#[derive(Debug, Deserialize, Validate)]
pub struct RequestRefundRequest {
    pub amount: Decimal,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    pub method: PaymentMethod,
    /// Specific payment to refund against, if any
    pub payment_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RefundView {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub payment_id: Option<Uuid>,
    pub amount: Decimal,
    pub reason: String,
    pub method: PaymentMethod,
    pub status: RefundStatus,
    pub requested_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub processed_by: Option<Uuid>,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<&Refund> for RefundView {
    fn from(refund: &Refund) -> Self {
        Self {
            id: *refund.id.as_uuid(),
            invoice_id: *refund.invoice_id.as_uuid(),
            payment_id: refund.payment_id.map(|id| *id.as_uuid()),
            amount: refund.amount.amount(),
            reason: refund.reason.clone(),
            method: refund.method,
            status: refund.status,
            requested_by: *refund.requested_by.as_uuid(),
            approved_by: refund.approved_by.map(|id| *id.as_uuid()),
            processed_by: refund.processed_by.map(|id| *id.as_uuid()),
            requested_at: refund.requested_at,
            approved_at: refund.approved_at,
            processed_at: refund.processed_at,
        }
    }
}

impl From<Refund> for RefundView {
    fn from(refund: Refund) -> Self {
        Self::from(&refund)
    }
}
