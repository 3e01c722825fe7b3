//! Invoice DTOs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_billing::{Invoice, InvoiceStatus, LineItem, LineItemKind};
use ledger_engine::InvoiceSnapshot;

use super::payments::PaymentView;
use super::refunds::RefundView;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub guest_id: Uuid,
    pub reservation_id: Option<Uuid>,
    pub due_date: NaiveDate,
    #[validate(length(min = 1, message = "at least one line item is required"))]
    pub lines: Vec<LineItemRequest>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LineItemRequest {
    pub catalog_item_id: Option<Uuid>,
    pub kind: LineItemKind,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Per-line tax rate as a percentage (e.g., 7.0 for 7%)
    #[serde(default)]
    pub tax_rate_percent: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    pub amount: Decimal,
    /// Version the client last observed; stale versions are rejected
    pub expected_version: i64,
}

#[derive(Debug, Deserialize)]
pub struct CancelInvoiceRequest {
    pub expected_version: i64,
}

#[derive(Debug, Serialize)]
pub struct LineItemView {
    pub id: Uuid,
    pub catalog_item_id: Option<Uuid>,
    pub kind: LineItemKind,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub tax_rate_percent: Decimal,
}

impl From<&LineItem> for LineItemView {
    fn from(item: &LineItem) -> Self {
        Self {
            id: *item.id.as_uuid(),
            catalog_item_id: item.catalog_item_id.map(|id| *id.as_uuid()),
            kind: item.kind,
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price.amount(),
            tax_rate_percent: item.tax_rate.as_percentage(),
        }
    }
}

/// Full invoice snapshot: derived totals plus the append-only histories
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub invoice_number: String,
    pub guest_id: Uuid,
    pub reservation_id: Option<Uuid>,
    pub status: InvoiceStatus,
    pub version: i64,
    pub currency: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: Decimal,
    pub service_charge: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub items: Vec<LineItemView>,
    pub payments: Vec<PaymentView>,
    pub refunds: Vec<RefundView>,
    pub created_at: DateTime<Utc>,
}

impl InvoiceResponse {
    fn from_invoice(invoice: &Invoice) -> Self {
        Self {
            id: *invoice.id.as_uuid(),
            invoice_number: invoice.invoice_number.clone(),
            guest_id: *invoice.guest_id.as_uuid(),
            reservation_id: invoice.reservation_id.map(|id| *id.as_uuid()),
            status: invoice.status,
            version: invoice.version,
            currency: invoice.currency.code().to_string(),
            invoice_date: invoice.invoice_date,
            due_date: invoice.due_date,
            subtotal: invoice.subtotal.amount(),
            service_charge: invoice.service_charge.amount(),
            tax: invoice.tax.amount(),
            discount: invoice.discount.amount(),
            total: invoice.total.amount(),
            amount_paid: invoice.amount_paid.amount(),
            balance_due: invoice.balance_due.amount(),
            items: invoice.items.iter().map(LineItemView::from).collect(),
            payments: Vec::new(),
            refunds: Vec::new(),
            created_at: invoice.created_at,
        }
    }
}

impl From<InvoiceSnapshot> for InvoiceResponse {
    fn from(snapshot: InvoiceSnapshot) -> Self {
        let mut response = Self::from_invoice(&snapshot.invoice);
        response.payments = snapshot.payments.iter().map(PaymentView::from).collect();
        response.refunds = snapshot.refunds.iter().map(RefundView::from).collect();
        response
    }
}
