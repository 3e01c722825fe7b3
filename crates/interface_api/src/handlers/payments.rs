//! Payment handlers

use axum::{extract::{Path, State}, Extension, Json};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{InvoiceId, Money};
use ledger_engine::SubmitPayment;

use crate::{AppState, error::ApiError};
use crate::auth::{operator_id, permissions, require_role, Claims};
use crate::dto::payments::*;

/// Records a payment against an invoice
///
/// Resubmitting the same idempotency key returns the original payment and
/// the current balance; no second charge is made.
pub async fn submit_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitPaymentRequest>,
) -> Result<Json<SubmitPaymentResponse>, ApiError> {
    require_role(&claims, permissions::BILLING_WRITE)?;
    request.validate()?;
    let operator = operator_id(&claims)?;

    let invoice_id = InvoiceId::from_uuid(id);
    let amount = Money::new(request.amount, state.engine.config().currency);

    let mut submit = SubmitPayment::new(invoice_id, amount, request.method, operator);
    if request.manual {
        submit = submit.manual();
    }
    if let Some(key) = request.idempotency_key {
        submit = submit.with_idempotency_key(key);
    }

    let payment = state.engine.submit_payment(submit).await?;
    let snapshot = state.engine.get_invoice(invoice_id).await?;

    Ok(Json(SubmitPaymentResponse {
        payment: PaymentView::from(&payment),
        invoice_status: snapshot.invoice.status,
        balance_due: snapshot.invoice.balance_due.amount(),
    }))
}
