//! Refund handlers

use axum::{extract::{Path, State}, Extension, Json};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{InvoiceId, Money, PaymentId, RefundId};
use ledger_engine::RequestRefund;

use crate::{AppState, error::ApiError};
use crate::auth::{operator_id, permissions, require_role, Claims};
use crate::dto::refunds::*;

/// Requests a refund against an invoice
pub async fn request_refund(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<RequestRefundRequest>,
) -> Result<Json<RefundView>, ApiError> {
    require_role(&claims, permissions::REFUND_REQUEST)?;
    request.validate()?;
    let operator = operator_id(&claims)?;

    let refund = state
        .engine
        .request_refund(RequestRefund {
            invoice_id: InvoiceId::from_uuid(id),
            amount: Money::new(request.amount, state.engine.config().currency),
            reason: request.reason,
            method: request.method,
            payment_id: request.payment_id.map(PaymentId::from_uuid),
            requested_by: operator,
        })
        .await?;

    Ok(Json(refund.into()))
}

/// Approves a pending refund
pub async fn approve_refund(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<RefundView>, ApiError> {
    require_role(&claims, permissions::REFUND_APPROVE)?;
    let operator = operator_id(&claims)?;

    let refund = state
        .engine
        .approve_refund(RefundId::from_uuid(id), operator)
        .await?;
    Ok(Json(refund.into()))
}

/// Processes a refund; this is the transition that moves money
pub async fn process_refund(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<RefundView>, ApiError> {
    require_role(&claims, permissions::REFUND_PROCESS)?;
    let operator = operator_id(&claims)?;

    let refund = state
        .engine
        .process_refund(RefundId::from_uuid(id), operator)
        .await?;
    Ok(Json(refund.into()))
}

/// Rejects a pending refund
pub async fn reject_refund(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<RefundView>, ApiError> {
    require_role(&claims, permissions::REFUND_APPROVE)?;
    let operator = operator_id(&claims)?;

    let refund = state
        .engine
        .reject_refund(RefundId::from_uuid(id), operator)
        .await?;
    Ok(Json(refund.into()))
}

/// Withdraws a refund that has not been processed
pub async fn cancel_refund(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<RefundView>, ApiError> {
    require_role(&claims, permissions::REFUND_REQUEST)?;

    let refund = state.engine.cancel_refund(RefundId::from_uuid(id)).await?;
    Ok(Json(refund.into()))
}
