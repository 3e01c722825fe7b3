//! Deposit handlers

use axum::{extract::{Path, State}, Extension, Json};
use uuid::Uuid;

use core_kernel::{DepositId, GuestId, InvoiceId, Money, ReservationId};
use ledger_engine::{ApplyDeposit, CreateDeposit};

use crate::{AppState, error::ApiError};
use crate::auth::{operator_id, permissions, require_role, Claims};
use crate::dto::deposits::*;
use crate::dto::payments::{PaymentView, SubmitPaymentResponse};

/// Opens a deposit for a guest
pub async fn create_deposit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateDepositRequest>,
) -> Result<Json<DepositView>, ApiError> {
    require_role(&claims, permissions::DEPOSIT_WRITE)?;

    let deposit = state
        .engine
        .create_deposit(CreateDeposit {
            guest_id: GuestId::from_uuid(request.guest_id),
            amount: Money::new(request.amount, state.engine.config().currency),
            method: request.method,
            reservation_id: request.reservation_id.map(ReservationId::from_uuid),
            expires_at: request.expires_at,
        })
        .await?;

    Ok(Json(deposit.into()))
}

/// Records receipt of the deposit money
pub async fn collect_deposit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<DepositView>, ApiError> {
    require_role(&claims, permissions::DEPOSIT_WRITE)?;
    let operator = operator_id(&claims)?;

    let deposit = state
        .engine
        .collect_deposit(DepositId::from_uuid(id), operator)
        .await?;
    Ok(Json(deposit.into()))
}

/// Applies deposit funds to an invoice
pub async fn apply_deposit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApplyDepositRequest>,
) -> Result<Json<SubmitPaymentResponse>, ApiError> {
    require_role(&claims, permissions::DEPOSIT_WRITE)?;
    let operator = operator_id(&claims)?;

    let invoice_id = InvoiceId::from_uuid(id);
    let currency = state.engine.config().currency;
    let payment = state
        .engine
        .apply_deposit(ApplyDeposit {
            deposit_id: DepositId::from_uuid(request.deposit_id),
            invoice_id,
            amount: request.amount.map(|amount| Money::new(amount, currency)),
            processed_by: operator,
        })
        .await?;

    let snapshot = state.engine.get_invoice(invoice_id).await?;
    Ok(Json(SubmitPaymentResponse {
        payment: PaymentView::from(&payment),
        invoice_status: snapshot.invoice.status,
        balance_due: snapshot.invoice.balance_due.amount(),
    }))
}

/// Lists the deposits held for a guest
pub async fn list_guest_deposits(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DepositView>>, ApiError> {
    require_role(&claims, permissions::BILLING_READ)?;

    let deposits = state
        .engine
        .deposits_for_guest(GuestId::from_uuid(id))
        .await;
    Ok(Json(deposits.iter().map(DepositView::from).collect()))
}
