//! Invoice handlers

use axum::{extract::{Path, State}, Extension, Json};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{CatalogItemId, GuestId, InvoiceId, Money, Rate, ReservationId};
use ledger_engine::{CreateInvoice, NewLineItem, ReconciliationReport};

use crate::{AppState, error::ApiError};
use crate::auth::{permissions, require_role, Claims};
use crate::dto::invoices::*;

/// Creates an invoice for a completed billable event
///
/// Called by the booking subsystem once a booking becomes billable; line
/// prices are captured here and never re-derived from the catalog.
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    require_role(&claims, permissions::BILLING_WRITE)?;
    request.validate()?;

    let currency = state.engine.config().currency;
    let lines = request
        .lines
        .into_iter()
        .map(|line| NewLineItem {
            catalog_item_id: line.catalog_item_id.map(CatalogItemId::from_uuid),
            kind: line.kind,
            description: line.description,
            quantity: line.quantity,
            unit_price: Money::new(line.unit_price, currency),
            tax_rate: Rate::from_percentage(line.tax_rate_percent),
        })
        .collect();

    let invoice = state
        .engine
        .create_invoice(CreateInvoice {
            guest_id: GuestId::from_uuid(request.guest_id),
            reservation_id: request.reservation_id.map(ReservationId::from_uuid),
            due_date: request.due_date,
            lines,
        })
        .await?;

    let snapshot = state.engine.get_invoice(invoice.id).await?;
    Ok(Json(snapshot.into()))
}

/// Gets the full invoice snapshot
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    require_role(&claims, permissions::BILLING_READ)?;

    let snapshot = state.engine.get_invoice(InvoiceId::from_uuid(id)).await?;
    Ok(Json(snapshot.into()))
}

/// Adds a line item to an invoice
pub async fn add_line_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<LineItemRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    require_role(&claims, permissions::BILLING_WRITE)?;

    let currency = state.engine.config().currency;
    let invoice_id = InvoiceId::from_uuid(id);
    state
        .engine
        .add_line_item(
            invoice_id,
            NewLineItem {
                catalog_item_id: request.catalog_item_id.map(CatalogItemId::from_uuid),
                kind: request.kind,
                description: request.description,
                quantity: request.quantity,
                unit_price: Money::new(request.unit_price, currency),
                tax_rate: Rate::from_percentage(request.tax_rate_percent),
            },
        )
        .await?;

    let snapshot = state.engine.get_invoice(invoice_id).await?;
    Ok(Json(snapshot.into()))
}

/// Applies an invoice-level discount
pub async fn apply_discount(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<DiscountRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    require_role(&claims, permissions::BILLING_WRITE)?;

    let currency = state.engine.config().currency;
    let invoice_id = InvoiceId::from_uuid(id);
    state
        .engine
        .apply_discount(
            invoice_id,
            Money::new(request.amount, currency),
            request.expected_version,
        )
        .await?;

    let snapshot = state.engine.get_invoice(invoice_id).await?;
    Ok(Json(snapshot.into()))
}

/// Cancels an invoice with nothing collected against it
pub async fn cancel_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelInvoiceRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    require_role(&claims, permissions::BILLING_WRITE)?;

    let invoice_id = InvoiceId::from_uuid(id);
    state
        .engine
        .cancel_invoice(invoice_id, request.expected_version)
        .await?;

    let snapshot = state.engine.get_invoice(invoice_id).await?;
    Ok(Json(snapshot.into()))
}

/// Reconciles one invoice's stored totals against its ledger
pub async fn audit_invoice(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReconciliationReport>, ApiError> {
    require_role(&claims, permissions::BILLING_READ)?;

    let report = state.engine.audit_invoice(InvoiceId::from_uuid(id)).await?;
    Ok(Json(report))
}
