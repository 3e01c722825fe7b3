//! HTTP API Layer
//!
//! This crate provides the REST API for the club billing ledger using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for invoices, payments, refunds, deposits
//! - **Middleware**: Authentication, audit logging
//! - **DTOs**: Request/Response data transfer objects with validation
//! - **Error Handling**: Consistent structured error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, config::ApiConfig};
//!
//! let app = create_router(engine, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use ledger_engine::LedgerEngine;

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, audit_middleware};
use crate::handlers::{deposits, health, invoices, payments, refunds};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: LedgerEngine,
    pub config: ApiConfig,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `engine` - The ledger engine every mutation goes through
/// * `config` - API configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(engine: LedgerEngine, config: ApiConfig) -> Router {
    let state = AppState { engine, config };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Invoice routes
    let invoice_routes = Router::new()
        .route("/", post(invoices::create_invoice))
        .route("/:id", get(invoices::get_invoice))
        .route("/:id/items", post(invoices::add_line_item))
        .route("/:id/discount", post(invoices::apply_discount))
        .route("/:id/cancel", post(invoices::cancel_invoice))
        .route("/:id/payments", post(payments::submit_payment))
        .route("/:id/refunds", post(refunds::request_refund))
        .route("/:id/deposits/apply", post(deposits::apply_deposit))
        .route("/:id/audit", get(invoices::audit_invoice));

    // Refund workflow routes
    let refund_routes = Router::new()
        .route("/:id/approve", post(refunds::approve_refund))
        .route("/:id/process", post(refunds::process_refund))
        .route("/:id/reject", post(refunds::reject_refund))
        .route("/:id/cancel", post(refunds::cancel_refund));

    // Deposit routes
    let deposit_routes = Router::new()
        .route("/", post(deposits::create_deposit))
        .route("/:id/collect", post(deposits::collect_deposit));

    // Guest-scoped reads
    let guest_routes = Router::new()
        .route("/:id/deposits", get(deposits::list_guest_deposits));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/invoices", invoice_routes)
        .nest("/refunds", refund_routes)
        .nest("/deposits", deposit_routes)
        .nest("/guests", guest_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
