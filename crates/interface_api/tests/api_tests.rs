//! Request-level tests for the billing API
//!
//! Runs the full router in process: authentication, role gates, DTO
//! validation, and the ledger engine behind the handlers.

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use core_kernel::EmployeeId;
use interface_api::{auth, config::ApiConfig, create_router};
use ledger_engine::{LedgerEngine, LedgerStore};

const JWT_SECRET: &str = "test-secret";

fn test_config() -> ApiConfig {
    ApiConfig {
        jwt_secret: JWT_SECRET.to_string(),
        ..ApiConfig::default()
    }
}

fn server() -> TestServer {
    let config = test_config();
    let engine = LedgerEngine::new(Arc::new(LedgerStore::new()), config.billing_config());
    TestServer::new(create_router(engine, config)).unwrap()
}

fn token_with_roles(roles: &[&str]) -> String {
    auth::create_token(
        &EmployeeId::new_v7().to_string(),
        roles.iter().map(|r| r.to_string()).collect(),
        JWT_SECRET,
        3600,
    )
    .unwrap()
}

fn admin_token() -> String {
    token_with_roles(&["admin"])
}

async fn create_invoice(server: &TestServer, token: &str, amount: &str) -> Value {
    let response = server
        .post("/api/v1/invoices")
        .authorization_bearer(token)
        .json(&json!({
            "guest_id": Uuid::new_v4(),
            "due_date": "2026-09-01",
            "lines": [{
                "kind": "Service",
                "description": "Thermal suite session",
                "quantity": 1,
                "unit_price": amount,
            }],
        }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()
}

#[tokio::test]
async fn test_health_is_public() {
    let server = server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_requests_without_token_rejected() {
    let server = server();
    let response = server.get(&format!("/api/v1/invoices/{}", Uuid::new_v4())).await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_role_gate_enforced() {
    let server = server();
    let token = token_with_roles(&["billing:read"]);

    let response = server
        .post("/api/v1/invoices")
        .authorization_bearer(&token)
        .json(&json!({
            "guest_id": Uuid::new_v4(),
            "due_date": "2026-09-01",
            "lines": [{
                "kind": "Service",
                "description": "Swim pass",
                "quantity": 1,
                "unit_price": "20.00",
            }],
        }))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_invoice_creation_derives_totals() {
    let server = server();
    let token = admin_token();

    let invoice = create_invoice(&server, &token, "100.00").await;
    assert_eq!(invoice["status"], "Issued");
    assert_eq!(invoice["total"], "100.00");
    assert_eq!(invoice["balance_due"], "100.00");
    assert_eq!(invoice["amount_paid"], "0.00");
}

#[tokio::test]
async fn test_payment_flow_settles_invoice() {
    let server = server();
    let token = admin_token();
    let invoice = create_invoice(&server, &token, "100.00").await;
    let invoice_id = invoice["id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/v1/invoices/{invoice_id}/payments"))
        .authorization_bearer(&token)
        .json(&json!({"amount": "60.00", "method": "Card"}))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["invoice_status"], "Partial");
    assert_eq!(body["balance_due"], "40.00");

    let response = server
        .post(&format!("/api/v1/invoices/{invoice_id}/payments"))
        .authorization_bearer(&token)
        .json(&json!({"amount": "40.00", "method": "Cash"}))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["invoice_status"], "Paid");
    assert_eq!(body["balance_due"], "0.00");
}

#[tokio::test]
async fn test_overpayment_is_a_conflict() {
    let server = server();
    let token = admin_token();
    let invoice = create_invoice(&server, &token, "100.00").await;
    let invoice_id = invoice["id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/v1/invoices/{invoice_id}/payments"))
        .authorization_bearer(&token)
        .json(&json!({"amount": "150.00", "method": "Card"}))
        .await;
    assert_eq!(response.status_code(), 409);
    assert_eq!(response.json::<Value>()["error"], "conflict");

    // totals unchanged
    let snapshot = server
        .get(&format!("/api/v1/invoices/{invoice_id}"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(snapshot["balance_due"], "100.00");
    assert!(snapshot["payments"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_positive_amount_is_a_validation_error() {
    let server = server();
    let token = admin_token();
    let invoice = create_invoice(&server, &token, "50.00").await;
    let invoice_id = invoice["id"].as_str().unwrap();

    let response = server
        .post(&format!("/api/v1/invoices/{invoice_id}/payments"))
        .authorization_bearer(&token)
        .json(&json!({"amount": "0.00", "method": "Card"}))
        .await;
    assert_eq!(response.status_code(), 422);
    assert_eq!(response.json::<Value>()["error"], "validation_error");
}

#[tokio::test]
async fn test_idempotent_resubmission_returns_same_payment() {
    let server = server();
    let token = admin_token();
    let invoice = create_invoice(&server, &token, "100.00").await;
    let invoice_id = invoice["id"].as_str().unwrap();

    let body = json!({
        "amount": "60.00",
        "method": "Card",
        "idempotency_key": "front-desk-4021",
    });

    let first = server
        .post(&format!("/api/v1/invoices/{invoice_id}/payments"))
        .authorization_bearer(&token)
        .json(&body)
        .await
        .json::<Value>();
    let second = server
        .post(&format!("/api/v1/invoices/{invoice_id}/payments"))
        .authorization_bearer(&token)
        .json(&body)
        .await
        .json::<Value>();

    assert_eq!(first["payment"]["id"], second["payment"]["id"]);
    assert_eq!(second["balance_due"], "40.00");

    let snapshot = server
        .get(&format!("/api/v1/invoices/{invoice_id}"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(snapshot["payments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_refund_workflow_over_the_api() {
    let server = server();
    let token = admin_token();
    let invoice = create_invoice(&server, &token, "100.00").await;
    let invoice_id = invoice["id"].as_str().unwrap();

    server
        .post(&format!("/api/v1/invoices/{invoice_id}/payments"))
        .authorization_bearer(&token)
        .json(&json!({"amount": "100.00", "method": "Card"}))
        .await
        .assert_status_ok();

    let refund = server
        .post(&format!("/api/v1/invoices/{invoice_id}/refunds"))
        .authorization_bearer(&token)
        .json(&json!({
            "amount": "30.00",
            "reason": "cancellation",
            "method": "Card",
        }))
        .await
        .json::<Value>();
    assert_eq!(refund["status"], "Pending");
    let refund_id = refund["id"].as_str().unwrap();

    let approved = server
        .post(&format!("/api/v1/refunds/{refund_id}/approve"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(approved["status"], "Approved");

    let processed = server
        .post(&format!("/api/v1/refunds/{refund_id}/process"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(processed["status"], "Processed");

    let snapshot = server
        .get(&format!("/api/v1/invoices/{invoice_id}"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(snapshot["status"], "Partial");
    assert_eq!(snapshot["amount_paid"], "70.00");
    assert_eq!(snapshot["balance_due"], "30.00");
}

#[tokio::test]
async fn test_deposit_flow_over_the_api() {
    let server = server();
    let token = admin_token();
    let guest_id = Uuid::new_v4();

    let deposit = server
        .post("/api/v1/deposits")
        .authorization_bearer(&token)
        .json(&json!({
            "guest_id": guest_id,
            "amount": "120.00",
            "method": "Card",
        }))
        .await
        .json::<Value>();
    assert_eq!(deposit["status"], "Pending");
    let deposit_id = deposit["id"].as_str().unwrap();

    let collected = server
        .post(&format!("/api/v1/deposits/{deposit_id}/collect"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(collected["status"], "Collected");

    // the invoice is opened for the same guest
    let invoice = server
        .post("/api/v1/invoices")
        .authorization_bearer(&token)
        .json(&json!({
            "guest_id": guest_id,
            "due_date": "2026-09-01",
            "lines": [{
                "kind": "Service",
                "description": "Couples retreat",
                "quantity": 1,
                "unit_price": "200.00",
            }],
        }))
        .await
        .json::<Value>();
    let invoice_id = invoice["id"].as_str().unwrap();

    let applied = server
        .post(&format!("/api/v1/invoices/{invoice_id}/deposits/apply"))
        .authorization_bearer(&token)
        .json(&json!({"deposit_id": deposit_id}))
        .await
        .json::<Value>();
    assert_eq!(applied["payment"]["kind"], "DepositApplication");
    assert_eq!(applied["payment"]["amount"], "120.00");
    assert_eq!(applied["balance_due"], "80.00");

    let deposits = server
        .get(&format!("/api/v1/guests/{guest_id}/deposits"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(deposits[0]["status"], "FullyApplied");
    assert_eq!(deposits[0]["remaining_amount"], "0.00");
}

#[tokio::test]
async fn test_stale_version_conflict_on_discount() {
    let server = server();
    let token = admin_token();
    let invoice = create_invoice(&server, &token, "100.00").await;
    let invoice_id = invoice["id"].as_str().unwrap();
    let version = invoice["version"].as_i64().unwrap();

    // first discount succeeds and advances the version
    server
        .post(&format!("/api/v1/invoices/{invoice_id}/discount"))
        .authorization_bearer(&token)
        .json(&json!({"amount": "10.00", "expected_version": version}))
        .await
        .assert_status_ok();

    // replaying the same observed version is rejected
    let response = server
        .post(&format!("/api/v1/invoices/{invoice_id}/discount"))
        .authorization_bearer(&token)
        .json(&json!({"amount": "5.00", "expected_version": version}))
        .await;
    assert_eq!(response.status_code(), 409);
}

#[tokio::test]
async fn test_audit_endpoint_reports_consistency() {
    let server = server();
    let token = admin_token();
    let invoice = create_invoice(&server, &token, "100.00").await;
    let invoice_id = invoice["id"].as_str().unwrap();

    server
        .post(&format!("/api/v1/invoices/{invoice_id}/payments"))
        .authorization_bearer(&token)
        .json(&json!({"amount": "25.00", "method": "Cash"}))
        .await
        .assert_status_ok();

    let report = server
        .get(&format!("/api/v1/invoices/{invoice_id}/audit"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(report["consistent"], true);
    assert_eq!(report["ledger_amount_paid"], "25.00");
}
