//! Authentication and authorization
//!
//! The ledger consumes operator identity from bearer tokens; role and
//! permission policy beyond the per-operation gates lives upstream.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::EmployeeId;

use crate::error::ApiError;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (employee ID)
    pub sub: String,
    /// Operator's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing permission: {0}")]
    MissingPermission(String),
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `employee_id` - Operator identifier
/// * `roles` - Operator's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    employee_id: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: employee_id.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
///
/// # Arguments
///
/// * `token` - The JWT token to validate
/// * `secret` - JWT secret key
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        if e.to_string().contains("ExpiredSignature") {
            AuthError::TokenExpired
        } else {
            AuthError::InvalidToken
        }
    })?;

    Ok(token_data.claims)
}

/// Checks if the operator has the required role
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims.roles.iter().any(|r| r == required_role || r == "admin")
}

/// Rejects operators missing the required role
pub fn require_role(claims: &Claims, required_role: &str) -> Result<(), ApiError> {
    if has_role(claims, required_role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Missing permission: {required_role}"
        )))
    }
}

/// Parses the operator identity out of the token subject
pub fn operator_id(claims: &Claims) -> Result<EmployeeId, ApiError> {
    claims
        .sub
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid operator identity: {}", claims.sub)))
}

/// Permission definitions
pub mod permissions {
    pub const BILLING_READ: &str = "billing:read";
    pub const BILLING_WRITE: &str = "billing:write";
    pub const REFUND_REQUEST: &str = "refund:request";
    pub const REFUND_APPROVE: &str = "refund:approve";
    pub const REFUND_PROCESS: &str = "refund:process";
    pub const DEPOSIT_WRITE: &str = "deposit:write";
}
