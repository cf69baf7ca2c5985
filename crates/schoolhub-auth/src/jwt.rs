//! JWT creation and verification.
//!
//! # Example
//!
//! ```ignore
//! use schoolhub_auth::{create_access_token, verify_token};
//! use schoolhub_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, "user@example.com", Some("TEACHER"), None, &config)?;
//! let claims = verify_token(&token, &config)?;
//! ```

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use schoolhub_config::JwtConfig;
use schoolhub_core::AppError;

use crate::claims::{ACCESS_AUDIENCE, Claims, MEMBERSHIP_AUDIENCE, MembershipClaims};

fn validation_for(audience: &str) -> Validation {
    let mut validation = Validation::default();
    validation.set_audience(&[audience]);
    validation
}

/// Creates an access token for a logged-in user.
///
/// # Errors
///
/// Returns an error if token encoding fails (e.g., invalid secret key).
pub fn create_access_token(
    user_id: Uuid,
    email: &str,
    role: Option<&str>,
    current_school_id: Option<Uuid>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let exp = now + jwt_config.access_token_expiry as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.map(str::to_string),
        current_school_id,
        aud: ACCESS_AUDIENCE.to_string(),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Verifies an access token and returns the embedded claims.
///
/// # Errors
///
/// Returns an unauthorized error if the signature is invalid, the token has
/// expired or is not an access token.
pub fn verify_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation_for(ACCESS_AUDIENCE),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired token".to_string()))
}

/// Signs a role-scoped membership token.
///
/// `aud`, `exp` and `iat` on the given claims are overwritten.
pub fn create_membership_token(
    claims: &MembershipClaims,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp() as usize;
    let claims = MembershipClaims {
        aud: MEMBERSHIP_AUDIENCE.to_string(),
        exp: now + jwt_config.membership_token_expiry as usize,
        iat: now,
        ..claims.clone()
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create membership token: {}", e)))
}

pub fn verify_membership_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<MembershipClaims, AppError> {
    decode::<MembershipClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &validation_for(MEMBERSHIP_AUDIENCE),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized("Invalid or expired membership token".to_string()))
}
