use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use schoolhub_auth::{Claims, verify_token};
use schoolhub_core::AppError;
use schoolhub_models::{UserId, UserRole};

use crate::state::AppState;

/// Extractor that validates the bearer access token and yields its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.0
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token".to_string()))
    }

    /// Role declared on the account when the token was issued.
    pub fn role(&self) -> Option<UserRole> {
        self.0.role.as_deref().and_then(|r| r.parse().ok())
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format".to_string())
        })?;

        Ok(AuthUser(verify_token(token, &state.jwt_config)?))
    }
}

/// Like [`AuthUser`] but only admits accounts declared as `ADMIN`.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        if auth_user.role() != Some(UserRole::Admin) {
            return Err(AppError::forbidden(
                "Only administrators can perform this action".to_string(),
            ));
        }
        Ok(AdminUser(auth_user))
    }
}
