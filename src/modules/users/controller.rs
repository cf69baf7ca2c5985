use axum::{Json, extract::State};
use tracing::instrument;

use schoolhub_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;

use super::model::User;
use super::service::UserService;

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "User profile", body = User),
        (status = 401, description = "Unauthorized - missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
#[instrument(skip(state, auth_user))]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<User>, AppError> {
    let user = UserService::get_profile(&state.db, auth_user.user_id()?).await?;
    Ok(Json(user))
}
