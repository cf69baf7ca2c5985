use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use schoolhub_core::AppError;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::model::{AcademicStructureResult, SetupAcademicStructureDto};
use super::service::AcademicService;

/// Generate classes and modules from the school's curriculum
#[utoipa::path(
    post,
    path = "/api/schools/academic",
    request_body = SetupAcademicStructureDto,
    responses(
        (status = 201, description = "Classes and modules generated", body = AcademicStructureResult),
        (status = 400, description = "Identifier generation exhausted", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller did not create the school", body = ErrorResponse),
        (status = 404, description = "School not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Academics",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn setup_academic_structure(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<SetupAcademicStructureDto>,
) -> Result<(StatusCode, Json<AcademicStructureResult>), AppError> {
    let result = AcademicService::setup_academic_structure(
        &state.db,
        &state.academic_config,
        auth_user.user_id()?,
        dto,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(result)))
}
