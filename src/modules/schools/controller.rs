use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use schoolhub_core::AppError;
use schoolhub_models::SchoolId;
use schoolhub_models::academics::{Class, Module};

use crate::middleware::auth::AdminUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::memberships::model::SchoolMembersResponse;
use crate::modules::memberships::service::MembershipService;
use crate::state::AppState;
use crate::utils::ids::parse_id;
use crate::validator::ValidatedJson;

use super::model::{CreateSchoolDto, SchoolView};
use super::service::SchoolService;

#[utoipa::path(
    post,
    path = "/api/schools",
    request_body = CreateSchoolDto,
    responses(
        (status = 201, description = "School created", body = SchoolView),
        (status = 400, description = "Username taken or duplicate contact", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - administrators only", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Schools",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, admin, dto))]
pub async fn create_school(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(dto): ValidatedJson<CreateSchoolDto>,
) -> Result<(StatusCode, Json<SchoolView>), AppError> {
    let school = SchoolService::create_school(&state.db, admin.user_id()?, dto).await?;
    Ok((StatusCode::CREATED, Json(school)))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}",
    params(("id" = String, Path, description = "School ID")),
    responses(
        (status = 200, description = "School details", body = SchoolView),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "School not found", body = ErrorResponse)
    ),
    tag = "Schools"
)]
#[instrument(skip(state))]
pub async fn get_school(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SchoolView>, AppError> {
    let id: SchoolId = parse_id(&id, "school id")?;
    Ok(Json(SchoolService::get_school(&state.db, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/schools/username/{username}",
    params(("username" = String, Path, description = "School username")),
    responses(
        (status = 200, description = "School details", body = SchoolView),
        (status = 404, description = "School not found", body = ErrorResponse)
    ),
    tag = "Schools"
)]
#[instrument(skip(state))]
pub async fn get_school_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<SchoolView>, AppError> {
    Ok(Json(
        SchoolService::get_school_by_username(&state.db, username.trim()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}/classes",
    params(("id" = String, Path, description = "School ID")),
    responses(
        (status = 200, description = "Generated classes", body = Vec<Class>),
        (status = 404, description = "School not found", body = ErrorResponse)
    ),
    tag = "Schools"
)]
#[instrument(skip(state))]
pub async fn get_school_classes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Class>>, AppError> {
    let id: SchoolId = parse_id(&id, "school id")?;
    Ok(Json(SchoolService::list_classes(&state.db, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}/modules",
    params(("id" = String, Path, description = "School ID")),
    responses(
        (status = 200, description = "Generated modules", body = Vec<Module>),
        (status = 404, description = "School not found", body = ErrorResponse)
    ),
    tag = "Schools"
)]
#[instrument(skip(state))]
pub async fn get_school_modules(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Module>>, AppError> {
    let id: SchoolId = parse_id(&id, "school id")?;
    Ok(Json(SchoolService::list_modules(&state.db, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/schools/{id}/members",
    params(("id" = String, Path, description = "School ID")),
    responses(
        (status = 200, description = "Teachers, students and staff", body = SchoolMembersResponse),
        (status = 404, description = "School not found", body = ErrorResponse)
    ),
    tag = "Schools"
)]
#[instrument(skip(state))]
pub async fn get_school_members(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SchoolMembersResponse>, AppError> {
    let id: SchoolId = parse_id(&id, "school id")?;
    SchoolService::get_school(&state.db, id).await?;
    Ok(Json(MembershipService::list_members(&state.db, id).await?))
}
