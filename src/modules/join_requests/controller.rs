use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use tracing::instrument;

use schoolhub_core::AppError;
use schoolhub_models::{JoinRequestId, SchoolId};

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::utils::ids::parse_id;
use crate::validator::ValidatedJson;

use super::model::{
    AcceptJoinRequestResponse, CreateJoinRequestDto, JoinByCodeResponse, JoinRequest,
    JoinRequestFilterParams, JoinSchoolByCodeDto, UpdateJoinRequestDto,
};
use super::service::JoinRequestService;

#[utoipa::path(
    post,
    path = "/api/school-join-requests",
    request_body = CreateJoinRequestDto,
    responses(
        (status = 201, description = "Join request created", body = JoinRequest),
        (status = 400, description = "Duplicate request or missing name", body = ErrorResponse),
        (status = 404, description = "School not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Join Requests"
)]
#[instrument(skip(state, dto))]
pub async fn create_join_request(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<CreateJoinRequestDto>,
) -> Result<(StatusCode, Json<JoinRequest>), AppError> {
    let request = JoinRequestService::create(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/school-join-requests",
    params(JoinRequestFilterParams),
    responses(
        (status = 200, description = "Matching join requests", body = Vec<JoinRequest>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse)
    ),
    tag = "Join Requests"
)]
#[instrument(skip(state, filters))]
pub async fn get_join_requests(
    State(state): State<AppState>,
    filters: Result<Query<JoinRequestFilterParams>, QueryRejection>,
) -> Result<Json<Vec<JoinRequest>>, AppError> {
    let Query(filters) = filters
        .map_err(|e| AppError::bad_request(anyhow::anyhow!("Invalid query parameters: {}", e)))?;
    let requests = JoinRequestService::find_all(&state.db, filters).await?;
    Ok(Json(requests))
}

#[utoipa::path(
    get,
    path = "/api/school-join-requests/school/{school_id}",
    params(("school_id" = String, Path, description = "School ID")),
    responses(
        (status = 200, description = "Join requests of the school", body = Vec<JoinRequest>),
        (status = 400, description = "Malformed school id", body = ErrorResponse)
    ),
    tag = "Join Requests"
)]
#[instrument(skip(state))]
pub async fn get_join_requests_by_school(
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Json<Vec<JoinRequest>>, AppError> {
    let school_id: SchoolId = parse_id(&school_id, "school id")?;
    let requests = JoinRequestService::find_by_school(&state.db, school_id).await?;
    Ok(Json(requests))
}

#[utoipa::path(
    get,
    path = "/api/school-join-requests/email/{email}",
    params(("email" = String, Path, description = "Contact email")),
    responses(
        (status = 200, description = "Join requests for the email", body = Vec<JoinRequest>)
    ),
    tag = "Join Requests"
)]
#[instrument(skip(state))]
pub async fn get_join_requests_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<JoinRequest>>, AppError> {
    let requests = JoinRequestService::find_by_email(&state.db, &email).await?;
    Ok(Json(requests))
}

#[utoipa::path(
    get,
    path = "/api/school-join-requests/{id}",
    params(("id" = String, Path, description = "Join request ID")),
    responses(
        (status = 200, description = "Join request", body = JoinRequest),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Join request not found", body = ErrorResponse)
    ),
    tag = "Join Requests"
)]
#[instrument(skip(state))]
pub async fn get_join_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JoinRequest>, AppError> {
    let id: JoinRequestId = parse_id(&id, "join request id")?;
    let request = JoinRequestService::find_one(&state.db, id).await?;
    Ok(Json(request))
}

#[utoipa::path(
    patch,
    path = "/api/school-join-requests/{id}",
    params(("id" = String, Path, description = "Join request ID")),
    request_body = UpdateJoinRequestDto,
    responses(
        (status = 200, description = "Join request updated", body = JoinRequest),
        (status = 400, description = "Malformed id or request not pending", body = ErrorResponse),
        (status = 404, description = "Join request not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Join Requests"
)]
#[instrument(skip(state, dto))]
pub async fn update_join_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateJoinRequestDto>,
) -> Result<Json<JoinRequest>, AppError> {
    let id: JoinRequestId = parse_id(&id, "join request id")?;
    let request = JoinRequestService::update(&state.db, id, dto).await?;
    Ok(Json(request))
}

#[utoipa::path(
    delete,
    path = "/api/school-join-requests/{id}",
    params(("id" = String, Path, description = "Join request ID")),
    responses(
        (status = 204, description = "Join request removed"),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 404, description = "Join request not found", body = ErrorResponse)
    ),
    tag = "Join Requests"
)]
#[instrument(skip(state))]
pub async fn delete_join_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id: JoinRequestId = parse_id(&id, "join request id")?;
    JoinRequestService::remove(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/school-join-requests/{id}/accept",
    params(("id" = String, Path, description = "Join request ID")),
    responses(
        (status = 200, description = "Membership created", body = AcceptJoinRequestResponse),
        (status = 400, description = "Not pending, not yours, unknown role or already a member", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Join request not found", body = ErrorResponse)
    ),
    tag = "Join Requests",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn accept_join_request(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AcceptJoinRequestResponse>, AppError> {
    let acting_user_id = auth_user.user_id()?;
    let id: JoinRequestId = parse_id(&id, "join request id")?;
    let response =
        JoinRequestService::accept(&state.db, &state.jwt_config, id, acting_user_id).await?;
    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/api/school-join-requests/{id}/reject",
    params(("id" = String, Path, description = "Join request ID")),
    responses(
        (status = 200, description = "Join request rejected", body = JoinRequest),
        (status = 400, description = "Malformed id or not pending", body = ErrorResponse),
        (status = 404, description = "Join request not found", body = ErrorResponse)
    ),
    tag = "Join Requests"
)]
#[instrument(skip(state))]
pub async fn reject_join_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JoinRequest>, AppError> {
    let id: JoinRequestId = parse_id(&id, "join request id")?;
    let request = JoinRequestService::reject(&state.db, id).await?;
    Ok(Json(request))
}

#[utoipa::path(
    post,
    path = "/api/school-join-requests/join",
    request_body = JoinSchoolByCodeDto,
    responses(
        (status = 200, description = "Joined, or waiting for verification", body = JoinByCodeResponse),
        (status = 400, description = "Unknown school, invalid code or invalid role", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Join Requests",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn join_school_by_code(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<JoinSchoolByCodeDto>,
) -> Result<Json<JoinByCodeResponse>, AppError> {
    let response =
        JoinRequestService::join_by_code(&state.db, &state.jwt_config, auth_user.user_id()?, dto)
            .await?;
    Ok(Json(response))
}
