use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

use super::controller::{
    accept_join_request, create_join_request, delete_join_request, get_join_request,
    get_join_requests, get_join_requests_by_email, get_join_requests_by_school,
    join_school_by_code, reject_join_request, update_join_request,
};

pub fn init_join_requests_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_join_request).get(get_join_requests))
        .route("/school/{school_id}", get(get_join_requests_by_school))
        .route("/email/{email}", get(get_join_requests_by_email))
        .route(
            "/{id}",
            get(get_join_request)
                .patch(update_join_request)
                .delete(delete_join_request),
        )
        .route("/{id}/accept", patch(accept_join_request))
        .route("/{id}/reject", patch(reject_join_request))
}

/// The join-by-code route, kept apart so it can carry a stricter rate limit.
pub fn init_join_by_code_router() -> Router<AppState> {
    Router::new().route("/join", post(join_school_by_code))
}
