use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::academics::controller::setup_academic_structure;
use crate::state::AppState;

use super::controller::{
    create_school, get_school, get_school_by_username, get_school_classes, get_school_members,
    get_school_modules,
};

pub fn init_schools_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_school))
        .route("/academic", post(setup_academic_structure))
        .route("/username/{username}", get(get_school_by_username))
        .route("/{id}", get(get_school))
        .route("/{id}/classes", get(get_school_classes))
        .route("/{id}/modules", get(get_school_modules))
        .route("/{id}/members", get(get_school_members))
}
