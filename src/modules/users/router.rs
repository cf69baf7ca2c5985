use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::get_me;

pub fn init_users_router() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}
