use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::modules::auth::router::init_auth_router;
use crate::modules::join_requests::router::{init_join_by_code_router, init_join_requests_router};
use crate::modules::schools::router::init_schools_router;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;

/// Applies the stricter limiter used for credentials and join codes.
fn limit_attempts(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    if !state.rate_limit_config.enabled {
        return router;
    }
    router.layer(GovernorLayer::new(Arc::new(
        state.rate_limit_config.join_governor_config(),
    )))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true)
}

pub fn init_router(state: AppState) -> Router {
    let mut api = Router::new()
        .nest("/auth", limit_attempts(init_auth_router(), &state))
        .nest("/users", init_users_router())
        .nest("/schools", init_schools_router())
        .nest(
            "/school-join-requests",
            init_join_requests_router()
                .merge(limit_attempts(init_join_by_code_router(), &state)),
        );

    if state.rate_limit_config.enabled {
        api = api.layer(GovernorLayer::new(Arc::new(
            state.rate_limit_config.general_governor_config(),
        )));
    }

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest("/api", api)
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}
