use sqlx::PgPool;

use schoolhub_config::{AcademicConfig, CorsConfig, JwtConfig, RateLimitConfig};
use schoolhub_db::init_db_pool;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub academic_config: AcademicConfig,
}

impl AppState {
    /// State for a given pool with every other setting read from the environment.
    pub fn from_env(db: PgPool) -> Self {
        Self {
            db,
            jwt_config: JwtConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            rate_limit_config: RateLimitConfig::from_env(),
            academic_config: AcademicConfig::from_env(),
        }
    }
}

pub async fn init_app_state() -> AppState {
    AppState::from_env(init_db_pool().await)
}
