use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};

use schoolhub_auth::create_access_token;
use schoolhub_config::JwtConfig;
use schoolhub_core::{AppError, hash_password, verify_password};

use crate::metrics;
use crate::modules::users::model::{USER_COLUMNS, User};
use crate::utils::db::unique_violation;

use super::model::{LoginRequest, LoginResponse, RegisterUserDto};

#[derive(sqlx::FromRow)]
struct UserWithPassword {
    #[sqlx(flatten)]
    user: User,
    password: Option<String>,
}

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto), fields(db.operation = "INSERT", db.table = "users"))]
    pub async fn register_user(db: &PgPool, dto: RegisterUserDto) -> Result<User, AppError> {
        let email = dto.email.trim().to_lowercase();
        debug!(user.email = %email, "Registering user");

        let hashed_password = hash_password(&dto.password)?;
        let role = dto.role.map(|r| r.as_str());

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, username, name, password, role, gender, age, address, phone, image)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&email)
        .bind(dto.username.trim())
        .bind(dto.name.trim())
        .bind(&hashed_password)
        .bind(role)
        .bind(&dto.gender)
        .bind(dto.age)
        .bind(&dto.address)
        .bind(&dto.phone)
        .bind(&dto.image)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let Some(constraint) = unique_violation(&e) {
                warn!(user.email = %email, constraint, "Duplicate registration");
                let field = if constraint.contains("username") {
                    "Username"
                } else {
                    "Email"
                };
                return AppError::bad_request(anyhow::anyhow!("{} already exists", field));
            }
            error!(error = %e, "Database error registering user");
            AppError::from(e)
        })?;

        metrics::track_user_registered(role.unwrap_or("NONE"));
        info!(user.id = %user.id, "User registered");
        Ok(user)
    }

    #[instrument(skip(db, dto, jwt_config), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let invalid = || AppError::unauthorized("Invalid email or password".to_string());

        let row = sqlx::query_as::<_, UserWithPassword>(&format!(
            "SELECT {}, password FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(dto.email.trim().to_lowercase())
        .fetch_optional(db)
        .await?;

        let Some(UserWithPassword { user, password: Some(hash) }) = row else {
            metrics::track_login(false);
            return Err(invalid());
        };

        if !verify_password(&dto.password, &hash)? {
            warn!(user.id = %user.id, "Login with wrong password");
            metrics::track_login(false);
            return Err(invalid());
        }

        let access_token = create_access_token(
            user.id.into_inner(),
            &user.email,
            user.role.as_deref(),
            user.current_school_id.map(|id| id.into_inner()),
            jwt_config,
        )?;

        metrics::track_login(true);
        info!(user.id = %user.id, "User logged in");
        Ok(LoginResponse { access_token, user })
    }
}
