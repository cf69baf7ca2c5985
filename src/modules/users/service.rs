use sqlx::{PgConnection, PgPool};
use tracing::{debug, error, instrument, warn};

use schoolhub_core::AppError;

use super::model::{USER_COLUMNS, User};
use schoolhub_models::{SchoolId, UserId};

pub struct UserService;

impl UserService {
    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn find_by_id(db: &PgPool, id: UserId) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(db)
            .await
            .map_err(|e| {
                error!(error = %e, user.id = %id, "Database error fetching user");
                AppError::from(e)
            })
    }

    /// Emails are stored lower-cased, so the lookup lower-cases too.
    #[instrument(skip(conn), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn find_by_email(
        conn: &mut PgConnection,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching user by email");
            AppError::from(e)
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn get_profile(db: &PgPool, id: UserId) -> Result<User, AppError> {
        Self::find_by_id(db, id).await?.ok_or_else(|| {
            warn!(user.id = %id, "Profile requested for missing user");
            AppError::not_found(anyhow::anyhow!("User not found"))
        })
    }

    /// Points the user at the school they most recently joined.
    #[instrument(skip(conn), fields(db.operation = "UPDATE", db.table = "users"))]
    pub async fn set_current_school(
        conn: &mut PgConnection,
        user_id: UserId,
        school_id: SchoolId,
    ) -> Result<(), sqlx::Error> {
        debug!(user.id = %user_id, school.id = %school_id, "Updating current school");
        sqlx::query("UPDATE users SET current_school_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(school_id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
