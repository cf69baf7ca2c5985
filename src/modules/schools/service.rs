use anyhow::anyhow;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, error, info, instrument, warn};

use schoolhub_core::{AppError, hash_code};
use schoolhub_models::academics::{CLASS_COLUMNS, Class, MODULE_COLUMNS, Module};
use schoolhub_models::{ClassId, JoinRole, SchoolId, UserId};

use crate::metrics;
use crate::modules::join_requests::service::{JoinRequestService, PendingJoinRequest};
use crate::modules::users::service::UserService;
use crate::utils::db::unique_violation;

use super::model::{CreateSchoolDto, SCHOOL_COLUMNS, School, SchoolView};

fn hash_optional(code: Option<&str>) -> Result<Option<String>, AppError> {
    code.map(hash_code).transpose()
}

pub struct SchoolService;

impl SchoolService {
    /// Creates the school and seeds its administration contacts as pending
    /// join requests, all in one transaction.
    #[instrument(skip(db, dto), fields(school.username = %dto.username, db.operation = "INSERT", db.table = "schools"))]
    pub async fn create_school(
        db: &PgPool,
        created_by: UserId,
        dto: CreateSchoolDto,
    ) -> Result<SchoolView, AppError> {
        debug!(contacts = dto.administration_contacts.len(), "Creating school");

        let students_code = hash_optional(dto.students_code.as_deref())?;
        let teachers_code = hash_optional(dto.teachers_code.as_deref())?;
        let school_staffs_code = hash_optional(dto.school_staffs_code.as_deref())?;

        let mut tx = db.begin().await?;

        let school = sqlx::query_as::<_, School>(&format!(
            "INSERT INTO schools
                (username, name, students_code, teachers_code, school_staffs_code,
                 required_verification_to_join_by_code, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            SCHOOL_COLUMNS
        ))
        .bind(dto.username.trim())
        .bind(dto.name.trim())
        .bind(students_code)
        .bind(teachers_code)
        .bind(school_staffs_code)
        .bind(dto.required_verification_to_join_by_code)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if unique_violation(&e).is_some() {
                warn!("Attempted to create school with existing username");
                return AppError::bad_request(anyhow!("School username already exists"));
            }
            error!(error = %e, "Database error creating school");
            AppError::from(e)
        })?;

        for contact in dto.administration_contacts {
            let role = JoinRole::parse(&contact.role)
                .ok_or_else(|| AppError::bad_request(anyhow!("Unknown role: {}", contact.role)))?;
            let account = UserService::find_by_email(&mut tx, &contact.email).await?;

            JoinRequestService::submit(
                &mut tx,
                &PendingJoinRequest {
                    school_id: school.id,
                    user_id: account.map(|u| u.id),
                    role,
                    name: contact.name,
                    email: contact.email,
                    phone: contact.phone,
                    class_id: None,
                    from_user: false,
                },
            )
            .await?;
            metrics::track_join_request_created("administration");
        }

        tx.commit().await?;

        metrics::track_school_created();
        info!(school.id = %school.id, "School created");
        Ok(school.into())
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "schools"))]
    pub async fn find_by_id(db: &PgPool, id: SchoolId) -> Result<Option<School>, AppError> {
        sqlx::query_as::<_, School>(&format!(
            "SELECT {} FROM schools WHERE id = $1",
            SCHOOL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(error = %e, school.id = %id, "Database error fetching school");
            AppError::from(e)
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "schools"))]
    pub async fn find_by_username(
        db: &PgPool,
        username: &str,
    ) -> Result<Option<School>, AppError> {
        sqlx::query_as::<_, School>(&format!(
            "SELECT {} FROM schools WHERE username = $1",
            SCHOOL_COLUMNS
        ))
        .bind(username)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error fetching school by username");
            AppError::from(e)
        })
    }

    pub async fn get_school(db: &PgPool, id: SchoolId) -> Result<SchoolView, AppError> {
        Self::find_by_id(db, id)
            .await?
            .map(SchoolView::from)
            .ok_or_else(|| AppError::not_found(anyhow!("School not found")))
    }

    pub async fn get_school_by_username(
        db: &PgPool,
        username: &str,
    ) -> Result<SchoolView, AppError> {
        Self::find_by_username(db, username)
            .await?
            .map(SchoolView::from)
            .ok_or_else(|| AppError::not_found(anyhow!("School not found")))
    }

    pub async fn exists(conn: &mut PgConnection, id: SchoolId) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM schools WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await
            .map_err(AppError::from)
    }

    /// Fails with 400 unless the class belongs to the school.
    pub async fn ensure_class_in_school(
        conn: &mut PgConnection,
        school_id: SchoolId,
        class_id: ClassId,
    ) -> Result<(), AppError> {
        let belongs = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM classes WHERE id = $1 AND school_id = $2)",
        )
        .bind(class_id)
        .bind(school_id)
        .fetch_one(conn)
        .await?;

        if !belongs {
            return Err(AppError::bad_request(anyhow!(
                "Class {} does not belong to this school",
                class_id
            )));
        }
        Ok(())
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "classes"))]
    pub async fn list_classes(db: &PgPool, school_id: SchoolId) -> Result<Vec<Class>, AppError> {
        Self::get_school(db, school_id).await?;
        sqlx::query_as::<_, Class>(&format!(
            "SELECT {} FROM classes WHERE school_id = $1 ORDER BY created_at, name",
            CLASS_COLUMNS
        ))
        .bind(school_id)
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, school.id = %school_id, "Database error listing classes");
            AppError::from(e)
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "modules"))]
    pub async fn list_modules(db: &PgPool, school_id: SchoolId) -> Result<Vec<Module>, AppError> {
        Self::get_school(db, school_id).await?;
        sqlx::query_as::<_, Module>(&format!(
            "SELECT {} FROM modules WHERE school_id = $1 ORDER BY created_at, name",
            MODULE_COLUMNS
        ))
        .bind(school_id)
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, school.id = %school_id, "Database error listing modules");
            AppError::from(e)
        })
    }
}
