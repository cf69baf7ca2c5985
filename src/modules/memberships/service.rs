use sqlx::{PgConnection, PgPool};
use tracing::{debug, error, instrument, warn};

use schoolhub_core::AppError;
use schoolhub_models::{SchoolId, UserId};

use super::model::{
    NewMembership, SCHOOL_STAFF_COLUMNS, STUDENT_COLUMNS, SchoolMembersResponse,
    SchoolMembership, SchoolStaff, Student, TEACHER_COLUMNS, Teacher,
};

pub struct MembershipService;

impl MembershipService {
    /// Fails when the user already holds any role in the school.
    ///
    /// Each membership table is unique on `(user_id, school_id)` by itself;
    /// this check covers the three tables together. The user row is locked
    /// until the caller's transaction ends, so concurrent joins by the same
    /// user run one after the other and the later one sees the earlier row.
    #[instrument(skip(conn), fields(db.operation = "SELECT"))]
    pub async fn ensure_no_membership(
        conn: &mut PgConnection,
        user_id: UserId,
        school_id: SchoolId,
    ) -> Result<(), AppError> {
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!(error = %e, user.id = %user_id, "Database error locking user");
                AppError::from(e)
            })?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM teachers WHERE user_id = $1 AND school_id = $2
                UNION ALL
                SELECT 1 FROM students WHERE user_id = $1 AND school_id = $2
                UNION ALL
                SELECT 1 FROM school_staffs WHERE user_id = $1 AND school_id = $2
            )",
        )
        .bind(user_id)
        .bind(school_id)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error checking memberships");
            AppError::from(e)
        })?;

        if exists {
            warn!(user.id = %user_id, school.id = %school_id, "User already has a role in this school");
            return Err(AppError::bad_request(anyhow::anyhow!(
                "user already has a role in this school"
            )));
        }
        Ok(())
    }

    /// Inserts the membership row matching the variant.
    #[instrument(skip(conn, membership), fields(db.operation = "INSERT", membership.role = %membership.role()))]
    pub async fn create(
        conn: &mut PgConnection,
        membership: &NewMembership,
    ) -> Result<SchoolMembership, sqlx::Error> {
        let profile = membership.profile();
        debug!(user.id = %profile.user_id, school.id = %profile.school_id, "Creating membership");

        let created = match membership {
            NewMembership::Teacher(p) => SchoolMembership::Teacher(
                sqlx::query_as::<_, Teacher>(&format!(
                    "INSERT INTO teachers (user_id, school_id, email, name, phone, image, age, gender)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                     RETURNING {}",
                    TEACHER_COLUMNS
                ))
                .bind(p.user_id)
                .bind(p.school_id)
                .bind(&p.email)
                .bind(&p.name)
                .bind(&p.phone)
                .bind(&p.image)
                .bind(p.age)
                .bind(&p.gender)
                .fetch_one(conn)
                .await?,
            ),
            NewMembership::Student { profile: p, class_id } => SchoolMembership::Student(
                sqlx::query_as::<_, Student>(&format!(
                    "INSERT INTO students (user_id, school_id, class_id, email, name, phone, image, age, gender)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                     RETURNING {}",
                    STUDENT_COLUMNS
                ))
                .bind(p.user_id)
                .bind(p.school_id)
                .bind(*class_id)
                .bind(&p.email)
                .bind(&p.name)
                .bind(&p.phone)
                .bind(&p.image)
                .bind(p.age)
                .bind(&p.gender)
                .fetch_one(conn)
                .await?,
            ),
            NewMembership::SchoolStaff { profile: p, role } => SchoolMembership::SchoolStaff(
                sqlx::query_as::<_, SchoolStaff>(&format!(
                    "INSERT INTO school_staffs (user_id, school_id, role, email, name, phone, image, age, gender)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                     RETURNING {}",
                    SCHOOL_STAFF_COLUMNS
                ))
                .bind(p.user_id)
                .bind(p.school_id)
                .bind(role)
                .bind(&p.email)
                .bind(&p.name)
                .bind(&p.phone)
                .bind(&p.image)
                .bind(p.age)
                .bind(&p.gender)
                .fetch_one(conn)
                .await?,
            ),
        };

        Ok(created)
    }

    #[instrument(skip(db), fields(db.operation = "SELECT"))]
    pub async fn list_members(
        db: &PgPool,
        school_id: SchoolId,
    ) -> Result<SchoolMembersResponse, AppError> {
        let teachers_sql = format!(
            "SELECT {} FROM teachers WHERE school_id = $1 ORDER BY created_at",
            TEACHER_COLUMNS
        );
        let students_sql = format!(
            "SELECT {} FROM students WHERE school_id = $1 ORDER BY created_at",
            STUDENT_COLUMNS
        );
        let staffs_sql = format!(
            "SELECT {} FROM school_staffs WHERE school_id = $1 ORDER BY created_at",
            SCHOOL_STAFF_COLUMNS
        );

        let teachers = sqlx::query_as::<_, Teacher>(&teachers_sql)
            .bind(school_id)
            .fetch_all(db);
        let students = sqlx::query_as::<_, Student>(&students_sql)
            .bind(school_id)
            .fetch_all(db);
        let school_staffs = sqlx::query_as::<_, SchoolStaff>(&staffs_sql)
            .bind(school_id)
            .fetch_all(db);

        let (teachers, students, school_staffs) =
            tokio::try_join!(teachers, students, school_staffs).map_err(|e| {
                error!(error = %e, school.id = %school_id, "Database error listing members");
                AppError::from(e)
            })?;

        Ok(SchoolMembersResponse {
            teachers,
            students,
            school_staffs,
        })
    }
}
