use anyhow::anyhow;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, error, info, instrument, warn};

use schoolhub_auth::create_membership_token;
use schoolhub_config::JwtConfig;
use schoolhub_core::{AppError, verify_code};
use schoolhub_models::{ClassId, JoinRequestId, SchoolId, UserId, UserRole};

use crate::metrics;
use crate::modules::memberships::model::{
    MembershipProfile, MembershipRole, NewMembership, SchoolMembership,
};
use crate::modules::memberships::service::MembershipService;
use crate::modules::schools::service::SchoolService;
use crate::modules::users::model::User;
use crate::modules::users::service::UserService;
use crate::utils::db::unique_violation;

use super::model::{
    AcceptJoinRequestResponse, CreateJoinRequestDto, JOIN_REQUEST_COLUMNS, JoinByCodeResponse,
    JoinRequest, JoinRequestFilterParams, JoinRole, JoinSchoolByCodeDto,
    StaffRole, UpdateJoinRequestDto,
};

/// A request about to be stored as pending.
#[derive(Debug, Clone)]
pub struct PendingJoinRequest {
    pub school_id: SchoolId,
    pub user_id: Option<UserId>,
    pub role: JoinRole,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub class_id: Option<ClassId>,
    /// `false` for requests seeded by the school
    pub from_user: bool,
}

impl PendingJoinRequest {
    /// A self-submitted request on behalf of an existing account.
    fn for_user(user: &User, school_id: SchoolId, role: JoinRole) -> Self {
        Self {
            school_id,
            user_id: Some(user.id),
            role,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            class_id: None,
            from_user: true,
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn membership_error(e: sqlx::Error) -> AppError {
    match unique_violation(&e) {
        Some("") => AppError::bad_request(anyhow!("user already has a role in this school")),
        Some(constraint) => {
            warn!(constraint, "Membership unique constraint violated");
            AppError::bad_request(anyhow!(
                "user already has a role in this school ({})",
                constraint
            ))
        }
        None => {
            error!(error = %e, "Database error while creating membership");
            AppError::bad_request(anyhow!("{}", e))
        }
    }
}

fn issue_token(membership: &SchoolMembership, jwt_config: &JwtConfig) -> Result<String, AppError> {
    create_membership_token(&membership.claims(), jwt_config)
}

pub struct JoinRequestService;

impl JoinRequestService {
    /// Stores a pending request.
    ///
    /// A pending self-submitted request for the same email and school is
    /// replaced; requests seeded by the school are left alone, so a clash with
    /// one of those is reported as a duplicate.
    #[instrument(skip(conn, request), fields(school.id = %request.school_id, db.table = "school_join_requests"))]
    pub async fn submit(
        conn: &mut PgConnection,
        request: &PendingJoinRequest,
    ) -> Result<JoinRequest, AppError> {
        let email = normalize_email(&request.email);

        if request.from_user {
            let replaced = sqlx::query(
                "DELETE FROM school_join_requests
                 WHERE email = $1 AND school_id = $2 AND status = 'pending' AND from_user",
            )
            .bind(&email)
            .bind(request.school_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                error!(error = %e, "Database error replacing join request");
                AppError::from(e)
            })?
            .rows_affected();

            if replaced > 0 {
                debug!(join_request.email = %email, "Replaced previous pending request");
            }
        }

        sqlx::query_as::<_, JoinRequest>(&format!(
            "INSERT INTO school_join_requests
                (school_id, user_id, role, name, email, phone, class_id, from_user, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
             RETURNING {}",
            JOIN_REQUEST_COLUMNS
        ))
        .bind(request.school_id)
        .bind(request.user_id)
        .bind(request.role.as_str())
        .bind(request.name.trim())
        .bind(&email)
        .bind(&request.phone)
        .bind(request.class_id)
        .bind(request.from_user)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if unique_violation(&e).is_some() {
                warn!(join_request.email = %email, "Join request already exists for this school");
                return AppError::bad_request(anyhow!(
                    "A join request for {} already exists in this school",
                    email
                ));
            }
            error!(error = %e, "Database error inserting join request");
            AppError::from(e)
        })
    }

    #[instrument(skip(db, dto), fields(school.id = %dto.school_id, db.operation = "INSERT", db.table = "school_join_requests"))]
    pub async fn create(db: &PgPool, dto: CreateJoinRequestDto) -> Result<JoinRequest, AppError> {
        let role = JoinRole::parse(&dto.role)
            .ok_or_else(|| AppError::bad_request(anyhow!("Unknown role: {}", dto.role)))?;

        let mut tx = db.begin().await?;

        if !SchoolService::exists(&mut tx, dto.school_id).await? {
            return Err(AppError::not_found(anyhow!("School not found")));
        }

        let class_id = match (role, dto.class_id) {
            (JoinRole::Student, Some(class_id)) => {
                SchoolService::ensure_class_in_school(&mut tx, dto.school_id, class_id).await?;
                Some(class_id)
            }
            _ => None,
        };

        let account = UserService::find_by_email(&mut tx, &dto.email).await?;
        let name = match (&account, dto.name) {
            (Some(user), _) => user.name.clone(),
            (None, Some(name)) => name,
            (None, None) => {
                return Err(AppError::bad_request(anyhow!(
                    "name is required when no account exists for this email"
                )));
            }
        };

        let request = Self::submit(
            &mut tx,
            &PendingJoinRequest {
                school_id: dto.school_id,
                user_id: account.as_ref().map(|u| u.id),
                role,
                name,
                email: dto.email,
                phone: dto.phone,
                class_id,
                from_user: true,
            },
        )
        .await?;

        tx.commit().await?;

        metrics::track_join_request_created("user");
        info!(join_request.id = %request.id, role = %request.role, "Join request created");
        Ok(request)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "school_join_requests"))]
    pub async fn find_all(
        db: &PgPool,
        filters: JoinRequestFilterParams,
    ) -> Result<Vec<JoinRequest>, AppError> {
        sqlx::query_as::<_, JoinRequest>(&format!(
            "SELECT {} FROM school_join_requests
             WHERE ($1::uuid IS NULL OR school_id = $1)
               AND ($2::uuid IS NULL OR user_id = $2)
               AND ($3::text IS NULL OR email = $3)
               AND ($4::text IS NULL OR status = $4)
             ORDER BY created_at DESC",
            JOIN_REQUEST_COLUMNS
        ))
        .bind(filters.school_id)
        .bind(filters.user_id)
        .bind(filters.email.as_deref().map(normalize_email))
        .bind(filters.status.map(|s| s.as_str()))
        .fetch_all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Database error listing join requests");
            AppError::from(e)
        })
    }

    pub async fn find_by_school(
        db: &PgPool,
        school_id: SchoolId,
    ) -> Result<Vec<JoinRequest>, AppError> {
        Self::find_all(
            db,
            JoinRequestFilterParams {
                school_id: Some(school_id),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Vec<JoinRequest>, AppError> {
        Self::find_all(
            db,
            JoinRequestFilterParams {
                email: Some(email.to_string()),
                ..Default::default()
            },
        )
        .await
    }

    async fn find_by_id(db: &PgPool, id: JoinRequestId) -> Result<Option<JoinRequest>, AppError> {
        sqlx::query_as::<_, JoinRequest>(&format!(
            "SELECT {} FROM school_join_requests WHERE id = $1",
            JOIN_REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            error!(error = %e, join_request.id = %id, "Database error fetching join request");
            AppError::from(e)
        })
    }

    #[instrument(skip(db), fields(db.operation = "SELECT", db.table = "school_join_requests"))]
    pub async fn find_one(db: &PgPool, id: JoinRequestId) -> Result<JoinRequest, AppError> {
        Self::find_by_id(db, id).await?.ok_or_else(|| {
            warn!(join_request.id = %id, "Join request not found");
            AppError::not_found(anyhow!("Join request not found"))
        })
    }

    /// Edits a pending request. Status, user and school never change here.
    #[instrument(skip(db, dto), fields(db.operation = "UPDATE", db.table = "school_join_requests"))]
    pub async fn update(
        db: &PgPool,
        id: JoinRequestId,
        dto: UpdateJoinRequestDto,
    ) -> Result<JoinRequest, AppError> {
        let existing = Self::find_one(db, id).await?;
        if !existing.is_pending() {
            return Err(AppError::bad_request(anyhow!(
                "Only pending join requests can be edited (current status: {})",
                existing.status
            )));
        }

        let role = dto.role.as_deref().map(|r| {
            JoinRole::parse(r).ok_or_else(|| AppError::bad_request(anyhow!("Unknown role: {}", r)))
        });
        let role = role.transpose()?;

        if let Some(class_id) = dto.class_id {
            let mut conn = db.acquire().await?;
            SchoolService::ensure_class_in_school(&mut conn, existing.school_id, class_id).await?;
        }

        let updated = sqlx::query_as::<_, JoinRequest>(&format!(
            "UPDATE school_join_requests SET
                role = COALESCE($2, role),
                name = COALESCE($3, name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                class_id = COALESCE($6, class_id),
                updated_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING {}",
            JOIN_REQUEST_COLUMNS
        ))
        .bind(id)
        .bind(role.map(|r| r.as_str()))
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.email.as_deref().map(normalize_email))
        .bind(&dto.phone)
        .bind(dto.class_id)
        .fetch_optional(db)
        .await
        .map_err(|e| {
            if unique_violation(&e).is_some() {
                return AppError::bad_request(anyhow!(
                    "A join request for this email already exists in this school"
                ));
            }
            error!(error = %e, join_request.id = %id, "Database error updating join request");
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::bad_request(anyhow!("Join request is no longer pending")))?;

        info!(join_request.id = %id, "Join request updated");
        Ok(updated)
    }

    #[instrument(skip(db), fields(db.operation = "DELETE", db.table = "school_join_requests"))]
    pub async fn remove(db: &PgPool, id: JoinRequestId) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM school_join_requests WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .map_err(|e| {
                error!(error = %e, join_request.id = %id, "Database error deleting join request");
                AppError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Join request not found")));
        }

        info!(join_request.id = %id, "Join request removed");
        Ok(())
    }

    #[instrument(skip(db), fields(db.operation = "UPDATE", db.table = "school_join_requests"))]
    pub async fn reject(db: &PgPool, id: JoinRequestId) -> Result<JoinRequest, AppError> {
        let request = Self::find_one(db, id).await?;
        if !request.is_pending() {
            warn!(join_request.id = %id, status = %request.status, "Rejecting a resolved request");
            return Err(AppError::bad_request(anyhow!(
                "Join request has already been {}",
                request.status
            )));
        }

        let rejected = sqlx::query_as::<_, JoinRequest>(&format!(
            "UPDATE school_join_requests SET status = 'rejected', updated_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING {}",
            JOIN_REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::bad_request(anyhow!("Join request is no longer pending")))?;

        metrics::track_join_request_resolved("rejected");
        info!(join_request.id = %id, "Join request rejected");
        Ok(rejected)
    }

    /// Accepts a pending request on behalf of the person it names.
    ///
    /// The membership insert, the status flip and the user's current school
    /// are written in one transaction. The membership token is signed after
    /// commit.
    #[instrument(skip(db, jwt_config), fields(db.operation = "TRANSACTION", db.table = "school_join_requests"))]
    pub async fn accept(
        db: &PgPool,
        jwt_config: &JwtConfig,
        id: JoinRequestId,
        acting_user_id: UserId,
    ) -> Result<AcceptJoinRequestResponse, AppError> {
        let (request, user) = tokio::try_join!(
            Self::find_by_id(db, id),
            UserService::find_by_id(db, acting_user_id)
        )?;

        let request = request.ok_or_else(|| {
            warn!(join_request.id = %id, "Accepting a missing join request");
            AppError::not_found(anyhow!("Join request not found"))
        })?;
        let user = user.ok_or_else(|| {
            warn!(user.id = %acting_user_id, "Acting user no longer exists");
            AppError::bad_request(anyhow!("User not found"))
        })?;

        if request.school_id.is_nil() {
            error!(join_request.id = %id, "Join request has no valid school id");
            return Err(AppError::bad_request(anyhow!(
                "Invalid school id on join request"
            )));
        }

        if !request.is_pending() {
            warn!(join_request.id = %id, status = %request.status, "Accepting a resolved request");
            return Err(AppError::bad_request(anyhow!(
                "Join request has already been {}",
                request.status
            )));
        }

        if normalize_email(&user.email) != normalize_email(&request.email) {
            warn!(join_request.id = %id, user.id = %user.id, "Join request belongs to someone else");
            return Err(AppError::bad_request(anyhow!(
                "This join request does not belong to you"
            )));
        }

        let profile = MembershipProfile::from_user(&user, request.school_id);
        let new_membership = match request.join_role() {
            Some(JoinRole::Teacher) => NewMembership::Teacher(profile),
            Some(JoinRole::Student) => NewMembership::Student {
                profile,
                class_id: request.class_id,
            },
            Some(JoinRole::Staff(role)) => NewMembership::SchoolStaff {
                profile,
                role: role.as_str().to_string(),
            },
            None => {
                warn!(join_request.id = %id, role = %request.role, "Unknown role on join request");
                return Err(AppError::bad_request(anyhow!("Unknown role: {}", request.role)));
            }
        };

        let mut tx = db.begin().await?;

        MembershipService::ensure_no_membership(&mut tx, user.id, request.school_id).await?;

        let membership = MembershipService::create(&mut tx, &new_membership)
            .await
            .map_err(membership_error)?;

        let accepted = sqlx::query_as::<_, JoinRequest>(&format!(
            "UPDATE school_join_requests SET status = 'accepted', user_id = $2, updated_at = NOW()
             WHERE id = $1 AND status = 'pending'
             RETURNING {}",
            JOIN_REQUEST_COLUMNS
        ))
        .bind(id)
        .bind(user.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::bad_request(anyhow!("{}", e)))?
        .ok_or_else(|| AppError::bad_request(anyhow!("Join request is no longer pending")))?;

        UserService::set_current_school(&mut tx, user.id, request.school_id)
            .await
            .map_err(|e| AppError::bad_request(anyhow!("{}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::bad_request(anyhow!("{}", e)))?;

        let token = issue_token(&membership, jwt_config)?;

        metrics::track_join_request_resolved("accepted");
        info!(
            join_request.id = %id,
            user.id = %user.id,
            school.id = %request.school_id,
            membership.role = %membership.role(),
            "Join request accepted"
        );

        Ok(AcceptJoinRequestResponse {
            token,
            accepted_request: accepted,
        })
    }

    /// Joins a school with its username and the join code for the caller's
    /// account role.
    ///
    /// Students and teachers join at once unless the school asks for
    /// verification, in which case a pending request is stored instead. Staff
    /// always go through a pending request.
    #[instrument(skip(db, jwt_config, dto), fields(school.username = %dto.username))]
    pub async fn join_by_code(
        db: &PgPool,
        jwt_config: &JwtConfig,
        acting_user_id: UserId,
        dto: JoinSchoolByCodeDto,
    ) -> Result<JoinByCodeResponse, AppError> {
        let username = dto.username.trim();
        let (school, user) = tokio::try_join!(
            SchoolService::find_by_username(db, username),
            UserService::find_by_id(db, acting_user_id)
        )?;

        let school = school.ok_or_else(|| {
            warn!("Join by code for unknown school");
            AppError::bad_request(anyhow!("School with username {} not found", username))
        })?;
        let user = user.ok_or_else(|| AppError::bad_request(anyhow!("User not found")))?;

        let role = match user.declared_role() {
            Some(UserRole::Student) => MembershipRole::Student,
            Some(UserRole::Teacher) => MembershipRole::Teacher,
            Some(UserRole::SchoolStaff) => MembershipRole::SchoolStaff,
            _ => {
                warn!(user.id = %user.id, role = ?user.role, "Join by code with unsupported role");
                return Err(AppError::bad_request(anyhow!("Invalid role")));
            }
        };

        let hash = school.join_code_hash(role).ok_or_else(|| {
            AppError::bad_request(anyhow!(
                "School {} does not accept {} join codes",
                school.name,
                role
            ))
        })?;

        if !verify_code(&dto.code, hash)? {
            warn!(user.id = %user.id, school.id = %school.id, "Invalid join code");
            metrics::track_join_by_code(role.as_str(), "invalid_code");
            return Err(AppError::bad_request(anyhow!("Invalid code")));
        }

        let mut tx = db.begin().await?;
        MembershipService::ensure_no_membership(&mut tx, user.id, school.id).await?;

        let join_role = match role {
            MembershipRole::Student => JoinRole::Student,
            MembershipRole::Teacher => JoinRole::Teacher,
            MembershipRole::SchoolStaff => {
                let staff_role = dto
                    .staff_role
                    .as_deref()
                    .and_then(StaffRole::parse)
                    .ok_or_else(|| {
                        AppError::bad_request(anyhow!("staff_role is required for school staff"))
                    })?;
                JoinRole::Staff(staff_role)
            }
        };

        if role == MembershipRole::SchoolStaff || school.required_verification_to_join_by_code {
            let request = Self::submit(
                &mut tx,
                &PendingJoinRequest::for_user(&user, school.id, join_role),
            )
            .await?;
            tx.commit().await?;

            metrics::track_join_request_created("join_code");
            metrics::track_join_by_code(role.as_str(), "pending");
            info!(join_request.id = %request.id, school.id = %school.id, "Join code accepted, awaiting verification");
            return Ok(JoinByCodeResponse::PendingVerification {
                join_request: request,
            });
        }

        let profile = MembershipProfile::from_user(&user, school.id);
        let new_membership = match role {
            MembershipRole::Teacher => NewMembership::Teacher(profile),
            _ => NewMembership::Student {
                profile,
                class_id: None,
            },
        };

        let membership = MembershipService::create(&mut tx, &new_membership)
            .await
            .map_err(membership_error)?;
        tx.commit().await?;

        let token = issue_token(&membership, jwt_config)?;

        metrics::track_join_by_code(role.as_str(), "joined");
        info!(user.id = %user.id, school.id = %school.id, membership.role = %role, "Joined school by code");
        Ok(JoinByCodeResponse::Joined { token, membership })
    }
}
