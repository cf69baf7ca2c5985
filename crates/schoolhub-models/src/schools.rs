//! School models and DTOs.
//!
//! [`School`] is the full row including the hashed join codes and is only
//! used inside services. Everything that leaves the API goes through
//! [`SchoolView`], which reports whether a code is configured but never the
//! hash itself.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::academics::AcademicProfile;
use crate::ids::{SchoolId, UserId};
use crate::join_requests::validate_staff_role;
use crate::memberships::MembershipRole;

#[derive(Debug, Clone, FromRow)]
pub struct School {
    pub id: SchoolId,
    pub username: String,
    pub name: String,
    pub students_code: Option<String>,
    pub teachers_code: Option<String>,
    pub school_staffs_code: Option<String>,
    pub required_verification_to_join_by_code: bool,
    pub academic_profile: Option<Json<AcademicProfile>>,
    pub total_classes: i32,
    pub total_modules: i32,
    pub created_by: Option<UserId>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl School {
    /// Hash of the join code guarding the given membership role.
    pub fn join_code_hash(&self, role: MembershipRole) -> Option<&str> {
        match role {
            MembershipRole::Student => self.students_code.as_deref(),
            MembershipRole::Teacher => self.teachers_code.as_deref(),
            MembershipRole::SchoolStaff => self.school_staffs_code.as_deref(),
        }
    }
}

/// Public representation of a school.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SchoolView {
    pub id: SchoolId,
    pub username: String,
    pub name: String,
    pub has_students_code: bool,
    pub has_teachers_code: bool,
    pub has_school_staffs_code: bool,
    pub required_verification_to_join_by_code: bool,
    pub academic_profile: Option<AcademicProfile>,
    pub total_classes: i32,
    pub total_modules: i32,
    pub created_by: Option<UserId>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<School> for SchoolView {
    fn from(school: School) -> Self {
        Self {
            id: school.id,
            username: school.username,
            name: school.name,
            has_students_code: school.students_code.is_some(),
            has_teachers_code: school.teachers_code.is_some(),
            has_school_staffs_code: school.school_staffs_code.is_some(),
            required_verification_to_join_by_code: school.required_verification_to_join_by_code,
            academic_profile: school.academic_profile.map(|Json(profile)| profile),
            total_classes: school.total_classes,
            total_modules: school.total_modules,
            created_by: school.created_by,
            created_at: school.created_at,
            updated_at: school.updated_at,
        }
    }
}

/// Columns selected for [`School`].
pub const SCHOOL_COLUMNS: &str = "id, username, name, students_code, teachers_code, \
     school_staffs_code, required_verification_to_join_by_code, academic_profile, \
     total_classes, total_modules, created_by, created_at, updated_at";

/// A member of the school administration, seeded as a pending join request
/// when the school is created.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AdministrationContactDto {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
    #[validate(custom(function = "validate_staff_role"))]
    pub role: String,
}

/// Codes are stored trimmed, so the bounds apply to the trimmed value.
fn validate_join_code(code: &str) -> Result<(), ValidationError> {
    let len = code.trim().chars().count();
    if !(4..=64).contains(&len) {
        return Err(ValidationError::new("join_code")
            .with_message("join codes must be 4-64 characters, ignoring surrounding spaces".into()));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSchoolDto {
    #[validate(length(min = 3, max = 50, message = "username must be 3-50 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    #[validate(custom(function = "validate_join_code"))]
    pub students_code: Option<String>,
    #[validate(custom(function = "validate_join_code"))]
    pub teachers_code: Option<String>,
    #[validate(custom(function = "validate_join_code"))]
    pub school_staffs_code: Option<String>,
    #[serde(default)]
    pub required_verification_to_join_by_code: bool,
    #[serde(default)]
    #[validate(nested)]
    pub administration_contacts: Vec<AdministrationContactDto>,
}
