//! School join request models and DTOs.
//!
//! A join request is a pending application for a person to be granted a role
//! in a school. The requested role is kept as free text in the database and
//! parsed into a [`JoinRole`] whenever it has to be acted on.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::UnknownVariant;
use crate::ids::{ClassId, JoinRequestId, SchoolId, UserId};
use crate::memberships::SchoolMembership;

/// Staff roles a school can grant. Stored verbatim on staff memberships.
pub const STAFF_ROLES: &[&str] = &[
    "Headmaster",
    "Deputy Headmaster",
    "Director of Studies",
    "Director of Discipline",
    "Bursar",
    "Accountant",
    "Secretary",
    "Librarian",
    "Patron",
    "Matron",
    "Lab Technician",
    "Nurse",
    "Storekeeper",
];

/// A role from [`STAFF_ROLES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaffRole(&'static str);

impl StaffRole {
    /// Exact, case-sensitive match against the vocabulary.
    pub fn parse(role: &str) -> Option<Self> {
        STAFF_ROLES.iter().find(|r| **r == role).map(|r| Self(r))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// The role a join request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRole {
    Student,
    Teacher,
    Staff(StaffRole),
}

impl JoinRole {
    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "STUDENT" => Some(Self::Student),
            "TEACHER" => Some(Self::Teacher),
            other => StaffRole::parse(other).map(Self::Staff),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Teacher => "TEACHER",
            Self::Staff(role) => role.as_str(),
        }
    }
}

fn validate_join_role(role: &str) -> Result<(), ValidationError> {
    if JoinRole::parse(role).is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("join_role")
            .with_message("role must be STUDENT, TEACHER or a school staff role".into()))
    }
}

pub(crate) fn validate_staff_role(role: &str) -> Result<(), ValidationError> {
    if StaffRole::parse(role).is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("staff_role")
            .with_message("must be one of the school staff roles".into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JoinRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl JoinRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for JoinRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinRequestStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(UnknownVariant::new("join request status", other)),
        }
    }
}

impl TryFrom<String> for JoinRequestStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct JoinRequest {
    pub id: JoinRequestId,
    pub school_id: SchoolId,
    pub user_id: Option<UserId>,
    pub role: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub class_id: Option<ClassId>,
    /// `true` when submitted by the requester, `false` when seeded by the school
    pub from_user: bool,
    #[sqlx(try_from = "String")]
    pub status: JoinRequestStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl JoinRequest {
    pub fn is_pending(&self) -> bool {
        self.status == JoinRequestStatus::Pending
    }

    pub fn join_role(&self) -> Option<JoinRole> {
        JoinRole::parse(&self.role)
    }
}

/// Columns selected for [`JoinRequest`].
pub const JOIN_REQUEST_COLUMNS: &str = "id, school_id, user_id, role, name, email, phone, \
     class_id, from_user, status, created_at, updated_at";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateJoinRequestDto {
    pub school_id: SchoolId,
    #[validate(custom(function = "validate_join_role"))]
    pub role: String,
    /// Copied from the account when one exists for `email`
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
    /// Target class for student requests
    pub class_id: Option<ClassId>,
}

/// Editable fields of a pending request. Status, user and school are not
/// editable.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateJoinRequestDto {
    #[validate(custom(function = "validate_join_role"))]
    pub role: Option<String>,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
    pub class_id: Option<ClassId>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct JoinRequestFilterParams {
    pub school_id: Option<SchoolId>,
    pub user_id: Option<UserId>,
    pub email: Option<String>,
    pub status: Option<JoinRequestStatus>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct JoinSchoolByCodeDto {
    /// Username of the school to join
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "code is required"))]
    pub code: String,
    /// Required when the caller is school staff
    #[validate(custom(function = "validate_staff_role"))]
    pub staff_role: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptJoinRequestResponse {
    pub token: String,
    pub accepted_request: JoinRequest,
}

/// Result of a join-by-code attempt.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JoinByCodeResponse {
    /// The membership was created immediately.
    Joined {
        token: String,
        membership: SchoolMembership,
    },
    /// A pending request now waits for acceptance.
    PendingVerification { join_request: JoinRequest },
}
