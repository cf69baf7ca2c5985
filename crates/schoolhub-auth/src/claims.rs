//! JWT claim structures.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// `aud` of access tokens.
pub const ACCESS_AUDIENCE: &str = "schoolhub:access";
/// `aud` of membership tokens.
pub const MEMBERSHIP_AUDIENCE: &str = "schoolhub:membership";

/// JWT claims for access tokens.
///
/// # Fields
///
/// - `sub`: User ID (subject)
/// - `email`: User's email address
/// - `role`: Declared account role (`STUDENT`, `TEACHER`, `ADMIN`, `SCHOOLSTAFF`)
/// - `current_school_id`: School the user last joined, if any
/// - `aud`: Always [`ACCESS_AUDIENCE`]
/// - `exp`: Token expiration timestamp
/// - `iat`: Token issued-at timestamp
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    /// User's email address
    pub email: String,
    /// User's declared role
    pub role: Option<String>,
    /// User's current school
    pub current_school_id: Option<Uuid>,
    pub aud: String,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

/// Role-specific part of a membership token.
///
/// Serialized inline with the rest of the claims, tagged by `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "role")]
pub enum MembershipScope {
    /// `class_id` is always present in the payload, `null` when unassigned.
    #[serde(rename = "STUDENT")]
    Student { class_id: Option<Uuid> },
    #[serde(rename = "TEACHER")]
    Teacher,
    #[serde(rename = "SCHOOLSTAFF")]
    SchoolStaff { staff_role: String },
}

/// JWT claims for membership tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MembershipClaims {
    /// Membership record ID (teacher, student or staff row)
    pub sub: String,
    pub user_id: Uuid,
    pub school_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub image: Option<String>,
    #[serde(flatten)]
    pub scope: MembershipScope,
    /// Filled in by the issuer
    #[serde(default)]
    pub aud: String,
    /// Filled in by the issuer
    #[serde(default)]
    pub exp: usize,
    /// Filled in by the issuer
    #[serde(default)]
    pub iat: usize,
}
