//! School membership models.
//!
//! A user belongs to a school through exactly one of three membership rows:
//! teacher, student or school staff. [`SchoolMembership`] is the sum of the
//! three and is what the join workflows create and hand back.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;

use schoolhub_auth::{MembershipClaims, MembershipScope};

use crate::ids::{ClassId, SchoolId, SchoolStaffId, StudentId, TeacherId, UserId};
use crate::users::User;

/// The three kinds of membership a school grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipRole {
    Student,
    Teacher,
    #[serde(rename = "SCHOOLSTAFF")]
    SchoolStaff,
}

impl MembershipRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Teacher => "TEACHER",
            Self::SchoolStaff => "SCHOOLSTAFF",
        }
    }
}

impl fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Teacher {
    pub id: TeacherId,
    pub user_id: UserId,
    pub school_id: SchoolId,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: StudentId,
    pub user_id: UserId,
    pub school_id: SchoolId,
    pub class_id: Option<ClassId>,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SchoolStaff {
    pub id: SchoolStaffId,
    pub user_id: UserId,
    pub school_id: SchoolId,
    /// One of the staff roles, e.g. `Bursar`
    pub role: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub const TEACHER_COLUMNS: &str =
    "id, user_id, school_id, email, name, phone, image, age, gender, created_at";
pub const STUDENT_COLUMNS: &str =
    "id, user_id, school_id, class_id, email, name, phone, image, age, gender, created_at";
pub const SCHOOL_STAFF_COLUMNS: &str =
    "id, user_id, school_id, role, email, name, phone, image, age, gender, created_at";

/// Fields shared by every membership row, taken from the joining user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipProfile {
    pub user_id: UserId,
    pub school_id: SchoolId,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

impl MembershipProfile {
    pub fn from_user(user: &User, school_id: SchoolId) -> Self {
        Self {
            user_id: user.id,
            school_id,
            email: user.email.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            image: user.image.clone(),
            age: user.age,
            gender: user.gender.clone(),
        }
    }
}

/// A membership about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewMembership {
    Teacher(MembershipProfile),
    Student {
        profile: MembershipProfile,
        class_id: Option<ClassId>,
    },
    SchoolStaff {
        profile: MembershipProfile,
        role: String,
    },
}

impl NewMembership {
    pub fn profile(&self) -> &MembershipProfile {
        match self {
            Self::Teacher(profile) => profile,
            Self::Student { profile, .. } => profile,
            Self::SchoolStaff { profile, .. } => profile,
        }
    }

    pub fn role(&self) -> MembershipRole {
        match self {
            Self::Teacher(_) => MembershipRole::Teacher,
            Self::Student { .. } => MembershipRole::Student,
            Self::SchoolStaff { .. } => MembershipRole::SchoolStaff,
        }
    }
}

/// A created membership of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchoolMembership {
    Teacher(Teacher),
    Student(Student),
    #[serde(rename = "SCHOOLSTAFF")]
    SchoolStaff(SchoolStaff),
}

impl SchoolMembership {
    pub fn role(&self) -> MembershipRole {
        match self {
            Self::Teacher(_) => MembershipRole::Teacher,
            Self::Student(_) => MembershipRole::Student,
            Self::SchoolStaff(_) => MembershipRole::SchoolStaff,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            Self::Teacher(t) => t.user_id,
            Self::Student(s) => s.user_id,
            Self::SchoolStaff(s) => s.user_id,
        }
    }

    pub fn school_id(&self) -> SchoolId {
        match self {
            Self::Teacher(t) => t.school_id,
            Self::Student(s) => s.school_id,
            Self::SchoolStaff(s) => s.school_id,
        }
    }

    /// Payload of the membership token issued after joining.
    ///
    /// `sub` is the membership row id, not the user id.
    pub fn claims(&self) -> MembershipClaims {
        let (sub, name, email, phone, gender, image, scope) = match self {
            Self::Teacher(t) => (
                t.id.to_string(),
                &t.name,
                &t.email,
                &t.phone,
                &t.gender,
                &t.image,
                MembershipScope::Teacher,
            ),
            Self::Student(s) => (
                s.id.to_string(),
                &s.name,
                &s.email,
                &s.phone,
                &s.gender,
                &s.image,
                MembershipScope::Student {
                    class_id: s.class_id.map(ClassId::into_inner),
                },
            ),
            Self::SchoolStaff(s) => (
                s.id.to_string(),
                &s.name,
                &s.email,
                &s.phone,
                &s.gender,
                &s.image,
                MembershipScope::SchoolStaff {
                    staff_role: s.role.clone(),
                },
            ),
        };

        MembershipClaims {
            sub,
            user_id: self.user_id().into_inner(),
            school_id: self.school_id().into_inner(),
            name: name.clone(),
            email: email.clone(),
            phone: phone.clone(),
            gender: gender.clone(),
            image: image.clone(),
            scope,
            aud: String::new(),
            exp: 0,
            iat: 0,
        }
    }
}

/// Everyone holding a role in a school.
#[derive(Debug, Serialize, ToSchema)]
pub struct SchoolMembersResponse {
    pub teachers: Vec<Teacher>,
    pub students: Vec<Student>,
    pub school_staffs: Vec<SchoolStaff>,
}
